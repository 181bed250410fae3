use glam::Vec3;

use super::check_string_len;
use super::value::{Fault, FaultResult, ObjRef, Value};
use crate::geometry::Model;

const MAX_DISPLAY_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Diffuse,
    Specular,
    Emissive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAttr {
    pub kind: AttrKind,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialObj {
    pub id: String,
    pub diffuse: Option<[f32; 4]>,
    pub specular: Option<[f32; 4]>,
    pub emissive: Option<[f32; 4]>,
}

impl MaterialObj {
    pub fn apply(&mut self, attr: ColorAttr) {
        let slot = match attr.kind {
            AttrKind::Diffuse => &mut self.diffuse,
            AttrKind::Specular => &mut self.specular,
            AttrKind::Emissive => &mut self.emissive,
        };
        *slot = Some(attr.color);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeObj {
    pub id: String,
    pub translation: ObjRef,
    pub rotation: ObjRef,
    pub scale: ObjRef,
    /// (part id, material) pairs
    pub parts: Vec<(usize, ObjRef)>,
    pub children: Vec<ObjRef>,
    pub parent: Option<ObjRef>,
}

/// Everything a snippet can hold a reference to
#[derive(Debug)]
pub enum Object {
    Builder,
    Node(NodeObj),
    Vector(Vec3),
    Color([f32; 4]),
    ColorAttr(ColorAttr),
    Material(MaterialObj),
    Model(Box<Model>),
    Array(Vec<Value>),
    /// Slot of a model handed back to the host
    Released,
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Builder => "ModelBuilder",
            Object::Node(_) => "Node",
            Object::Vector(_) => "Vector3",
            Object::Color(_) => "Color",
            Object::ColorAttr(_) => "ColorAttribute",
            Object::Material(_) => "Material",
            Object::Model(_) => "Model",
            Object::Array(_) => "Array",
            Object::Released => "released",
        }
    }
}

/// Arena of snippet objects. References never dangle: objects live until the
/// heap is dropped at the end of the invocation.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

macro_rules! accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self, r: ObjRef) -> FaultResult<&$ty> {
            match self.get(r)? {
                Object::$variant(v) => Ok(v),
                other => Err(Fault::new(format!(
                    "expected {}, found {}",
                    stringify!($variant),
                    other.type_name()
                ))),
            }
        }

        pub fn $get_mut(&mut self, r: ObjRef) -> FaultResult<&mut $ty> {
            match self.get_mut(r)? {
                Object::$variant(v) => Ok(v),
                other => Err(Fault::new(format!(
                    "expected {}, found {}",
                    stringify!($variant),
                    other.type_name()
                ))),
            }
        }
    };
}

impl Heap {
    pub fn alloc(&mut self, object: Object) -> ObjRef {
        let r = ObjRef(self.objects.len() as u32);
        self.objects.push(object);
        r
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, r: ObjRef) -> FaultResult<&Object> {
        self.objects
            .get(r.index())
            .ok_or_else(|| Fault::new("dangling reference"))
    }

    pub fn get_mut(&mut self, r: ObjRef) -> FaultResult<&mut Object> {
        self.objects
            .get_mut(r.index())
            .ok_or_else(|| Fault::new("dangling reference"))
    }

    accessors!(node, node_mut, Node, NodeObj);
    accessors!(color, color_mut, Color, [f32; 4]);
    accessors!(material, material_mut, Material, MaterialObj);
    accessors!(array, array_mut, Array, Vec<Value>);
    accessors!(model, model_mut, Model, Box<Model>);

    pub fn vector(&self, r: ObjRef) -> FaultResult<Vec3> {
        match self.get(r)? {
            Object::Vector(v) => Ok(*v),
            other => Err(Fault::new(format!("expected Vector3, found {}", other.type_name()))),
        }
    }

    pub fn vector_mut(&mut self, r: ObjRef) -> FaultResult<&mut Vec3> {
        match self.get_mut(r)? {
            Object::Vector(v) => Ok(v),
            other => Err(Fault::new(format!("expected Vector3, found {}", other.type_name()))),
        }
    }

    pub fn color_attr(&self, r: ObjRef) -> FaultResult<ColorAttr> {
        match self.get(r)? {
            Object::ColorAttr(a) => Ok(*a),
            other => Err(Fault::new(format!(
                "expected ColorAttribute, found {}",
                other.type_name()
            ))),
        }
    }

    /// Move a finished model out of the heap
    pub fn take_model(&mut self, r: ObjRef) -> FaultResult<Model> {
        let slot = self.get_mut(r)?;
        match std::mem::replace(slot, Object::Released) {
            Object::Model(model) => Ok(*model),
            other => {
                let name = other.type_name();
                *slot = other;
                Err(Fault::new(format!("expected Model, found {name}")))
            }
        }
    }

    /// Append the text form of `value` to `out`.
    ///
    /// `tick` runs once per value written. Faults before `out` grows past
    /// `max_len` bytes.
    pub fn write_display(
        &self,
        out: &mut String,
        value: &Value,
        max_len: usize,
        tick: &mut dyn FnMut() -> FaultResult<()>,
    ) -> FaultResult<()> {
        self.write_nested(out, value, 0, max_len, tick)
    }

    fn write_nested(
        &self,
        out: &mut String,
        value: &Value,
        depth: usize,
        max_len: usize,
        tick: &mut dyn FnMut() -> FaultResult<()>,
    ) -> FaultResult<()> {
        tick()?;
        let r = match value {
            Value::Str(s) => return push_text(out, s, max_len),
            Value::Ref(r) => *r,
            other => return push_text(out, &other.to_string(), max_len),
        };
        let text = match self.get(r) {
            Ok(Object::Node(n)) => format!("Node({})", n.id),
            Ok(Object::Vector(v)) => format!("({:?}, {:?}, {:?})", v.x, v.y, v.z),
            Ok(Object::Color(c)) => format!("rgba({:?}, {:?}, {:?}, {:?})", c[0], c[1], c[2], c[3]),
            Ok(Object::Material(m)) => format!("Material({})", m.id),
            Ok(Object::Array(_)) if depth >= MAX_DISPLAY_DEPTH => "[...]".to_string(),
            Ok(Object::Array(items)) => {
                push_text(out, "[", max_len)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        push_text(out, ", ", max_len)?;
                    }
                    self.write_nested(out, item, depth + 1, max_len, tick)?;
                }
                return push_text(out, "]", max_len);
            }
            Ok(other) => format!("{}#{}", other.type_name(), r.0),
            Err(_) => value.to_string(),
        };
        push_text(out, &text, max_len)
    }
}

fn push_text(out: &mut String, text: &str, max_len: usize) -> FaultResult<()> {
    check_string_len(out.len() + text.len(), max_len)?;
    out.push_str(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut heap = Heap::default();
        let v = heap.alloc(Object::Vector(Vec3::ONE));
        let c = heap.alloc(Object::Color([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(heap.vector(v).unwrap(), Vec3::ONE);
        assert!(heap.vector(c).is_err());
        assert!(heap.color(c).is_ok());
    }

    #[test]
    fn test_take_model_wrong_type_keeps_object() {
        let mut heap = Heap::default();
        let v = heap.alloc(Object::Vector(Vec3::ZERO));
        assert!(heap.take_model(v).is_err());
        assert!(heap.vector(v).is_ok());
    }

    #[test]
    fn test_material_apply() {
        let mut m = MaterialObj::default();
        m.apply(ColorAttr {
            kind: AttrKind::Emissive,
            color: [0.0, 1.0, 0.0, 1.0],
        });
        assert_eq!(m.emissive, Some([0.0, 1.0, 0.0, 1.0]));
        assert!(m.diffuse.is_none());
    }

    fn display(heap: &Heap, value: &Value) -> FaultResult<String> {
        let mut out = String::new();
        heap.write_display(&mut out, value, 1024, &mut || Ok(()))?;
        Ok(out)
    }

    #[test]
    fn test_display_nested_array() {
        let mut heap = Heap::default();
        let arr = heap.alloc(Object::Array(vec![Value::Int(1), Value::Str("a".into())]));
        assert_eq!(display(&heap, &Value::Ref(arr)).unwrap(), "[1, a]");
    }

    #[test]
    fn test_display_self_containing_array() {
        let mut heap = Heap::default();
        let arr = heap.alloc(Object::Array(Vec::new()));
        heap.array_mut(arr).unwrap().push(Value::Ref(arr));
        assert!(display(&heap, &Value::Ref(arr)).unwrap().contains("[...]"));
    }
}
