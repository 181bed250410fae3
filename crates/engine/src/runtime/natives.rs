//! Runtime bindings for the granted types.
//!
//! A [`Binding`] is the only way evaluation reaches host behavior. Bindings
//! exist for granted types alone; a type without one cannot be loaded.

use std::collections::BTreeMap;

use glam::Vec3;

use super::builder;
use super::heap::{AttrKind, ColorAttr, MaterialObj, Object};
use super::value::{Fault, FaultResult, Value};
use super::Runtime;
use crate::whitelist::types::*;

pub type CallFn = fn(&mut Runtime, &str, &Value, &[Value]) -> FaultResult<Value>;
pub type StaticFn = fn(&mut Runtime, &str, &[Value]) -> FaultResult<Value>;
pub type GetFn = fn(&mut Runtime, &str, &Value) -> FaultResult<Value>;
pub type SetFn = fn(&mut Runtime, &str, &Value, Value) -> FaultResult<()>;
pub type ConstFn = fn(&mut Runtime, &str) -> FaultResult<Value>;

/// Bindings a loading context exposes, keyed by qualified type name
pub type BindingTable = BTreeMap<&'static str, &'static Binding>;

/// Native implementation of one type's members
pub struct Binding {
    pub type_name: &'static str,
    pub call: CallFn,
    pub call_static: StaticFn,
    pub get: GetFn,
    pub set: SetFn,
    pub constant: ConstFn,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding").field("type_name", &self.type_name).finish()
    }
}

/// Binding for a qualified type name
pub fn lookup(name: &str) -> Option<&'static Binding> {
    BINDINGS.iter().find(|b| b.type_name == name)
}

const BASE: Binding = Binding {
    type_name: "",
    call: no_call,
    call_static: no_static,
    get: no_get,
    set: no_set,
    constant: no_constant,
};

static BINDINGS: &[Binding] = &[
    Binding { type_name: MODEL_BUILDER, call: builder_call, ..BASE },
    Binding { type_name: MODEL, call: model_call, ..BASE },
    Binding { type_name: NODE, call: node_call, get: node_get, set: node_set, ..BASE },
    Binding {
        type_name: MATERIAL,
        call: material_call,
        call_static: material_static,
        get: material_get,
        set: material_set,
        ..BASE
    },
    Binding {
        type_name: COLOR,
        call: color_call,
        call_static: color_static,
        get: color_get,
        set: color_set,
        constant: color_constant,
    },
    Binding { type_name: COLOR_ATTRIBUTE, call_static: attribute_static, ..BASE },
    Binding {
        type_name: VECTOR3,
        call: vector_call,
        call_static: vector_static,
        get: vector_get,
        set: vector_set,
        ..BASE
    },
    Binding { type_name: ARRAY, call: array_call, call_static: array_static, ..BASE },
    Binding { type_name: STRING, call: string_call, call_static: string_static, ..BASE },
    Binding {
        type_name: INTEGER,
        call: to_string_call,
        call_static: integer_static,
        constant: integer_constant,
        ..BASE
    },
    Binding {
        type_name: FLOAT,
        call: to_string_call,
        call_static: float_static,
        constant: float_constant,
        ..BASE
    },
    Binding {
        type_name: DOUBLE,
        call: to_string_call,
        call_static: double_static,
        constant: double_constant,
        ..BASE
    },
    Binding { type_name: BOOLEAN, call: to_string_call, call_static: boolean_static, ..BASE },
    Binding { type_name: OBJECT, call: to_string_call, ..BASE },
];

fn unsupported(kind: &str, name: &str) -> Fault {
    Fault::new(format!("no {kind} '{name}'"))
}

fn no_call(_: &mut Runtime, name: &str, _: &Value, _: &[Value]) -> FaultResult<Value> {
    Err(unsupported("method", name))
}

fn no_static(_: &mut Runtime, name: &str, _: &[Value]) -> FaultResult<Value> {
    Err(unsupported("static method", name))
}

fn no_get(_: &mut Runtime, name: &str, _: &Value) -> FaultResult<Value> {
    Err(unsupported("field", name))
}

fn no_set(_: &mut Runtime, name: &str, _: &Value, _: Value) -> FaultResult<()> {
    Err(unsupported("field", name))
}

fn no_constant(_: &mut Runtime, name: &str) -> FaultResult<Value> {
    Err(unsupported("constant", name))
}

fn to_string_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("toString", []) => {
            let text = rt.display(recv)?;
            rt.string(text)
        }
        _ => Err(unsupported("method", name)),
    }
}

// ==================== MODEL ====================

fn builder_call(rt: &mut Runtime, name: &str, _: &Value, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("box" | "sphere" | "cylinder" | "cone" | "plane", _) => builder::primitive(rt, name, args),
        ("node", []) => builder::new_node(rt),
        ("part", [node, part, material]) => {
            builder::place_part(rt, node.as_object()?, part, material)?;
            Ok(Value::Void)
        }
        ("partCount", []) => Ok(Value::Int(rt.builder.part_count() as i64)),
        ("end", []) => builder::end(rt),
        _ => Err(unsupported("method", name)),
    }
}

fn model_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let model = rt.heap.model(recv.as_object()?)?;
    let count = match (name, args) {
        ("nodeCount", []) => model.node_count(),
        ("partCount", []) => model.part_count(),
        ("vertexCount", []) => model.vertex_count(),
        _ => return Err(unsupported("method", name)),
    };
    Ok(Value::Int(count as i64))
}

fn node_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let node = recv.as_object()?;
    match (name, args) {
        ("addPart", [part, material]) => {
            builder::place_part(rt, node, part, material)?;
            Ok(Value::Void)
        }
        ("addChild", [child]) => {
            builder::attach_child(rt, node, child)?;
            Ok(Value::Void)
        }
        ("setTranslation", [x, y, z]) => {
            let t = rt.heap.node(node)?.translation;
            *rt.heap.vector_mut(t)? = Vec3::new(x.as_f32()?, y.as_f32()?, z.as_f32()?);
            Ok(recv.clone())
        }
        ("childCount", []) => Ok(Value::Int(rt.heap.node(node)?.children.len() as i64)),
        _ => Err(unsupported("method", name)),
    }
}

fn node_get(rt: &mut Runtime, name: &str, recv: &Value) -> FaultResult<Value> {
    let node = rt.heap.node(recv.as_object()?)?;
    match name {
        "id" => Ok(Value::Str(node.id.clone())),
        "translation" => Ok(Value::Ref(node.translation)),
        "rotation" => Ok(Value::Ref(node.rotation)),
        "scale" => Ok(Value::Ref(node.scale)),
        _ => Err(unsupported("field", name)),
    }
}

fn node_set(rt: &mut Runtime, name: &str, recv: &Value, value: Value) -> FaultResult<()> {
    match name {
        "id" => {
            let id = value.as_str()?.to_string();
            rt.charge_bytes(id.len())?;
            rt.heap.node_mut(recv.as_object()?)?.id = id;
            Ok(())
        }
        _ => Err(unsupported("field", name)),
    }
}

// ==================== MATERIALS ====================

fn material_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    let mut material = MaterialObj::default();
    match (name, args) {
        ("new", []) => {}
        ("of", [attr]) => material.apply(rt.heap.color_attr(attr.as_object()?)?),
        _ => return Err(unsupported("static method", name)),
    }
    rt.alloc(Object::Material(material))
}

fn material_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("set", [attr]) => {
            let attr = rt.heap.color_attr(attr.as_object()?)?;
            rt.heap.material_mut(recv.as_object()?)?.apply(attr);
            Ok(recv.clone())
        }
        _ => Err(unsupported("method", name)),
    }
}

fn material_get(rt: &mut Runtime, name: &str, recv: &Value) -> FaultResult<Value> {
    match name {
        "id" => Ok(Value::Str(rt.heap.material(recv.as_object()?)?.id.clone())),
        _ => Err(unsupported("field", name)),
    }
}

fn material_set(rt: &mut Runtime, name: &str, recv: &Value, value: Value) -> FaultResult<()> {
    match name {
        "id" => {
            let id = value.as_str()?.to_string();
            rt.charge_bytes(id.len())?;
            rt.heap.material_mut(recv.as_object()?)?.id = id;
            Ok(())
        }
        _ => Err(unsupported("field", name)),
    }
}

fn attribute_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    let kind = match name {
        "createDiffuse" => AttrKind::Diffuse,
        "createSpecular" => AttrKind::Specular,
        "createEmissive" => AttrKind::Emissive,
        _ => return Err(unsupported("static method", name)),
    };
    let [color] = args else {
        return Err(unsupported("static method", name));
    };
    let color = *rt.heap.color(color.as_object()?)?;
    rt.alloc(Object::ColorAttr(ColorAttr { kind, color }))
}

// ==================== COLOR ====================

fn channel(value: &Value) -> FaultResult<f32> {
    let v = value.as_f32()?;
    if !v.is_finite() {
        return Err(Fault::new(format!("invalid color channel {v}")));
    }
    Ok(v)
}

fn color_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    let color = match (name, args) {
        ("new", [r, g, b, a]) => [channel(r)?, channel(g)?, channel(b)?, channel(a)?],
        ("rgb", [r, g, b]) => [channel(r)?, channel(g)?, channel(b)?, 1.0],
        _ => return Err(unsupported("static method", name)),
    };
    rt.alloc(Object::Color(color))
}

fn color_constant(rt: &mut Runtime, name: &str) -> FaultResult<Value> {
    let color = match name {
        "WHITE" => [1.0, 1.0, 1.0, 1.0],
        "BLACK" => [0.0, 0.0, 0.0, 1.0],
        "RED" => [1.0, 0.0, 0.0, 1.0],
        "GREEN" => [0.0, 1.0, 0.0, 1.0],
        "BLUE" => [0.0, 0.0, 1.0, 1.0],
        "GRAY" => [0.5, 0.5, 0.5, 1.0],
        "BROWN" => [0.545, 0.271, 0.075, 1.0],
        _ => return Err(unsupported("constant", name)),
    };
    // constants are copied so snippets cannot mutate shared colors
    rt.alloc(Object::Color(color))
}

fn color_index(name: &str) -> FaultResult<usize> {
    match name {
        "r" => Ok(0),
        "g" => Ok(1),
        "b" => Ok(2),
        "a" => Ok(3),
        _ => Err(unsupported("field", name)),
    }
}

fn color_get(rt: &mut Runtime, name: &str, recv: &Value) -> FaultResult<Value> {
    let i = color_index(name)?;
    Ok(Value::Float(f64::from(rt.heap.color(recv.as_object()?)?[i])))
}

fn color_set(rt: &mut Runtime, name: &str, recv: &Value, value: Value) -> FaultResult<()> {
    let i = color_index(name)?;
    rt.heap.color_mut(recv.as_object()?)?[i] = channel(&value)?;
    Ok(())
}

fn color_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let this = recv.as_object()?;
    match (name, args) {
        ("lerp", [target, t]) => {
            let target = *rt.heap.color(target.as_object()?)?;
            let t = channel(t)?;
            let color = rt.heap.color_mut(this)?;
            for (c, to) in color.iter_mut().zip(target) {
                *c += (to - *c) * t;
            }
            Ok(recv.clone())
        }
        ("cpy", []) => {
            let color = *rt.heap.color(this)?;
            rt.alloc(Object::Color(color))
        }
        _ => Err(unsupported("method", name)),
    }
}

// ==================== VECTOR3 ====================

fn vector_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    let v = match (name, args) {
        ("new", [x, y, z]) => Vec3::new(x.as_f32()?, y.as_f32()?, z.as_f32()?),
        ("zero", []) => Vec3::ZERO,
        _ => return Err(unsupported("static method", name)),
    };
    rt.alloc(Object::Vector(v))
}

fn axis<'v>(v: &'v mut Vec3, name: &str) -> FaultResult<&'v mut f32> {
    match name {
        "x" => Ok(&mut v.x),
        "y" => Ok(&mut v.y),
        "z" => Ok(&mut v.z),
        _ => Err(unsupported("field", name)),
    }
}

fn vector_get(rt: &mut Runtime, name: &str, recv: &Value) -> FaultResult<Value> {
    let mut v = rt.heap.vector(recv.as_object()?)?;
    Ok(Value::Float(f64::from(*axis(&mut v, name)?)))
}

fn vector_set(rt: &mut Runtime, name: &str, recv: &Value, value: Value) -> FaultResult<()> {
    let v = rt.heap.vector_mut(recv.as_object()?)?;
    *axis(v, name)? = value.as_f32()?;
    Ok(())
}

fn vector_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let this = recv.as_object()?;
    let v = rt.heap.vector(this)?;
    let updated = match (name, args) {
        ("set", [x, y, z]) => Vec3::new(x.as_f32()?, y.as_f32()?, z.as_f32()?),
        ("add", [o]) => v + vector_arg(rt, o)?,
        ("sub", [o]) => v - vector_arg(rt, o)?,
        ("scl", [s]) => v * s.as_f32()?,
        ("nor", []) => v.normalize_or_zero(),
        ("crs", [o]) => v.cross(vector_arg(rt, o)?),
        ("len", []) => return Ok(Value::Float(f64::from(v.length()))),
        ("dot", [o]) => return Ok(Value::Float(f64::from(v.dot(vector_arg(rt, o)?)))),
        ("cpy", []) => return rt.alloc(Object::Vector(v)),
        _ => return Err(unsupported("method", name)),
    };
    *rt.heap.vector_mut(this)? = updated;
    Ok(recv.clone())
}

fn vector_arg(rt: &Runtime, value: &Value) -> FaultResult<Vec3> {
    rt.heap.vector(value.as_object()?)
}

// ==================== ARRAY ====================

fn array_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("new", []) => rt.alloc(Object::Array(Vec::new())),
        _ => Err(unsupported("static method", name)),
    }
}

fn array_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let this = recv.as_object()?;
    if let ("add", [value]) = (name, args) {
        let len = rt.heap.array_mut(this)?.len();
        if len >= rt.limits.max_array_len {
            return Err(Fault::new(format!(
                "array length limit of {} exceeded",
                rt.limits.max_array_len
            )));
        }
        let text = match value {
            Value::Str(s) => s.len(),
            _ => 0,
        };
        rt.charge_bytes(std::mem::size_of::<Value>() + text)?;
        rt.heap.array_mut(this)?.push(value.clone());
        return Ok(Value::Void);
    }

    let items = rt.heap.array_mut(this)?;
    match (name, args) {
        ("size", []) => Ok(Value::Int(items.len() as i64)),
        ("get", [index]) => {
            let i = index.as_int()?;
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| {
                    Fault::new(format!("index {i} out of bounds for length {}", items.len()))
                })
        }
        _ => Err(unsupported("method", name)),
    }
}

// ==================== LANG ====================

fn string_static(rt: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("valueOf", [value]) => {
            let text = rt.display(value)?;
            rt.string(text)
        }
        _ => Err(unsupported("static method", name)),
    }
}

fn string_call(rt: &mut Runtime, name: &str, recv: &Value, args: &[Value]) -> FaultResult<Value> {
    let s = recv.as_str()?;
    match (name, args) {
        ("length", []) => Ok(Value::Int(s.chars().count() as i64)),
        ("isEmpty", []) => Ok(Value::Bool(s.is_empty())),
        ("toString", []) => Ok(recv.clone()),
        ("concat", [other]) => {
            let joined = format!("{s}{}", other.as_str()?);
            rt.string(joined)
        }
        _ => Err(unsupported("method", name)),
    }
}

fn parse_failure(kind: &str, input: &str) -> Fault {
    Fault::new(format!("cannot parse '{input}' as {kind}"))
}

fn integer_static(_: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("parseInt", [s]) => {
            let s = s.as_str()?;
            s.parse::<i64>().map(Value::Int).map_err(|_| parse_failure("int", s))
        }
        ("max", [a, b]) => Ok(Value::Int(a.as_int()?.max(b.as_int()?))),
        ("min", [a, b]) => Ok(Value::Int(a.as_int()?.min(b.as_int()?))),
        _ => Err(unsupported("static method", name)),
    }
}

fn integer_constant(_: &mut Runtime, name: &str) -> FaultResult<Value> {
    match name {
        "MAX_VALUE" => Ok(Value::Int(i64::MAX)),
        "MIN_VALUE" => Ok(Value::Int(i64::MIN)),
        _ => Err(unsupported("constant", name)),
    }
}

fn float_static(_: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("parseFloat", [s]) => {
            let s = s.as_str()?;
            s.trim()
                .parse::<f32>()
                .map(|v| Value::Float(f64::from(v)))
                .map_err(|_| parse_failure("float", s))
        }
        ("isNaN", [v]) => Ok(Value::Bool(v.as_float()?.is_nan())),
        ("max", [a, b]) => Ok(Value::Float(a.as_float()?.max(b.as_float()?))),
        ("min", [a, b]) => Ok(Value::Float(a.as_float()?.min(b.as_float()?))),
        _ => Err(unsupported("static method", name)),
    }
}

fn float_constant(_: &mut Runtime, name: &str) -> FaultResult<Value> {
    match name {
        "MAX_VALUE" => Ok(Value::Float(f64::from(f32::MAX))),
        _ => Err(unsupported("constant", name)),
    }
}

fn double_static(_: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("parseDouble", [s]) => {
            let s = s.as_str()?;
            s.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| parse_failure("double", s))
        }
        ("isNaN", [v]) => Ok(Value::Bool(v.as_float()?.is_nan())),
        _ => Err(unsupported("static method", name)),
    }
}

fn double_constant(_: &mut Runtime, name: &str) -> FaultResult<Value> {
    match name {
        "MAX_VALUE" => Ok(Value::Float(f64::MAX)),
        _ => Err(unsupported("constant", name)),
    }
}

fn boolean_static(_: &mut Runtime, name: &str, args: &[Value]) -> FaultResult<Value> {
    match (name, args) {
        ("parseBoolean", [Value::Null]) => Ok(Value::Bool(false)),
        ("parseBoolean", [s]) => Ok(Value::Bool(s.as_str()?.eq_ignore_ascii_case("true"))),
        _ => Err(unsupported("static method", name)),
    }
}
