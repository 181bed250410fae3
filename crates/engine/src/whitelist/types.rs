//! Type descriptors shared by the symbol table, the checker and the runtime.

use std::fmt;

pub const MODEL_BUILDER: &str = "model.ModelBuilder";
pub const MODEL: &str = "model.Model";
pub const NODE: &str = "model.Node";
pub const MATERIAL: &str = "model.Material";
pub const COLOR: &str = "graphics.Color";
pub const COLOR_ATTRIBUTE: &str = "graphics.ColorAttribute";
pub const VECTOR3: &str = "math.Vector3";
pub const ARRAY: &str = "util.Array";
pub const STRING: &str = "lang.String";
pub const INTEGER: &str = "lang.Integer";
pub const FLOAT: &str = "lang.Float";
pub const DOUBLE: &str = "lang.Double";
pub const BOOLEAN: &str = "lang.Boolean";
pub const OBJECT: &str = "lang.Object";

// Known to the host, never granted to snippets.
pub const MATH: &str = "lang.Math";
pub const SYSTEM: &str = "host.System";
pub const FILES: &str = "host.Files";
pub const ENVIRONMENT: &str = "graphics.Environment";
pub const DIRECTIONAL_LIGHT: &str = "graphics.DirectionalLight";

/// Static type of a snippet value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Int,
    Float,
    Bool,
    Str,
    Null,
    /// `lang.Object`, accepts any non-void value
    Object,
    /// Reference to an object of the named (qualified) type
    Class(&'static str),
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    pub fn is_reference(self) -> bool {
        matches!(
            self,
            ValueType::Str | ValueType::Null | ValueType::Object | ValueType::Class(_)
        )
    }

    /// Whether a value of type `self` may be stored where `target` is expected
    pub fn assignable_to(self, target: ValueType) -> bool {
        match (self, target) {
            (a, b) if a == b => self != ValueType::Void,
            (ValueType::Int, ValueType::Float) => true,
            (ValueType::Null, ValueType::Str | ValueType::Object | ValueType::Class(_)) => true,
            (ValueType::Void, _) => false,
            (_, ValueType::Object) => true,
            _ => false,
        }
    }

    /// Qualified name of the type whose members apply to values of this type
    pub fn member_owner(self) -> Option<&'static str> {
        match self {
            ValueType::Int => Some(INTEGER),
            ValueType::Float => Some(DOUBLE),
            ValueType::Bool => Some(BOOLEAN),
            ValueType::Str => Some(STRING),
            ValueType::Object => Some(OBJECT),
            ValueType::Class(name) => Some(name),
            ValueType::Void | ValueType::Null => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Void => write!(f, "void"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Str => write!(f, "String"),
            ValueType::Null => write!(f, "null"),
            ValueType::Object => write!(f, "Object"),
            ValueType::Class(name) => write!(f, "{}", simple_name(name)),
        }
    }
}

/// Last segment of a qualified name
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    StaticMethod,
    Field { writable: bool },
    StaticField,
}

impl MemberKind {
    pub fn is_static(self) -> bool {
        matches!(self, MemberKind::StaticMethod | MemberKind::StaticField)
    }

    pub fn is_method(self) -> bool {
        matches!(self, MemberKind::Method | MemberKind::StaticMethod)
    }
}

/// One member of a type: method, field or constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberSig {
    pub name: &'static str,
    pub kind: MemberKind,
    pub params: &'static [ValueType],
    pub ret: ValueType,
}

pub const fn method(name: &'static str, params: &'static [ValueType], ret: ValueType) -> MemberSig {
    MemberSig { name, kind: MemberKind::Method, params, ret }
}

pub const fn static_method(
    name: &'static str,
    params: &'static [ValueType],
    ret: ValueType,
) -> MemberSig {
    MemberSig { name, kind: MemberKind::StaticMethod, params, ret }
}

pub const fn field(name: &'static str, ty: ValueType) -> MemberSig {
    MemberSig { name, kind: MemberKind::Field { writable: true }, params: &[], ret: ty }
}

/// Field holding a reference that cannot be rebound (its target may still be mutated)
pub const fn ref_field(name: &'static str, ty: ValueType) -> MemberSig {
    MemberSig { name, kind: MemberKind::Field { writable: false }, params: &[], ret: ty }
}

pub const fn constant(name: &'static str, ty: ValueType) -> MemberSig {
    MemberSig { name, kind: MemberKind::StaticField, params: &[], ret: ty }
}

/// Everything the host knows about one type
#[derive(Debug)]
pub struct TypeDescriptor {
    /// Fully qualified name, e.g. `graphics.Color`
    pub name: &'static str,
    /// Static type of values of this type
    pub instance: ValueType,
    pub members: &'static [MemberSig],
}

impl TypeDescriptor {
    pub fn simple_name(&self) -> &'static str {
        self.name.rsplit('.').next().unwrap_or(self.name)
    }

    pub fn instance_member(&self, name: &str) -> Option<&'static MemberSig> {
        self.members.iter().find(|m| m.name == name && !m.kind.is_static())
    }

    pub fn static_member(&self, name: &str) -> Option<&'static MemberSig> {
        self.members.iter().find(|m| m.name == name && m.kind.is_static())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_widens_to_float() {
        assert!(ValueType::Int.assignable_to(ValueType::Float));
        assert!(!ValueType::Float.assignable_to(ValueType::Int));
    }

    #[test]
    fn test_null_only_to_references() {
        assert!(ValueType::Null.assignable_to(ValueType::Class(NODE)));
        assert!(ValueType::Null.assignable_to(ValueType::Str));
        assert!(!ValueType::Null.assignable_to(ValueType::Int));
    }

    #[test]
    fn test_object_accepts_everything_but_void() {
        assert!(ValueType::Int.assignable_to(ValueType::Object));
        assert!(ValueType::Class(COLOR).assignable_to(ValueType::Object));
        assert!(!ValueType::Void.assignable_to(ValueType::Object));
        assert!(!ValueType::Void.assignable_to(ValueType::Void));
    }

    #[test]
    fn test_classes_are_nominal() {
        assert!(!ValueType::Class(COLOR).assignable_to(ValueType::Class(VECTOR3)));
        assert!(!ValueType::Object.assignable_to(ValueType::Class(VECTOR3)));
    }

    #[test]
    fn test_display_uses_simple_name() {
        assert_eq!(ValueType::Class(COLOR_ATTRIBUTE).to_string(), "ColorAttribute");
        assert_eq!(ValueType::Str.to_string(), "String");
    }
}
