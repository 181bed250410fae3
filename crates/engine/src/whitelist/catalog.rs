//! Every type the host process knows how to describe.
//!
//! The catalog is wider than what snippets may use: the symbol table grants an
//! enumerated subset of it.

use super::types::*;

const I: ValueType = ValueType::Int;
const F: ValueType = ValueType::Float;
const B: ValueType = ValueType::Bool;
const S: ValueType = ValueType::Str;
const O: ValueType = ValueType::Object;
const V: ValueType = ValueType::Void;
const BUILDER_T: ValueType = ValueType::Class(MODEL_BUILDER);
const MODEL_T: ValueType = ValueType::Class(MODEL);
const NODE_T: ValueType = ValueType::Class(NODE);
const MATERIAL_T: ValueType = ValueType::Class(MATERIAL);
const COLOR_T: ValueType = ValueType::Class(COLOR);
const ATTR_T: ValueType = ValueType::Class(COLOR_ATTRIBUTE);
const VEC_T: ValueType = ValueType::Class(VECTOR3);
const ARRAY_T: ValueType = ValueType::Class(ARRAY);
const ENV_T: ValueType = ValueType::Class(ENVIRONMENT);
const LIGHT_T: ValueType = ValueType::Class(DIRECTIONAL_LIGHT);

static MODEL_BUILDER_TYPE: TypeDescriptor = TypeDescriptor {
    name: MODEL_BUILDER,
    instance: BUILDER_T,
    members: &[
        method("box", &[F, F, F], I),
        method("sphere", &[F, I], I),
        method("cylinder", &[F, F, I], I),
        method("cone", &[F, F, I], I),
        method("plane", &[F, F], I),
        method("node", &[], NODE_T),
        method("part", &[NODE_T, I, MATERIAL_T], V),
        method("partCount", &[], I),
        method("end", &[], MODEL_T),
    ],
};

static MODEL_TYPE: TypeDescriptor = TypeDescriptor {
    name: MODEL,
    instance: MODEL_T,
    members: &[
        method("nodeCount", &[], I),
        method("partCount", &[], I),
        method("vertexCount", &[], I),
    ],
};

static NODE_TYPE: TypeDescriptor = TypeDescriptor {
    name: NODE,
    instance: NODE_T,
    members: &[
        field("id", S),
        ref_field("translation", VEC_T),
        ref_field("rotation", VEC_T),
        ref_field("scale", VEC_T),
        method("addPart", &[I, MATERIAL_T], V),
        method("addChild", &[NODE_T], V),
        method("setTranslation", &[F, F, F], NODE_T),
        method("childCount", &[], I),
    ],
};

static MATERIAL_TYPE: TypeDescriptor = TypeDescriptor {
    name: MATERIAL,
    instance: MATERIAL_T,
    members: &[
        static_method("new", &[], MATERIAL_T),
        static_method("of", &[ATTR_T], MATERIAL_T),
        field("id", S),
        method("set", &[ATTR_T], MATERIAL_T),
    ],
};

static COLOR_TYPE: TypeDescriptor = TypeDescriptor {
    name: COLOR,
    instance: COLOR_T,
    members: &[
        static_method("new", &[F, F, F, F], COLOR_T),
        static_method("rgb", &[F, F, F], COLOR_T),
        constant("WHITE", COLOR_T),
        constant("BLACK", COLOR_T),
        constant("RED", COLOR_T),
        constant("GREEN", COLOR_T),
        constant("BLUE", COLOR_T),
        constant("GRAY", COLOR_T),
        constant("BROWN", COLOR_T),
        field("r", F),
        field("g", F),
        field("b", F),
        field("a", F),
        method("lerp", &[COLOR_T, F], COLOR_T),
        method("cpy", &[], COLOR_T),
    ],
};

static COLOR_ATTRIBUTE_TYPE: TypeDescriptor = TypeDescriptor {
    name: COLOR_ATTRIBUTE,
    instance: ATTR_T,
    members: &[
        static_method("createDiffuse", &[COLOR_T], ATTR_T),
        static_method("createSpecular", &[COLOR_T], ATTR_T),
        static_method("createEmissive", &[COLOR_T], ATTR_T),
    ],
};

static VECTOR3_TYPE: TypeDescriptor = TypeDescriptor {
    name: VECTOR3,
    instance: VEC_T,
    members: &[
        static_method("new", &[F, F, F], VEC_T),
        static_method("zero", &[], VEC_T),
        field("x", F),
        field("y", F),
        field("z", F),
        method("set", &[F, F, F], VEC_T),
        method("add", &[VEC_T], VEC_T),
        method("sub", &[VEC_T], VEC_T),
        method("scl", &[F], VEC_T),
        method("len", &[], F),
        method("nor", &[], VEC_T),
        method("cpy", &[], VEC_T),
        method("dot", &[VEC_T], F),
        method("crs", &[VEC_T], VEC_T),
    ],
};

static ARRAY_TYPE: TypeDescriptor = TypeDescriptor {
    name: ARRAY,
    instance: ARRAY_T,
    members: &[
        static_method("new", &[], ARRAY_T),
        method("add", &[O], V),
        method("size", &[], I),
        method("get", &[I], O),
    ],
};

static STRING_TYPE: TypeDescriptor = TypeDescriptor {
    name: STRING,
    instance: S,
    members: &[
        static_method("valueOf", &[O], S),
        method("length", &[], I),
        method("concat", &[S], S),
        method("isEmpty", &[], B),
        method("toString", &[], S),
    ],
};

static INTEGER_TYPE: TypeDescriptor = TypeDescriptor {
    name: INTEGER,
    instance: I,
    members: &[
        static_method("parseInt", &[S], I),
        static_method("max", &[I, I], I),
        static_method("min", &[I, I], I),
        constant("MAX_VALUE", I),
        constant("MIN_VALUE", I),
        method("toString", &[], S),
    ],
};

static FLOAT_TYPE: TypeDescriptor = TypeDescriptor {
    name: FLOAT,
    instance: F,
    members: &[
        static_method("parseFloat", &[S], F),
        static_method("isNaN", &[F], B),
        static_method("max", &[F, F], F),
        static_method("min", &[F, F], F),
        constant("MAX_VALUE", F),
        method("toString", &[], S),
    ],
};

static DOUBLE_TYPE: TypeDescriptor = TypeDescriptor {
    name: DOUBLE,
    instance: F,
    members: &[
        static_method("parseDouble", &[S], F),
        static_method("isNaN", &[F], B),
        constant("MAX_VALUE", F),
        method("toString", &[], S),
    ],
};

static BOOLEAN_TYPE: TypeDescriptor = TypeDescriptor {
    name: BOOLEAN,
    instance: B,
    members: &[
        static_method("parseBoolean", &[S], B),
        method("toString", &[], S),
    ],
};

static OBJECT_TYPE: TypeDescriptor = TypeDescriptor {
    name: OBJECT,
    instance: O,
    members: &[method("toString", &[], S)],
};

static MATH_TYPE: TypeDescriptor = TypeDescriptor {
    name: MATH,
    instance: ValueType::Class(MATH),
    members: &[
        static_method("sin", &[F], F),
        static_method("cos", &[F], F),
        static_method("sqrt", &[F], F),
        constant("PI", F),
    ],
};

static SYSTEM_TYPE: TypeDescriptor = TypeDescriptor {
    name: SYSTEM,
    instance: ValueType::Class(SYSTEM),
    members: &[
        static_method("exit", &[I], V),
        static_method("getenv", &[S], S),
        static_method("currentTimeMillis", &[], I),
    ],
};

static FILES_TYPE: TypeDescriptor = TypeDescriptor {
    name: FILES,
    instance: ValueType::Class(FILES),
    members: &[
        static_method("read", &[S], S),
        static_method("write", &[S, S], V),
    ],
};

static ENVIRONMENT_TYPE: TypeDescriptor = TypeDescriptor {
    name: ENVIRONMENT,
    instance: ENV_T,
    members: &[
        static_method("new", &[], ENV_T),
        method("setAmbient", &[COLOR_T], V),
        method("add", &[LIGHT_T], V),
    ],
};

static DIRECTIONAL_LIGHT_TYPE: TypeDescriptor = TypeDescriptor {
    name: DIRECTIONAL_LIGHT,
    instance: LIGHT_T,
    members: &[static_method("new", &[COLOR_T, VEC_T], LIGHT_T)],
};

static HOST_TYPES: &[&TypeDescriptor] = &[
    &MODEL_BUILDER_TYPE,
    &MODEL_TYPE,
    &NODE_TYPE,
    &MATERIAL_TYPE,
    &COLOR_TYPE,
    &COLOR_ATTRIBUTE_TYPE,
    &VECTOR3_TYPE,
    &ARRAY_TYPE,
    &STRING_TYPE,
    &INTEGER_TYPE,
    &FLOAT_TYPE,
    &DOUBLE_TYPE,
    &BOOLEAN_TYPE,
    &OBJECT_TYPE,
    &MATH_TYPE,
    &SYSTEM_TYPE,
    &FILES_TYPE,
    &ENVIRONMENT_TYPE,
    &DIRECTIONAL_LIGHT_TYPE,
];

/// Read-only view over every host type descriptor
pub struct HostCatalog;

impl HostCatalog {
    pub fn lookup(name: &str) -> Option<&'static TypeDescriptor> {
        HOST_TYPES.iter().copied().find(|t| t.name == name)
    }

    pub fn all() -> impl Iterator<Item = &'static TypeDescriptor> {
        HOST_TYPES.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: HashSet<_> = HostCatalog::all().map(|t| t.name).collect();
        assert_eq!(names.len(), HOST_TYPES.len());
    }

    #[test]
    fn test_class_types_are_described() {
        for ty in HostCatalog::all() {
            for m in ty.members {
                let mut types = m.params.to_vec();
                types.push(m.ret);
                for t in types {
                    if let ValueType::Class(name) = t {
                        assert!(
                            HostCatalog::lookup(name).is_some(),
                            "{}.{} references undescribed type {}",
                            ty.name,
                            m.name,
                            name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_members_unique_per_kind() {
        for ty in HostCatalog::all() {
            let mut seen = HashSet::new();
            for m in ty.members {
                assert!(
                    seen.insert((m.name, m.kind.is_static())),
                    "duplicate member {}.{}",
                    ty.name,
                    m.name
                );
            }
        }
    }
}
