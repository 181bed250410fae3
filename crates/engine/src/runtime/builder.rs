//! State behind the snippet's `ModelBuilder` and the conversion of built
//! nodes into a [`Model`].

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use tracing::debug;

use super::heap::{NodeObj, Object};
use super::value::{Fault, FaultResult, ObjRef, Value};
use super::Runtime;
use crate::geometry::mesh::{self, MeshData};
use crate::geometry::{Material, MeshPart, Model, ModelNode, Transform};

/// Deepest allowed node hierarchy
pub const MAX_NODE_DEPTH: usize = 64;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

const UNCOLORED: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, Default)]
pub struct BuilderState {
    /// Generated meshes; a part id is an index here
    meshes: Vec<MeshData>,
    /// Every node in creation order
    nodes: Vec<ObjRef>,
    /// Vertices generated plus vertices placed on nodes
    vertices: usize,
    /// Part placements across all nodes
    placements: usize,
    ended: bool,
}

impl BuilderState {
    pub fn part_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

fn ensure_open(rt: &Runtime) -> FaultResult<()> {
    if rt.builder.ended {
        return Err(Fault::new("model builder used after end()"));
    }
    Ok(())
}

fn size(name: &str, value: &Value) -> FaultResult<f32> {
    let v = value.as_float()?;
    let f = v as f32;
    if !v.is_finite() || !f.is_finite() || v <= 0.0 {
        return Err(Fault::new(format!(
            "invalid {name} {v}: must be positive and finite"
        )));
    }
    Ok(f)
}

fn divisions(rt: &Runtime, value: &Value) -> FaultResult<u32> {
    let d = value.as_int()?;
    let max = rt.limits.max_divisions;
    if d < 3 || d > i64::from(max) {
        return Err(Fault::new(format!(
            "invalid divisions {d}: must be between 3 and {max}"
        )));
    }
    Ok(d as u32)
}

fn reserve_vertices(rt: &mut Runtime, count: usize) -> FaultResult<()> {
    let total = rt.builder.vertices + count;
    if total > rt.limits.max_vertices {
        return Err(Fault::new(format!(
            "model exceeds the limit of {} vertices",
            rt.limits.max_vertices
        )));
    }
    rt.builder.vertices = total;
    Ok(())
}

/// `box`, `sphere`, `cylinder`, `cone`, `plane`: generate a mesh and return its part id
pub fn primitive(rt: &mut Runtime, method: &str, args: &[Value]) -> FaultResult<Value> {
    ensure_open(rt)?;
    if rt.builder.meshes.len() >= rt.limits.max_parts {
        return Err(Fault::new(format!(
            "model exceeds the limit of {} parts",
            rt.limits.max_parts
        )));
    }

    let mesh = match (method, args) {
        ("box", [w, h, d]) => {
            let (w, h, d) = (size("width", w)?, size("height", h)?, size("depth", d)?);
            reserve_vertices(rt, mesh::box_vertices())?;
            mesh::cuboid(w, h, d, UNCOLORED)
        }
        ("sphere", [r, div]) => {
            let (r, div) = (size("radius", r)?, divisions(rt, div)?);
            reserve_vertices(rt, mesh::sphere_vertices(div))?;
            mesh::sphere(r, div, UNCOLORED)
        }
        ("cylinder", [r, h, div]) => {
            let (r, h, div) = (size("radius", r)?, size("height", h)?, divisions(rt, div)?);
            reserve_vertices(rt, mesh::cylinder_vertices(div))?;
            mesh::cylinder(r, h, div, UNCOLORED)
        }
        ("cone", [r, h, div]) => {
            let (r, h, div) = (size("radius", r)?, size("height", h)?, divisions(rt, div)?);
            reserve_vertices(rt, mesh::cone_vertices(div))?;
            mesh::cone(r, h, div, UNCOLORED)
        }
        ("plane", [w, d]) => {
            let (w, d) = (size("width", w)?, size("depth", d)?);
            reserve_vertices(rt, mesh::plane_vertices())?;
            mesh::plane(w, d, UNCOLORED)
        }
        _ => return Err(Fault::new(format!("no primitive '{method}'"))),
    };

    let id = rt.builder.meshes.len();
    rt.builder.meshes.push(mesh);
    Ok(Value::Int(id as i64))
}

pub fn new_node(rt: &mut Runtime) -> FaultResult<Value> {
    ensure_open(rt)?;
    if rt.builder.nodes.len() >= rt.limits.max_nodes {
        return Err(Fault::new(format!(
            "model exceeds the limit of {} nodes",
            rt.limits.max_nodes
        )));
    }
    let translation = rt.heap.alloc(Object::Vector(Vec3::ZERO));
    let rotation = rt.heap.alloc(Object::Vector(Vec3::ZERO));
    let scale = rt.heap.alloc(Object::Vector(Vec3::ONE));
    let node = NodeObj {
        id: format!("node{}", rt.builder.nodes.len()),
        translation,
        rotation,
        scale,
        parts: Vec::new(),
        children: Vec::new(),
        parent: None,
    };
    let r = rt.heap.alloc(Object::Node(node));
    rt.builder.nodes.push(r);
    Ok(Value::Ref(r))
}

/// Place part `part` with `material` on `node`
pub fn place_part(rt: &mut Runtime, node: ObjRef, part: &Value, material: &Value) -> FaultResult<()> {
    ensure_open(rt)?;
    let part = part.as_int()?;
    let Some(mesh) = usize::try_from(part).ok().and_then(|i| rt.builder.meshes.get(i)) else {
        return Err(Fault::new(format!("unknown part id {part}")));
    };
    let count = mesh.vertex_count();
    let material = material.as_object()?;
    rt.heap.material(material)?;

    if rt.builder.placements >= rt.limits.max_parts {
        return Err(Fault::new(format!(
            "model exceeds the limit of {} parts",
            rt.limits.max_parts
        )));
    }
    reserve_vertices(rt, count)?;
    rt.builder.placements += 1;
    rt.heap.node_mut(node)?.parts.push((part as usize, material));
    Ok(())
}

/// Make `child` a child of `parent`, rejecting cycles and re-parenting
pub fn attach_child(rt: &mut Runtime, parent: ObjRef, child: &Value) -> FaultResult<()> {
    ensure_open(rt)?;
    let child = child.as_object()?;
    if rt.heap.node(child)?.parent.is_some() {
        return Err(Fault::new(format!(
            "node '{}' already has a parent",
            rt.heap.node(child)?.id
        )));
    }

    let mut depth = 1;
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if current == child {
            return Err(Fault::new("adding this child would create a cycle"));
        }
        depth += 1;
        cursor = rt.heap.node(current)?.parent;
    }
    if depth + subtree_height(rt, child)? > MAX_NODE_DEPTH {
        return Err(Fault::new(format!(
            "node hierarchy deeper than {MAX_NODE_DEPTH} levels"
        )));
    }

    rt.heap.node_mut(child)?.parent = Some(parent);
    rt.heap.node_mut(parent)?.children.push(child);
    Ok(())
}

fn subtree_height(rt: &Runtime, root: ObjRef) -> FaultResult<usize> {
    let mut height = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((r, level)) = stack.pop() {
        height = height.max(level);
        for &c in &rt.heap.node(r)?.children {
            stack.push((c, level + 1));
        }
    }
    Ok(height)
}

/// Finish building: bake materials into meshes and produce the model
pub fn end(rt: &mut Runtime) -> FaultResult<Value> {
    ensure_open(rt)?;
    rt.builder.ended = true;

    let mut roots = Vec::new();
    for &r in &rt.builder.nodes {
        if rt.heap.node(r)?.parent.is_none() {
            roots.push(convert(rt, r)?);
        }
    }

    let id = NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed);
    let model = Model::new(id, roots);
    debug!(
        model_id = id,
        nodes = model.node_count(),
        parts = model.part_count(),
        vertices = model.vertex_count(),
        "model built"
    );
    Ok(Value::Ref(rt.heap.alloc(Object::Model(Box::new(model)))))
}

fn convert(rt: &Runtime, r: ObjRef) -> FaultResult<ModelNode> {
    let node = rt.heap.node(r)?;
    let transform = Transform {
        translation: rt.heap.vector(node.translation)?,
        rotation: rt.heap.vector(node.rotation)?,
        scale: rt.heap.vector(node.scale)?,
    };
    let [t, ro, s] = [transform.translation, transform.rotation, transform.scale];
    if !(t.is_finite() && ro.is_finite() && s.is_finite()) {
        return Err(Fault::new(format!(
            "node '{}' has a non-finite transform",
            node.id
        )));
    }

    let mut parts = Vec::with_capacity(node.parts.len());
    for &(part, material) in &node.parts {
        let source = rt.heap.material(material)?;
        let material = Material {
            id: source.id.clone(),
            diffuse: source.diffuse.unwrap_or(Material::default().diffuse),
            specular: source.specular,
            emissive: source.emissive,
        };
        let mesh = rt
            .builder
            .meshes
            .get(part)
            .ok_or_else(|| Fault::new(format!("unknown part id {part}")))?;
        let [r, g, b, _] = material.diffuse;
        parts.push(MeshPart {
            mesh: mesh.with_color([r, g, b]),
            material,
        });
    }

    let children = node
        .children
        .iter()
        .map(|&c| convert(rt, c))
        .collect::<FaultResult<Vec<_>>>()?;

    Ok(ModelNode {
        id: node.id.clone(),
        transform,
        parts,
        children,
    })
}
