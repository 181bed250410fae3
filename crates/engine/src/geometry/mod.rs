//! Built models: a tree of nodes carrying colored mesh parts.

pub mod aabb;
pub mod mesh;

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{ModelId, ModelSummary};

pub use aabb::Aabb;
pub use mesh::MeshData;

/// Surface attributes of a mesh part
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: String,
    pub diffuse: [f32; 4],
    pub specular: Option<[f32; 4]>,
    pub emissive: Option<[f32; 4]>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            id: String::new(),
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: None,
            emissive: None,
        }
    }
}

/// Local transform of a node; rotation is XYZ Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            r.x.to_radians(),
            r.y.to_radians(),
            r.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    /// Vertex colors already carry the material's diffuse color
    pub mesh: MeshData,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub id: String,
    pub transform: Transform,
    pub parts: Vec<MeshPart>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    fn walk<'a>(&'a self, parent: Mat4, out: &mut Vec<(Mat4, &'a MeshPart)>) {
        let world = parent * self.transform.matrix();
        out.extend(self.parts.iter().map(|p| (world, p)));
        for child in &self.children {
            child.walk(world, out);
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(ModelNode::count).sum::<usize>()
    }
}

/// A fully constructed model. Immutable once built.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    nodes: Vec<ModelNode>,
}

impl Model {
    pub(crate) fn new(id: ModelId, nodes: Vec<ModelNode>) -> Self {
        Self { id, nodes }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Root nodes
    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    /// Every mesh part with its world matrix, depth first
    pub fn world_parts(&self) -> Vec<(Mat4, &MeshPart)> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.walk(Mat4::IDENTITY, &mut out);
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(ModelNode::count).sum()
    }

    pub fn part_count(&self) -> usize {
        self.world_parts().len()
    }

    pub fn vertex_count(&self) -> usize {
        self.world_parts().iter().map(|(_, p)| p.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.world_parts().iter().map(|(_, p)| p.mesh.triangle_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.part_count() == 0
    }

    /// World-space bounding box, `None` when the model has no geometry
    pub fn bounds(&self) -> Option<Aabb> {
        self.world_parts()
            .iter()
            .filter_map(|(m, p)| Aabb::from_mesh(&p.mesh).map(|b| b.transformed(m)))
            .reduce(Aabb::union)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id,
            node_count: self.node_count(),
            part_count: self.part_count(),
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            bounds: self.bounds().map(|b| b.to_array()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, translation: Vec3, children: Vec<ModelNode>) -> ModelNode {
        ModelNode {
            id: id.to_string(),
            transform: Transform {
                translation,
                ..Transform::default()
            },
            parts: vec![MeshPart {
                mesh: mesh::cuboid(1.0, 1.0, 1.0, [1.0, 1.0, 1.0]),
                material: Material::default(),
            }],
            children,
        }
    }

    #[test]
    fn test_counts_include_children() {
        let child = node("child", Vec3::new(0.0, 2.0, 0.0), Vec::new());
        let model = Model::new(7, vec![node("root", Vec3::ZERO, vec![child])]);
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.part_count(), 2);
        assert_eq!(model.vertex_count(), 48);
        assert_eq!(model.triangle_count(), 24);
    }

    #[test]
    fn test_bounds_follow_parent_transform() {
        let child = node("child", Vec3::new(0.0, 2.0, 0.0), Vec::new());
        let model = Model::new(1, vec![node("root", Vec3::new(1.0, 0.0, 0.0), vec![child])]);
        let b = model.bounds().unwrap();
        assert!((b.min.y + 0.5).abs() < 1e-5);
        assert!((b.max.y - 2.5).abs() < 1e-5);
        assert!((b.center().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_model() {
        let model = Model::new(3, Vec::new());
        assert!(model.is_empty());
        let summary = model.summary();
        assert_eq!(summary.id, 3);
        assert!(summary.bounds.is_none());
    }

    #[test]
    fn test_rotation_in_degrees() {
        let t = Transform {
            rotation: Vec3::new(0.0, 0.0, 90.0),
            ..Transform::default()
        };
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5);
    }
}
