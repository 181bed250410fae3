//! Mesh validation utilities.
//!
//! `MeshValidator` checks mesh data integrity: stride, in-range indices,
//! unit normals and bounding-box dimensions. `validate_model` runs it over
//! every part of a built model.

use crate::geometry::mesh::{MeshData, STRIDE};
use crate::geometry::{Aabb, Model};

/// Validator for `MeshData` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a MeshData,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a MeshData) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len() / STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.indices.len() / 3
    }

    /// Vertex buffer length is a multiple of the stride
    pub fn is_stride_valid(&self) -> bool {
        self.mesh.vertices.len() % STRIDE == 0
    }

    pub fn is_index_stride_valid(&self) -> bool {
        self.mesh.indices.len() % 3 == 0
    }

    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.indices.iter().all(|&i| i < max_idx)
    }

    /// All vertex normals have unit length (within epsilon)
    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        self.mesh.vertices.chunks_exact(STRIDE).all(|v| {
            let len = (v[3] * v[3] + v[4] * v[4] + v[5] * v[5]).sqrt();
            (len - 1.0).abs() <= epsilon
        })
    }

    pub fn are_positions_finite(&self) -> bool {
        self.mesh.vertices.iter().all(|f| f.is_finite())
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_mesh(self.mesh)
    }

    /// Width, height and depth of the bounding box
    pub fn dimensions(&self) -> [f32; 3] {
        self.aabb().map(|b| b.size().to_array()).unwrap_or([0.0; 3])
    }

    pub fn assert_dimensions_approx(&self, expected: [f32; 3], tolerance: f32) -> bool {
        let dims = self.dimensions();
        dims.iter()
            .zip(expected)
            .all(|(d, e)| (d - e).abs() < tolerance)
    }

    /// Every vertex carries `rgb` (within 0.01)
    pub fn has_uniform_color(&self, rgb: [f32; 3]) -> bool {
        self.vertex_count() > 0
            && self.mesh.vertices.chunks_exact(STRIDE).all(|v| {
                v[6..9]
                    .iter()
                    .zip(rgb)
                    .all(|(c, e)| (c - e).abs() < 0.01)
            })
    }

    /// Run all checks; an empty list means the mesh is valid
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Vertex buffer length {} is not a multiple of {STRIDE}",
                self.mesh.vertices.len()
            ));
        }

        if !self.is_index_stride_valid() {
            errors.push(format!(
                "Index buffer length {} is not a multiple of 3",
                self.mesh.indices.len()
            ));
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self
                .mesh
                .indices
                .iter()
                .filter(|&&i| i >= max_idx)
                .take(5)
                .collect();
            errors.push(format!(
                "Indices out of range (vertex_count={max_idx}): {out_of_range:?}"
            ));
        }

        if !self.are_positions_finite() {
            errors.push("Vertex data contains non-finite values".to_string());
        }

        if self.vertex_count() > 0 && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        errors
    }
}

/// Validate every part of `model`, prefixing errors with the owning node id
pub fn validate_model(model: &Model) -> Vec<String> {
    fn visit(node: &crate::geometry::ModelNode, errors: &mut Vec<String>) {
        for (i, part) in node.parts.iter().enumerate() {
            for e in MeshValidator::new(&part.mesh).validate_all() {
                errors.push(format!("node '{}' part {i}: {e}", node.id));
            }
        }
        for child in &node.children {
            visit(child, errors);
        }
    }

    let mut errors = Vec::new();
    for node in model.nodes() {
        visit(node, &mut errors);
    }
    errors
}
