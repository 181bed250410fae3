use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Floats per vertex: position(3) + normal(3) + color(3)
pub const STRIDE: usize = 9;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Copy of the mesh with every vertex color replaced
    pub fn with_color(&self, color: [f32; 3]) -> MeshData {
        let mut vertices = self.vertices.clone();
        for v in vertices.chunks_exact_mut(STRIDE) {
            v[6..9].copy_from_slice(&color);
        }
        MeshData {
            vertices,
            indices: self.indices.clone(),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(STRIDE)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
    }
}

/// Primitive vertex count, used to check limits before generating anything
pub fn box_vertices() -> usize {
    24
}

pub fn sphere_vertices(divisions: u32) -> usize {
    let (rings, sectors) = sphere_grid(divisions);
    ((rings + 1) * (sectors + 1)) as usize
}

pub fn cylinder_vertices(divisions: u32) -> usize {
    (4 * divisions + 2 * (divisions + 1)) as usize
}

pub fn cone_vertices(divisions: u32) -> usize {
    (3 * divisions + divisions + 1) as usize
}

pub fn plane_vertices() -> usize {
    4
}

// ── Primitive generation ─────────────────────────────────────

pub fn cuboid(w: f32, h: f32, d: f32, color: [f32; 3]) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(box_vertices() * STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, *v, *normal, color);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// Flat square in the XZ plane facing +Y
pub fn plane(w: f32, d: f32, color: [f32; 3]) -> MeshData {
    let hw = w * 0.5;
    let hd = d * 0.5;
    let mut vertices = Vec::with_capacity(plane_vertices() * STRIDE);
    for p in [
        Vec3::new(-hw, 0.0, hd),
        Vec3::new(hw, 0.0, hd),
        Vec3::new(hw, 0.0, -hd),
        Vec3::new(-hw, 0.0, -hd),
    ] {
        push_vert(&mut vertices, p, Vec3::Y, color);
    }
    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

pub fn cylinder(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let hh = height * 0.5;
    let mut vertices = Vec::with_capacity(cylinder_vertices(segments) * STRIDE);
    let mut indices = Vec::new();

    for i in 0..segments {
        let (c0, s0) = angle(i, segments);
        let (c1, s1) = angle(i + 1, segments);
        let n0 = Vec3::new(c0, 0.0, s0);
        let n1 = Vec3::new(c1, 0.0, s1);

        let base = (vertices.len() / STRIDE) as u32;
        push_vert(&mut vertices, Vec3::new(radius * c0, -hh, radius * s0), n0, color);
        push_vert(&mut vertices, Vec3::new(radius * c1, -hh, radius * s1), n1, color);
        push_vert(&mut vertices, Vec3::new(radius * c1, hh, radius * s1), n1, color);
        push_vert(&mut vertices, Vec3::new(radius * c0, hh, radius * s0), n0, color);

        indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }

    add_cap(&mut vertices, &mut indices, radius, hh, segments, Vec3::Y, color);
    add_cap(&mut vertices, &mut indices, radius, -hh, segments, Vec3::NEG_Y, color);

    MeshData { vertices, indices }
}

pub fn sphere(radius: f32, divisions: u32, color: [f32; 3]) -> MeshData {
    let (rings, sectors) = sphere_grid(divisions);
    let mut vertices = Vec::with_capacity(sphere_vertices(divisions) * STRIDE);
    let mut indices = Vec::new();

    for r in 0..=rings {
        let phi = PI * r as f32 / rings as f32;
        let (sp, cp) = phi.sin_cos();

        for s in 0..=sectors {
            let theta = TAU * s as f32 / sectors as f32;
            let (st, ct) = theta.sin_cos();
            let n = Vec3::new(sp * ct, cp, sp * st);
            push_vert(&mut vertices, n * radius, n, color);
        }
    }

    for r in 0..rings {
        for s in 0..sectors {
            let i0 = r * (sectors + 1) + s;
            let i1 = i0 + 1;
            let i2 = i0 + sectors + 1;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
        }
    }

    MeshData { vertices, indices }
}

pub fn cone(radius: f32, height: f32, segments: u32, color: [f32; 3]) -> MeshData {
    let hh = height * 0.5;
    let mut vertices = Vec::with_capacity(cone_vertices(segments) * STRIDE);
    let mut indices = Vec::new();

    let slope = radius / height;
    for i in 0..segments {
        let (c0, s0) = angle(i, segments);
        let (c1, s1) = angle(i + 1, segments);

        let n0 = Vec3::new(c0, slope, s0).normalize();
        let n1 = Vec3::new(c1, slope, s1).normalize();
        let n_top = (n0 + n1).normalize();

        let base = (vertices.len() / STRIDE) as u32;
        push_vert(&mut vertices, Vec3::new(0.0, hh, 0.0), n_top, color); // apex
        push_vert(&mut vertices, Vec3::new(radius * c0, -hh, radius * s0), n0, color);
        push_vert(&mut vertices, Vec3::new(radius * c1, -hh, radius * s1), n1, color);

        indices.extend_from_slice(&[base, base + 2, base + 1]);
    }

    add_cap(&mut vertices, &mut indices, radius, -hh, segments, Vec3::NEG_Y, color);

    MeshData { vertices, indices }
}

// ── Helpers ──────────────────────────────────────────────────

fn sphere_grid(divisions: u32) -> (u32, u32) {
    ((divisions / 2).max(2), divisions)
}

fn angle(i: u32, segments: u32) -> (f32, f32) {
    let a = i as f32 * TAU / segments as f32;
    (a.cos(), a.sin())
}

fn push_vert(v: &mut Vec<f32>, p: Vec3, n: Vec3, c: [f32; 3]) {
    v.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, c[0], c[1], c[2]]);
}

/// Disc at height `y`; winding follows `normal`
fn add_cap(
    vertices: &mut Vec<f32>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    segments: u32,
    normal: Vec3,
    color: [f32; 3],
) {
    let center = (vertices.len() / STRIDE) as u32;
    push_vert(vertices, Vec3::new(0.0, y, 0.0), normal, color);

    for i in 0..segments {
        let (c, s) = angle(i, segments);
        push_vert(vertices, Vec3::new(radius * c, y, radius * s), normal, color);
    }

    for i in 0..segments {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % segments;
        if normal.y > 0.0 {
            indices.extend_from_slice(&[center, b, a]);
        } else {
            indices.extend_from_slice(&[center, a, b]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::MeshValidator;

    const GRAY: [f32; 3] = [0.5, 0.5, 0.5];

    #[test]
    fn test_predicted_vertex_counts() {
        assert_eq!(cuboid(1.0, 1.0, 1.0, GRAY).vertex_count(), box_vertices());
        assert_eq!(plane(1.0, 1.0, GRAY).vertex_count(), plane_vertices());
        for d in [3, 8, 17] {
            assert_eq!(sphere(1.0, d, GRAY).vertex_count(), sphere_vertices(d));
            assert_eq!(cylinder(1.0, 1.0, d, GRAY).vertex_count(), cylinder_vertices(d));
            assert_eq!(cone(1.0, 1.0, d, GRAY).vertex_count(), cone_vertices(d));
        }
    }

    #[test]
    fn test_primitives_are_valid() {
        let meshes = [
            cuboid(1.0, 2.0, 3.0, GRAY),
            plane(2.0, 2.0, GRAY),
            sphere(1.0, 12, GRAY),
            cylinder(0.5, 2.0, 12, GRAY),
            cone(0.5, 1.0, 12, GRAY),
        ];
        for mesh in &meshes {
            let errors = MeshValidator::new(mesh).validate_all();
            assert!(errors.is_empty(), "{errors:?}");
        }
    }

    #[test]
    fn test_box_dimensions() {
        let mesh = cuboid(1.0, 2.0, 3.0, GRAY);
        assert!(MeshValidator::new(&mesh).assert_dimensions_approx([1.0, 2.0, 3.0], 1e-4));
    }

    #[test]
    fn test_cylinder_height() {
        let mesh = cylinder(0.5, 2.0, 16, GRAY);
        let dims = MeshValidator::new(&mesh).dimensions();
        assert!((dims[1] - 2.0).abs() < 1e-4);
        assert!((dims[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_with_color() {
        let mesh = cuboid(1.0, 1.0, 1.0, GRAY).with_color([1.0, 0.0, 0.0]);
        assert!(mesh.vertices.chunks_exact(STRIDE).all(|v| v[6..9] == [1.0, 0.0, 0.0]));
    }
}
