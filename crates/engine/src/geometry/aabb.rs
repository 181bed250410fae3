use glam::{Mat4, Vec3};

use super::mesh::MeshData;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box of a mesh's positions, `None` for an empty mesh
    pub fn from_mesh(data: &MeshData) -> Option<Self> {
        Self::from_points(data.positions())
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Width, height and depth
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Box enclosing this one after `matrix` is applied
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let pick = |bit: u32, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
            matrix.transform_point3(Vec3::new(
                pick(1, self.min.x, self.max.x),
                pick(2, self.min.y, self.max.y),
                pick(4, self.min.z, self.max.z),
            ))
        });
        // eight corners, never empty
        Self::from_points(corners).unwrap_or(*self)
    }

    pub fn to_array(&self) -> [[f32; 3]; 2] {
        [self.min.to_array(), self.max.to_array()]
    }
}
