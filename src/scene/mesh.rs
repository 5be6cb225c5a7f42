use crate::foundation::core::{Pt3, Vec3};
use crate::foundation::error::{ScenepixError, ScenepixResult};

/// Default surface albedo for geometry without a material color.
pub const DEFAULT_BASE_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Indexed triangle list in the owning node's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Pt3>,
    /// Optional per-vertex normals, same length as `positions`.
    pub normals: Option<Vec<Vec3>>,
    /// Triangle corner indices, length is a multiple of three.
    pub indices: Vec<u32>,
    /// Linear albedo in `[0, 1]`.
    pub base_color: [f32; 3],
}

impl Mesh {
    /// Build a mesh and check index bounds.
    pub fn new(
        positions: Vec<Pt3>,
        normals: Option<Vec<Vec3>>,
        indices: Vec<u32>,
    ) -> ScenepixResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(ScenepixError::load(format!(
                "triangle index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(ScenepixError::load(format!(
                "triangle index {bad} out of range for {} vertices",
                positions.len()
            )));
        }
        let normals = normals.filter(|n| n.len() == positions.len());
        Ok(Self {
            positions,
            normals,
            indices,
            base_color: DEFAULT_BASE_COLOR,
        })
    }

    pub fn with_base_color(mut self, rgb: [f32; 3]) -> Self {
        self.base_color = rgb.map(|c| c.clamp(0.0, 1.0));
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}
