use crate::scene::graph::NodeId;

/// Renderer default vertical field of view.
pub const DEFAULT_YFOV_DEG: f32 = 60.0;
/// Renderer default near clip distance.
pub const DEFAULT_ZNEAR: f32 = 1.0;
/// Renderer default far clip distance.
pub const DEFAULT_ZFAR: f32 = 100.0;

/// Keeps a camera aimed at another node's world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookAt {
    pub target: NodeId,
    /// Let the constraint roll freely instead of fighting an up vector. World +Y stays the
    /// reference up whenever it is not parallel to the viewing direction.
    pub gimbal_lock: bool,
}

/// Perspective camera attached to a scene node, looking down its local −Z axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub yfov_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub look_at: Option<LookAt>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yfov_deg: DEFAULT_YFOV_DEG,
            znear: DEFAULT_ZNEAR,
            zfar: DEFAULT_ZFAR,
            look_at: None,
        }
    }
}
