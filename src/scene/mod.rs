//! Scene graph model and asset loading.

pub mod camera;
pub mod graph;
pub mod light;
pub mod load;
pub mod mesh;
