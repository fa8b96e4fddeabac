//! 混合形状（blendshape）系统
//!
//! 权重使用 0~100 的百分比约定，顶点偏移按 `weight / 100` 线性叠加。

mod blend_shape;
mod manager;

pub use blend_shape::BlendShape;
pub use manager::BlendShapeManager;

use glam::Vec3;

/// 满权重（百分比）
pub const FULL_WEIGHT: f32 = 100.0;

/// 顶点偏移
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexDelta {
    pub vertex_index: u32,
    pub offset: Vec3,
}
