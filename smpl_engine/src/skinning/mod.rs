//! 线性混合蒙皮（烘焙网格用）

mod skinning;

pub use skinning::{compute_skinning, skin_vertex};

use crate::model::VertexWeight;
use glam::{Mat4, Vec3};

/// 蒙皮输入数据
pub struct SkinningInput<'a> {
    /// 已叠加混合形状的顶点位置（根空间）
    pub positions: &'a [Vec3],
    /// 顶点权重
    pub weights: &'a [VertexWeight],
    /// 骨骼变换矩阵（已乘以逆绑定矩阵）
    pub bone_matrices: &'a [Mat4],
}
