//! 顶点蒙皮计算

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use super::SkinningInput;
use crate::model::VertexWeight;

/// 计算蒙皮（rayon 并行，结果与串行一致）
///
/// 缺少权重的顶点原样输出。
pub fn compute_skinning(input: &SkinningInput) -> Vec<Vec3> {
    input
        .positions
        .par_iter()
        .enumerate()
        .map(|(i, &position)| match input.weights.get(i) {
            Some(weight) => skin_vertex(position, weight, input.bone_matrices),
            None => position,
        })
        .collect()
}

/// 计算单个顶点的蒙皮
pub fn skin_vertex(position: Vec3, weight: &VertexWeight, matrices: &[Mat4]) -> Vec3 {
    match weight {
        VertexWeight::One { bone } => get_matrix(matrices, *bone).transform_point3(position),
        VertexWeight::Two { bones, weight } => {
            let m0 = get_matrix(matrices, bones[0]);
            let m1 = get_matrix(matrices, bones[1]);
            let w0 = *weight;
            let w1 = 1.0 - w0;
            m0.transform_point3(position) * w0 + m1.transform_point3(position) * w1
        }
        VertexWeight::Four { bones, weights } => {
            let mut pos = Vec3::ZERO;
            for (bone, w) in bones.iter().zip(weights.iter()) {
                if *w == 0.0 {
                    continue;
                }
                pos += get_matrix(matrices, *bone).transform_point3(position) * *w;
            }
            pos
        }
    }
}

fn get_matrix(matrices: &[Mat4], index: i32) -> Mat4 {
    if index < 0 {
        return Mat4::IDENTITY;
    }
    matrices.get(index as usize).copied().unwrap_or(Mat4::IDENTITY)
}
