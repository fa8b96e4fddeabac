//! 坐标系转换
//!
//! 动捕数据使用右手、Z 轴向上的源坐标系（SourceSpace），
//! 引擎使用左手、Y 轴向上的坐标系（EngineSpace）。
//! 所有手性翻转都集中在这里，其余模块不得自行取反分量。

use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// 3x3 旋转矩阵的元素个数
pub const ROTATION_MATRIX_ELEMENT_COUNT: usize = 9;

/// 行优先的 3x3 矩阵
pub type Matrix3Rows = [f32; ROTATION_MATRIX_ELEMENT_COUNT];

/// 源坐标系点 -> 引擎坐标系点（翻转 X）
pub fn point_to_engine(p: Vec3) -> Vec3 {
    Vec3::new(-p.x, p.y, p.z)
}

/// 源坐标系四元数 -> 引擎坐标系四元数
pub fn quat_to_engine(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.y, q.z, -q.w)
}

/// 引擎坐标系四元数 -> 源坐标系四元数
///
/// 与 [`quat_to_engine`] 是同一个映射（对合变换）。
pub fn quat_to_source(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.y, q.z, -q.w)
}

/// 四元数展开为行优先 3x3 旋转矩阵
pub fn rotation_matrix(q: Quat) -> Matrix3Rows {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    [
        1.0 - 2.0 * y * y - 2.0 * z * z,
        2.0 * x * y - 2.0 * z * w,
        2.0 * x * z + 2.0 * y * w,
        2.0 * x * y + 2.0 * z * w,
        1.0 - 2.0 * x * x - 2.0 * z * z,
        2.0 * y * z - 2.0 * x * w,
        2.0 * x * z - 2.0 * y * w,
        2.0 * y * z + 2.0 * x * w,
        1.0 - 2.0 * x * x - 2.0 * y * y,
    ]
}

/// 减去单位矩阵（静止姿态下结果接近全零）
pub fn subtract_identity(mut m: Matrix3Rows) -> Matrix3Rows {
    m[0] -= 1.0;
    m[4] -= 1.0;
    m[8] -= 1.0;
    m
}

/// 轴角旋转向量 -> 四元数（基于 sinc 的指数映射）
pub fn rotation_vector_to_quat(v: Vec3) -> Quat {
    // 零向量必须提前返回，否则 sinc 除零
    if v == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let theta = v.length();
    let scale = 0.5 * sinc(0.5 * (theta / PI));
    Quat::from_xyzw(
        scale * v.x,
        scale * v.y,
        scale * v.z,
        (0.5 * theta).cos(),
    )
}

fn sinc(x: f32) -> f32 {
    (PI * x).sin() / (PI * x)
}

/// 骨盆修正：绕 X 轴 -90 度（Z 向上 -> Y 向上）
pub fn pelvis_correction() -> Quat {
    Quat::from_rotation_x(-FRAC_PI_2)
}
