//! 骨骼节点

use glam::{Mat4, Quat, Vec3};

/// 骨骼节点
///
/// 所有全局量都相对于角色根节点（模型空间）。
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub parent_index: i32,

    // 初始位置（模型空间，仅在 build_hierarchy 中使用）
    pub initial_position: Vec3,

    // 相对于父骨骼的局部变换
    pub local_position: Vec3,
    pub local_rotation: Quat,

    // 逆绑定矩阵（bind pose）
    pub inverse_bind_matrix: Mat4,

    // 变换结果
    pub global_transform: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_index: -1,
            initial_position: Vec3::ZERO,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
            global_transform: Mat4::IDENTITY,
        }
    }

    /// 以父骨骼索引和模型空间位置创建
    pub fn with_parent(name: impl Into<String>, parent_index: i32, position: Vec3) -> Self {
        let mut bone = Self::new(name);
        bone.parent_index = parent_index;
        bone.initial_position = position;
        bone
    }

    /// 局部变换矩阵
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.local_rotation, self.local_position)
    }

    /// 模型空间位置
    pub fn model_position(&self) -> Vec3 {
        self.global_transform.w_axis.truncate()
    }

    /// 获取蒙皮矩阵 = 当前全局变换 * 逆绑定矩阵
    pub fn skinning_matrix(&self) -> Mat4 {
        self.global_transform * self.inverse_bind_matrix
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::new(String::new())
    }
}
