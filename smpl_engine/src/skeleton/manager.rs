//! 骨架（骨骼层级管理）

use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

use super::Bone;
use crate::{Result, SmplError};

/// 骨架
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加骨骼
    pub fn add_bone(&mut self, bone: Bone) {
        let index = self.bones.len();
        self.name_to_index.insert(bone.name.clone(), index);
        self.bones.push(bone);
    }

    /// 构建骨骼层级
    ///
    /// 由模型空间初始位置推出局部偏移，局部旋转清零，
    /// 并以当前姿态记录逆绑定矩阵。
    pub fn build_hierarchy(&mut self) -> Result<()> {
        let bone_count = self.bones.len();
        self.children = vec![Vec::new(); bone_count];

        for i in 0..bone_count {
            let parent = self.bones[i].parent_index;
            if parent < 0 {
                continue;
            }
            let parent = parent as usize;
            if parent >= bone_count || parent == i {
                return Err(SmplError::Template(format!(
                    "bone {} ({}) has invalid parent {}",
                    i, self.bones[i].name, parent
                )));
            }
            self.children[parent].push(i);
        }

        // 检测环：每条父链必须在 bone_count 步内到达根
        for i in 0..bone_count {
            let mut current = self.bones[i].parent_index;
            let mut steps = 0;
            while current >= 0 {
                steps += 1;
                if steps > bone_count {
                    return Err(SmplError::Template(format!(
                        "bone hierarchy contains a cycle at {}",
                        self.bones[i].name
                    )));
                }
                current = self.bones[current as usize].parent_index;
            }
        }

        for i in 0..bone_count {
            let pos = self.bones[i].initial_position;
            let parent_idx = self.bones[i].parent_index;
            let offset = if parent_idx >= 0 {
                pos - self.bones[parent_idx as usize].initial_position
            } else {
                pos
            };
            self.bones[i].local_position = offset;
            self.bones[i].local_rotation = Quat::IDENTITY;
        }

        self.update_global_transforms();
        self.recompute_bind_poses();
        Ok(())
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 获取骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// 获取骨骼
    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// 直接子骨骼
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 设置局部旋转（不刷新全局变换，批量设置后调用 update_global_transforms）
    pub fn set_local_rotation(&mut self, index: usize, rotation: Quat) {
        if let Some(bone) = self.bones.get_mut(index) {
            bone.local_rotation = rotation;
        }
    }

    pub fn local_rotation(&self, index: usize) -> Quat {
        self.bones
            .get(index)
            .map(|b| b.local_rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    /// 所有骨骼局部旋转清零
    pub fn reset_rotations(&mut self) {
        for bone in &mut self.bones {
            bone.local_rotation = Quat::IDENTITY;
        }
        self.update_global_transforms();
    }

    /// 设置骨骼在模型空间中的位置
    ///
    /// 反推局部平移，子骨骼保持局部偏移不变，因此会随之整体移动。
    pub fn set_model_position(&mut self, index: usize, position: Vec3) {
        if index >= self.bones.len() {
            return;
        }

        let parent_global = self.parent_global(index);
        let local = parent_global.inverse().transform_point3(position);
        self.bones[index].local_position = local;
        self.bones[index].global_transform = parent_global * self.bones[index].local_transform();
        self.update_children_global_transform(index);
    }

    /// 骨骼模型空间位置
    pub fn model_position(&self, index: usize) -> Vec3 {
        self.bones
            .get(index)
            .map(|b| b.model_position())
            .unwrap_or(Vec3::ZERO)
    }

    /// 所有骨骼的模型空间位置
    pub fn model_positions(&self) -> Vec<Vec3> {
        self.bones.iter().map(|b| b.model_position()).collect()
    }

    /// 从 root 开始深度优先设置位置
    ///
    /// 父骨骼必须先于子孙设置：移动父骨骼会带动尚未设置的子孙。
    /// `position_of` 返回 None 的骨骼保持不动，但仍会继续访问其子骨骼。
    pub fn set_positions_downwards<F>(&mut self, root: usize, mut position_of: F)
    where
        F: FnMut(usize, &str) -> Option<Vec3>,
    {
        if root >= self.bones.len() {
            return;
        }
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if let Some(position) = position_of(index, &self.bones[index].name) {
                self.set_model_position(index, position);
            }
            // 逆序压栈，保证按子骨骼原始顺序访问
            for &child in self.children(index).iter().rev() {
                stack.push(child);
            }
        }
    }

    /// 更新所有骨骼的全局变换
    pub fn update_global_transforms(&mut self) {
        for i in 0..self.bones.len() {
            if self.bones[i].parent_index < 0 {
                self.bones[i].global_transform = self.bones[i].local_transform();
                self.update_children_global_transform(i);
            }
        }
    }

    /// 以当前全局变换重新计算逆绑定矩阵
    pub fn recompute_bind_poses(&mut self) {
        for bone in &mut self.bones {
            bone.inverse_bind_matrix = bone.global_transform.inverse();
        }
    }

    /// 获取蒙皮矩阵数组
    pub fn skinning_matrices(&self) -> Vec<Mat4> {
        self.bones.iter().map(|b| b.skinning_matrix()).collect()
    }

    /// 获取全局变换
    pub fn global_transform(&self, index: usize) -> Mat4 {
        self.bones
            .get(index)
            .map(|b| b.global_transform)
            .unwrap_or(Mat4::IDENTITY)
    }

    fn parent_global(&self, index: usize) -> Mat4 {
        let parent_idx = self.bones[index].parent_index;
        if parent_idx >= 0 && (parent_idx as usize) < self.bones.len() {
            self.bones[parent_idx as usize].global_transform
        } else {
            Mat4::IDENTITY
        }
    }

    /// 递归更新子骨骼的全局变换（不改变局部变换）
    fn update_children_global_transform(&mut self, parent_index: usize) {
        let parent_global = self.bones[parent_index].global_transform;
        let children = self.children[parent_index].clone();
        for child_idx in children {
            self.bones[child_idx].global_transform =
                parent_global * self.bones[child_idx].local_transform();
            self.update_children_global_transform(child_idx);
        }
    }
}
