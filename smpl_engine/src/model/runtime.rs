//! 人体运行时 rig

use glam::{Mat4, Quat, Vec3};

use super::VertexWeight;
use crate::blendshape::BlendShapeManager;
use crate::skeleton::Skeleton;
use crate::skinning::{compute_skinning, SkinningInput};

/// 人体运行时 rig
///
/// 每个角色持有自己的一份深拷贝，顶点缓冲不在角色之间共享。
/// 顶点与骨骼都在根空间中，根节点的平移和旋转只影响 [`BodyModel::world_point`]。
#[derive(Clone, Debug, Default)]
pub struct BodyModel {
    pub name: String,
    pub skeleton: Skeleton,
    pub blend_shapes: BlendShapeManager,
    pub weights: Vec<VertexWeight>,

    // 基础顶点缓冲（未叠加混合形状、未蒙皮）
    vertices: Vec<Vec3>,

    // 根节点变换
    root_translation: Vec3,
    root_rotation: Quat,
}

impl BodyModel {
    pub fn new(
        name: impl Into<String>,
        skeleton: Skeleton,
        blend_shapes: BlendShapeManager,
        vertices: Vec<Vec3>,
        weights: Vec<VertexWeight>,
    ) -> Self {
        Self {
            name: name.into(),
            skeleton,
            blend_shapes,
            weights,
            vertices,
            root_translation: Vec3::ZERO,
            root_rotation: Quat::IDENTITY,
        }
    }

    /// 获取顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn bone_count(&self) -> usize {
        self.skeleton.bone_count()
    }

    // ========== 输出接口（供渲染端消费） ==========

    /// 设置骨骼局部旋转（批量设置后调用 update_transforms）
    pub fn set_bone_local_rotation(&mut self, index: usize, rotation: Quat) {
        self.skeleton.set_local_rotation(index, rotation);
    }

    pub fn bone_local_rotation(&self, index: usize) -> Quat {
        self.skeleton.local_rotation(index)
    }

    /// 设置骨骼模型空间位置
    pub fn set_bone_position(&mut self, index: usize, position: Vec3) {
        self.skeleton.set_model_position(index, position);
    }

    pub fn bone_position(&self, index: usize) -> Vec3 {
        self.skeleton.model_position(index)
    }

    /// 设置骨骼局部平移
    pub fn set_bone_local_position(&mut self, index: usize, position: Vec3) {
        let parent = self
            .skeleton
            .get_bone(index)
            .map(|b| b.parent_index)
            .unwrap_or(-1);
        let parent_global = if parent >= 0 {
            self.skeleton.global_transform(parent as usize)
        } else {
            Mat4::IDENTITY
        };
        self.skeleton
            .set_model_position(index, parent_global.transform_point3(position));
    }

    pub fn bone_local_position(&self, index: usize) -> Vec3 {
        self.skeleton
            .get_bone(index)
            .map(|b| b.local_position)
            .unwrap_or(Vec3::ZERO)
    }

    /// 设置混合形状权重（0~100 约定）
    pub fn set_blend_shape_weight(&mut self, channel: usize, weight: f32) {
        self.blend_shapes.set_weight(channel, weight);
    }

    pub fn blend_shape_weight(&self, channel: usize) -> f32 {
        self.blend_shapes.weight(channel)
    }

    // ========== 顶点与骨骼 ==========

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vec3] {
        &mut self.vertices
    }

    /// 替换顶点缓冲，长度必须一致
    pub fn set_vertices(&mut self, vertices: &[Vec3]) {
        if vertices.len() == self.vertices.len() {
            self.vertices.copy_from_slice(vertices);
        } else {
            log::warn!(
                "{}: vertex count mismatch ({} vs {}), buffer not replaced",
                self.name,
                vertices.len(),
                self.vertices.len()
            );
        }
    }

    /// 以当前骨骼重新计算逆绑定矩阵
    pub fn recompute_bind_poses(&mut self) {
        self.skeleton.recompute_bind_poses();
    }

    /// 刷新全局骨骼变换
    pub fn update_transforms(&mut self) {
        self.skeleton.update_global_transforms();
    }

    /// 烘焙网格：先叠加混合形状，再做线性混合蒙皮（根空间）
    pub fn bake(&self) -> Vec<Vec3> {
        let mut positions = self.vertices.clone();
        self.blend_shapes.apply(&mut positions);
        let bone_matrices = self.skeleton.skinning_matrices();
        compute_skinning(&SkinningInput {
            positions: &positions,
            weights: &self.weights,
            bone_matrices: &bone_matrices,
        })
    }

    // ========== 根节点 ==========

    pub fn root_translation(&self) -> Vec3 {
        self.root_translation
    }

    pub fn set_root_translation(&mut self, translation: Vec3) {
        self.root_translation = translation;
    }

    pub fn root_rotation(&self) -> Quat {
        self.root_rotation
    }

    pub fn set_root_rotation(&mut self, rotation: Quat) {
        self.root_rotation = rotation;
    }

    /// 根节点变换矩阵
    pub fn root_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.root_rotation, self.root_translation)
    }

    /// 根空间点 -> 世界空间点
    pub fn world_point(&self, point: Vec3) -> Vec3 {
        self.root_transform().transform_point3(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_bake_at_bind_pose_is_base_mesh() {
        let rig = fixtures::body_model();
        let baked = rig.bake();
        for (a, b) in baked.iter().zip(rig.vertices()) {
            assert!((*a - *b).length() < 1e-5);
        }
    }

    #[test]
    fn test_bake_applies_blend_shape_before_skinning() {
        let mut rig = fixtures::body_model();
        rig.set_blend_shape_weight(0, 100.0);
        rig.set_bone_local_rotation(0, Quat::from_rotation_y(std::f32::consts::PI));
        rig.update_transforms();
        let baked = rig.bake();
        // 第 0 号顶点只受 Pelvis 影响，体型通道 0 在其上加了 +X 偏移
        let expected = Quat::from_rotation_y(std::f32::consts::PI)
            * (rig.vertices()[0] + fixtures::SHAPE_DELTA - rig.bone_position(0))
            + rig.bone_position(0);
        assert!((baked[0] - expected).length() < 1e-4);
    }

    #[test]
    fn test_world_point_uses_root_transform() {
        let mut rig = fixtures::body_model();
        rig.set_root_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!((rig.world_point(Vec3::ZERO) - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        rig.set_root_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        let p = rig.world_point(Vec3::Z);
        assert!((p - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_set_vertices_length_mismatch_ignored() {
        let mut rig = fixtures::body_model();
        let before = rig.vertices().to_vec();
        rig.set_vertices(&[Vec3::ONE]);
        assert_eq!(rig.vertices(), before.as_slice());
    }

    #[test]
    fn test_local_position_roundtrip() {
        let mut rig = fixtures::body_model();
        rig.set_bone_local_position(1, Vec3::new(0.0, 0.7, 0.0));
        assert!((rig.bone_local_position(1) - Vec3::new(0.0, 0.7, 0.0)).length() < 1e-5);
    }
}
