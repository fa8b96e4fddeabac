//! 姿态解析：骨骼旋转与姿态相关混合形状

use glam::Quat;

use crate::body::BodyShaper;
use crate::config::BodyOptions;
use crate::model::{BodyModel, ModelDefinition};
use crate::skeleton::{JointMap, PELVIS};
use crate::space::{pelvis_correction, quat_to_source, rotation_matrix, subtract_identity};
use crate::{Result, SmplError};

/// 姿态解析器（每个角色一个）
#[derive(Clone, Debug)]
pub struct PoseResolver {
    joint_map: JointMap,
    poses: Vec<Quat>,
}

impl PoseResolver {
    pub fn new(model: &ModelDefinition) -> Self {
        Self {
            joint_map: JointMap::for_joint_count(model.joint_count),
            poses: vec![Quat::IDENTITY; model.joint_count],
        }
    }

    /// 设置当前帧的关节旋转（引擎坐标系）
    pub fn set_poses(&mut self, poses: Vec<Quat>) {
        self.poses = poses;
    }

    pub fn poses(&self) -> &[Quat] {
        &self.poses
    }

    /// 每帧更新，返回体型是否发生变化
    pub fn update(
        &mut self,
        rig: &mut BodyModel,
        shaper: &mut BodyShaper,
        model: &ModelDefinition,
        options: &BodyOptions,
    ) -> Result<bool> {
        let mut body_changed = false;
        if options.update_body_shape_live {
            self.reset_to_t_pose(rig, model);
            body_changed = shaper.update_body(rig, model, options.show_individualized_body)?;
        }

        if options.allow_pose_manipulation {
            self.poses = self.gather_poses_from_bones(rig, model)?;
            self.update_poses(rig)?;
        } else if options.update_poses_live {
            self.update_poses(rig)?;
        } else {
            Self::reset_poses(rig);
        }

        if options.update_pose_blend_shapes_live {
            self.add_pose_dependent_blend_shapes(rig, model);
        } else {
            Self::reset_pose_dependent_blend_shapes(rig, model);
        }

        rig.update_transforms();
        Ok(body_changed)
    }

    /// 回到 T 姿态：骨骼旋转归零，姿态混合形状清零
    pub fn reset_to_t_pose(&self, rig: &mut BodyModel, model: &ModelDefinition) {
        Self::reset_poses(rig);
        Self::reset_pose_dependent_blend_shapes(rig, model);
        rig.update_transforms();
    }

    /// 从骨骼当前局部旋转读回姿态（手动摆姿态模式）
    ///
    /// 骨盆的坐标修正会先去掉，读回后再应用不会累积。
    fn gather_poses_from_bones(&self, rig: &BodyModel, model: &ModelDefinition) -> Result<Vec<Quat>> {
        let mut poses = vec![Quat::IDENTITY; model.joint_count];
        for (bone_index, bone) in rig.skeleton.bones().iter().enumerate() {
            let joint = self.joint_index(bone_index, &bone.name)?;
            let rotation = if bone.name == PELVIS {
                pelvis_correction().inverse() * bone.local_rotation
            } else {
                bone.local_rotation
            };
            if let Some(slot) = poses.get_mut(joint) {
                *slot = rotation;
            }
        }
        Ok(poses)
    }

    /// 每根骨骼：旋转归零，骨盆加坐标修正，再乘以对应关节的姿态
    fn update_poses(&self, rig: &mut BodyModel) -> Result<()> {
        for bone_index in 0..rig.bone_count() {
            let name = rig
                .skeleton
                .get_bone(bone_index)
                .map(|b| b.name.clone())
                .unwrap_or_default();

            let base = if name == PELVIS {
                pelvis_correction()
            } else {
                Quat::IDENTITY
            };

            let joint = self.joint_index(bone_index, &name)?;
            let pose = self.poses.get(joint).copied().ok_or_else(|| {
                SmplError::DataShape(format!(
                    "pose has {} joints, bone {name} needs joint {joint}",
                    self.poses.len()
                ))
            })?;
            rig.set_bone_local_rotation(bone_index, base * pose);
        }
        Ok(())
    }

    fn reset_poses(rig: &mut BodyModel) {
        rig.skeleton.reset_rotations();
    }

    /// 关节旋转 -> 源坐标系 -> 旋转矩阵 - 单位矩阵 -> 9 个通道权重
    fn add_pose_dependent_blend_shapes(&self, rig: &mut BodyModel, model: &ModelDefinition) {
        let scale = model.pose_blend_shape_factor() * model.unity_blend_shape_scale_factor;
        for joint in model.first_pose_blend_shape_joint()..model.joint_count {
            let pose = self.poses.get(joint).copied().unwrap_or(Quat::IDENTITY);
            let matrix = subtract_identity(rotation_matrix(quat_to_source(pose)));
            for (element, value) in matrix.iter().enumerate() {
                rig.set_blend_shape_weight(model.pose_blend_shape_index(joint, element), value * scale);
            }
        }
    }

    fn reset_pose_dependent_blend_shapes(rig: &mut BodyModel, model: &ModelDefinition) {
        for (_, _, channel) in model.pose_channels() {
            rig.set_blend_shape_weight(channel, 0.0);
        }
    }

    fn joint_index(&self, bone_index: usize, name: &str) -> Result<usize> {
        self.joint_map
            .joint_index(name)
            .ok_or_else(|| SmplError::BoneNotInJointMap {
                bone_index,
                name: name.to_string(),
            })
    }
}
