//! 体型整形
//!
//! 把平均体型改造成由 betas 描述的个体体型：
//! 先按回归出的关节位置移动骨骼，再校正网格偏差，最后叠加体型混合形状。
//! 渲染端移动骨骼时会自动做线性混合蒙皮，而体型混合形状是针对未变形网格制作的，
//! 所以每次整形都从平均体型重新开始，并在移动骨骼后重新记录绑定姿态。

use glam::Vec3;
use rayon::prelude::*;
use std::sync::Arc;

use super::{AverageBody, JointRegressor, MeshCorrection};
use crate::model::{BodyModel, Gender, ModelDefinition};
use crate::skeleton::JointMap;
use crate::{Result, SmplError};

const DEBUG_BETAS_MALE: [f32; 16] = [
    13.0, -4.4, 2.62, -4.38, 0.64, 0.58, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

const DEBUG_BETAS_FEMALE: [f32; 16] = [
    -13.4, -3.43, 0.0, 5.0, 1.8, -1.47, -0.42, -0.12, 11.0, -0.42, 3.0, 0.68, -2.2, 0.0, 0.0, 0.0,
];

/// 演示用的夸张体型参数
pub fn debug_betas(gender: Gender) -> [f32; 16] {
    match gender {
        Gender::Male => DEBUG_BETAS_MALE,
        Gender::Female => DEBUG_BETAS_FEMALE,
    }
}

/// 体型整形器（每个角色一个）
#[derive(Clone, Debug)]
pub struct BodyShaper {
    regressor: Arc<JointRegressor>,
    correction: MeshCorrection,
    joint_map: JointMap,
    average: AverageBody,

    // 实际 betas；显示平均体型时也保持不变
    betas: Vec<f32>,
    last_used_betas: Option<Vec<f32>>,

    minimum_y_vertex: f32,
    pelvis_reset_position: Vec3,
    pelvis_new_location: Vec3,
}

impl BodyShaper {
    /// 绑定到 rig：先把骨盆局部位置清零，再保存平均体型
    pub fn new(
        rig: &mut BodyModel,
        model: &ModelDefinition,
        regressor: Arc<JointRegressor>,
        correction: MeshCorrection,
    ) -> Self {
        rig.set_bone_local_position(model.pelvis_index, Vec3::ZERO);
        let average = AverageBody::capture(rig);
        let pelvis_reset_position = rig.bone_local_position(model.pelvis_index);

        Self {
            regressor,
            correction,
            joint_map: JointMap::for_joint_count(model.joint_count),
            average,
            betas: vec![0.0; model.body_shape_beta_count],
            last_used_betas: None,
            minimum_y_vertex: 0.0,
            pelvis_reset_position,
            pelvis_new_location: Vec3::ZERO,
        }
    }

    /// 以新的 betas 整形，返回体型是否发生变化
    pub fn reshape(
        &mut self,
        rig: &mut BodyModel,
        model: &ModelDefinition,
        betas: &[f32],
        show_individualized: bool,
    ) -> Result<bool> {
        if betas.len() != model.body_shape_beta_count {
            return Err(SmplError::DataShape(format!(
                "{} betas given, model {} expects {}",
                betas.len(),
                model.model_name,
                model.body_shape_beta_count
            )));
        }
        self.betas = betas.to_vec();
        self.update_body(rig, model, show_individualized)
    }

    /// 以当前保存的 betas 重新整形
    pub fn update_body(
        &mut self,
        rig: &mut BodyModel,
        model: &ModelDefinition,
        show_individualized: bool,
    ) -> Result<bool> {
        self.restore(rig, model);
        rig.recompute_bind_poses();

        let used_betas = if show_individualized {
            self.betas.clone()
        } else {
            vec![0.0; self.betas.len()]
        };

        self.adjust_bone_positions(rig, model, &used_betas)?;
        self.adjust_mesh_to_new_bones(rig);
        self.update_shape_blend_shapes(rig, model, &used_betas);
        rig.recompute_bind_poses();

        let changed = self.last_used_betas.as_deref() != Some(used_betas.as_slice());
        self.last_used_betas = Some(used_betas);
        Ok(changed)
    }

    /// 恢复平均体型
    pub fn restore(&self, rig: &mut BodyModel, model: &ModelDefinition) {
        self.average.restore(rig, model);
    }

    /// 演示体型（按模型的 beta 数截断或补零）
    pub fn set_debug_betas(
        &mut self,
        rig: &mut BodyModel,
        model: &ModelDefinition,
        gender: Gender,
    ) -> Result<bool> {
        log::warn!("Debug body shape mode enabled.");
        let mut betas = debug_betas(gender).to_vec();
        betas.resize(model.body_shape_beta_count, 0.0);
        self.reshape(rig, model, &betas, true)
    }

    /// 骨盆需要的落地偏移
    pub fn feet_on_ground_offset(&self) -> f32 {
        self.minimum_y_vertex
            + self.correction.offset_error_between_pelvis_and_zero.y
            + self.pelvis_reset_position.y
            - self.pelvis_new_location.y
    }

    /// 把落地偏移写入骨盆局部位置
    pub fn set_feet_on_ground(&self, rig: &mut BodyModel, model: &ModelDefinition) {
        let offset = self.feet_on_ground_offset();
        rig.set_bone_local_position(model.pelvis_index, Vec3::new(0.0, offset, 0.0));
    }

    pub fn betas(&self) -> &[f32] {
        &self.betas
    }

    pub fn minimum_y_vertex(&self) -> f32 {
        self.minimum_y_vertex
    }

    pub fn pelvis_new_location(&self) -> Vec3 {
        self.pelvis_new_location
    }

    /// 骨骼移到回归出的关节位置
    ///
    /// 从骨盆开始深度优先，父骨骼先于子孙设置；使用原始关节位置，不做居中。
    fn adjust_bone_positions(
        &mut self,
        rig: &mut BodyModel,
        model: &ModelDefinition,
        betas: &[f32],
    ) -> Result<()> {
        let joints = self.regressor.joint_positions(model, betas)?;
        self.pelvis_new_location = joints
            .get(model.pelvis_index)
            .copied()
            .unwrap_or(Vec3::ZERO);

        let joint_map = &self.joint_map;
        rig.skeleton
            .set_positions_downwards(model.pelvis_index, |_, name| {
                joint_map.joint_index(name).and_then(|j| joints.get(j).copied())
            });
        Ok(())
    }

    /// 减去网格与骨骼的原点偏差，同一遍循环中记录最低顶点
    fn adjust_mesh_to_new_bones(&mut self, rig: &mut BodyModel) {
        let offset = self.correction.combined_offset();
        self.minimum_y_vertex = rig
            .vertices_mut()
            .par_iter_mut()
            .map(|v| {
                *v -= offset;
                v.y
            })
            .reduce(|| f32::INFINITY, f32::min);
    }

    fn update_shape_blend_shapes(&self, rig: &mut BodyModel, model: &ModelDefinition, betas: &[f32]) {
        let scale = model.shape_blend_shape_factor() * model.unity_blend_shape_scale_factor;
        for (index, beta) in betas.iter().enumerate() {
            rig.set_blend_shape_weight(index, beta * scale);
        }
    }
}
