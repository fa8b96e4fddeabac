//! 动画数据

use glam::{Quat, Vec3};
use std::sync::Arc;

use super::ResampledFrame;
use crate::model::{Gender, ModelDefinition};
use crate::{Result, SmplError};

/// 一段已加载的动作数据（加载后不可变）
///
/// 平移和姿态都已转换到引擎坐标系。
#[derive(Clone, Debug)]
pub struct AnimationData {
    pub gender: Gender,
    /// 源帧率；0 表示缺失，播放时使用回退帧率
    pub fps: u32,
    pub frame_count: usize,
    pub translations: Vec<Vec3>,
    /// 按帧存储，每帧 joint_count 个四元数
    pub poses: Vec<Vec<Quat>>,
    pub betas: Vec<f32>,
    pub model: Arc<ModelDefinition>,
}

impl AnimationData {
    /// 校验数组长度
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(SmplError::DataShape("animation has no frames".into()));
        }
        if self.betas.len() != self.model.body_shape_beta_count {
            return Err(SmplError::DataShape(format!(
                "{} betas, model {} expects {}",
                self.betas.len(),
                self.model.model_name,
                self.model.body_shape_beta_count
            )));
        }
        if self.translations.len() != self.frame_count {
            return Err(SmplError::DataShape(format!(
                "{} translations for {} frames",
                self.translations.len(),
                self.frame_count
            )));
        }
        if self.poses.len() != self.frame_count {
            return Err(SmplError::DataShape(format!(
                "{} pose frames for {} frames",
                self.poses.len(),
                self.frame_count
            )));
        }
        if let Some((frame, row)) = self
            .poses
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.model.joint_count)
        {
            return Err(SmplError::DataShape(format!(
                "frame {frame} has {} joints, model {} expects {}",
                row.len(),
                self.model.model_name,
                self.model.joint_count
            )));
        }
        Ok(())
    }

    /// 重采样帧处的平移（Lerp）
    pub fn translation_at(&self, frame: &ResampledFrame) -> Vec3 {
        let before = self.translations[self.clamp_index(frame.frame_before)];
        if frame.is_single_source_frame(self.frame_count) {
            return before;
        }
        let after = self.translations[self.clamp_index(frame.frame_after)];
        before.lerp(after, frame.fraction)
    }

    /// 重采样帧处的姿态（逐关节 Slerp）
    pub fn poses_at(&self, frame: &ResampledFrame) -> Vec<Quat> {
        let before = &self.poses[self.clamp_index(frame.frame_before)];
        if frame.is_single_source_frame(self.frame_count) {
            return before.clone();
        }
        let after = &self.poses[self.clamp_index(frame.frame_after)];
        before
            .iter()
            .zip(after)
            .map(|(b, a)| b.slerp(*a, frame.fraction))
            .collect()
    }

    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.frame_count.saturating_sub(1))
    }
}
