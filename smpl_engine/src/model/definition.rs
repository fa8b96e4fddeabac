//! 人体模型定义（SMPL / SMPL-H 等）

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::Gender;
use crate::space::ROTATION_MATRIX_ELEMENT_COUNT;
use crate::{Result, SmplError};

/// 动画文件中的字段名
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelKeys {
    pub gender: String,
    pub male: String,
    pub female: String,
    pub fps: String,
    pub translations: String,
    pub poses: String,
    pub betas: String,
}

impl ModelKeys {
    /// JSON 动画的默认字段名
    pub fn json() -> Self {
        Self {
            gender: "gender".into(),
            male: "male".into(),
            female: "female".into(),
            fps: "fps".into(),
            translations: "trans".into(),
            poses: "poses".into(),
            betas: "betas".into(),
        }
    }

    /// H5 动画的默认字段名（帧率字段不同）
    pub fn h5() -> Self {
        Self {
            fps: "mocap_framerate".into(),
            ..Self::json()
        }
    }

    /// 按性别字段的取值解析性别
    pub fn parse_gender(&self, value: &str) -> Option<Gender> {
        if value == self.male {
            Some(Gender::Male)
        } else if value == self.female {
            Some(Gender::Female)
        } else {
            None
        }
    }
}

/// 按性别区分的文件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenderFiles {
    pub male: PathBuf,
    pub female: PathBuf,
}

impl GenderFiles {
    pub fn get(&self, gender: Gender) -> &Path {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    /// 相对路径以 base 为根
    pub fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.male, &mut self.female] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn default_unity_scale() -> f32 {
    100.0
}

fn default_divisor() -> f32 {
    1.0
}

/// 人体模型定义
///
/// 加载后不可变，由所有使用该模型的动画通过 `Arc` 共享。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub model_name: String,
    pub body_shape_beta_count: usize,
    pub joint_count: usize,
    #[serde(default)]
    pub pose_dependent_blend_shape_count: Option<usize>,
    #[serde(default = "ModelKeys::json")]
    pub json_keys: ModelKeys,
    #[serde(default = "ModelKeys::h5")]
    pub h5_keys: ModelKeys,
    #[serde(default)]
    pub rotate_to_engine_coords: bool,
    #[serde(default)]
    pub pelvis_index: usize,
    #[serde(default)]
    pub first_pose_is_pelvis_translation: bool,
    pub regressor_files: GenderFiles,
    pub template_files: GenderFiles,
    #[serde(default = "default_unity_scale")]
    pub unity_blend_shape_scale_factor: f32,
    /// 存储为除数，实际系数为 1/x
    #[serde(default = "default_divisor")]
    pub pose_blend_shape_scaling_factor: f32,
    /// 存储为除数，实际系数为 1/x
    #[serde(default = "default_divisor")]
    pub shape_blend_shape_scaling_factor: f32,
}

impl ModelDefinition {
    /// 校验计数与系数
    pub fn validate(&self) -> Result<()> {
        let name = &self.model_name;
        if self.body_shape_beta_count == 0 {
            return Err(SmplError::Config(format!("{name}: body_shape_beta_count is 0")));
        }
        if self.joint_count == 0 {
            return Err(SmplError::Config(format!("{name}: joint_count is 0")));
        }
        if self.pelvis_index >= self.joint_count {
            return Err(SmplError::Config(format!(
                "{name}: pelvis_index {} out of range for {} joints",
                self.pelvis_index, self.joint_count
            )));
        }
        if self.pose_blend_shape_scaling_factor == 0.0 || self.shape_blend_shape_scaling_factor == 0.0 {
            return Err(SmplError::Config(format!("{name}: blendshape scaling divisor is 0")));
        }
        if let Some(count) = self.pose_dependent_blend_shape_count {
            let derived = self.pose_channel_count();
            if count != derived {
                return Err(SmplError::Config(format!(
                    "{name}: pose_dependent_blend_shape_count {count} does not match derived {derived}"
                )));
            }
        }
        Ok(())
    }

    /// 姿态混合形状实际系数
    pub fn pose_blend_shape_factor(&self) -> f32 {
        1.0 / self.pose_blend_shape_scaling_factor
    }

    /// 体型混合形状实际系数
    pub fn shape_blend_shape_factor(&self) -> f32 {
        1.0 / self.shape_blend_shape_scaling_factor
    }

    pub fn regressor_file(&self, gender: Gender) -> &Path {
        self.regressor_files.get(gender)
    }

    pub fn template_file(&self, gender: Gender) -> &Path {
        self.template_files.get(gender)
    }

    /// 第一个带姿态混合形状的关节
    pub fn first_pose_blend_shape_joint(&self) -> usize {
        if self.first_pose_is_pelvis_translation {
            1
        } else {
            0
        }
    }

    /// 姿态混合形状通道索引 = beta 数 + 关节(去骨盆) × 9 + 矩阵元素
    pub fn pose_blend_shape_index(&self, joint: usize, element: usize) -> usize {
        let joint_no_pelvis = if self.first_pose_is_pelvis_translation {
            joint - 1
        } else {
            joint
        };
        self.body_shape_beta_count + joint_no_pelvis * ROTATION_MATRIX_ELEMENT_COUNT + element
    }

    /// 姿态混合形状通道数量
    pub fn pose_channel_count(&self) -> usize {
        (self.joint_count - self.first_pose_blend_shape_joint()) * ROTATION_MATRIX_ELEMENT_COUNT
    }

    /// 遍历所有姿态混合形状通道：(关节, 矩阵元素, 通道索引)
    pub fn pose_channels(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (self.first_pose_blend_shape_joint()..self.joint_count).flat_map(move |joint| {
            (0..ROTATION_MATRIX_ELEMENT_COUNT)
                .map(move |element| (joint, element, self.pose_blend_shape_index(joint, element)))
        })
    }
}
