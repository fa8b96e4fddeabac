//! JSON 动画解析

use glam::{Quat, Vec3};
use serde_json::Value;
use std::sync::Arc;

use super::AnimationSource;
use crate::animation::AnimationData;
use crate::model::{Gender, ModelDefinition};
use crate::space::{point_to_engine, quat_to_engine};
use crate::{Result, SmplError};

/// JSON 动画文件
///
/// 平移为每帧 3 个浮点数，姿态为每帧每关节 4 个浮点数 (x, y, z, w)，
/// 都在源坐标系中。
#[derive(Clone, Debug)]
pub struct AnimationJsonParser {
    root: Value,
}

impl AnimationJsonParser {
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        if !root.is_object() {
            return Err(SmplError::DataRead("animation JSON root is not an object".into()));
        }
        Ok(Self { root })
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.root.get(key).filter(|v| !v.is_null())
    }

    fn read_gender(&self, model: &ModelDefinition) -> Result<Gender> {
        let keys = &model.json_keys;
        let value = self
            .field(&keys.gender)
            .and_then(Value::as_str)
            .ok_or_else(|| SmplError::DataRead("File does not contain a gender field.".into()))?;
        keys.parse_gender(value).ok_or_else(|| {
            SmplError::DataRead(format!("Unexpected value for gender ({value}) in JSON file."))
        })
    }

    /// 缺失或非正数时为 0，播放时再使用回退帧率
    fn read_fps(&self, model: &ModelDefinition) -> u32 {
        match self.field(&model.json_keys.fps).and_then(Value::as_f64) {
            Some(fps) if fps > 0.0 => fps.round() as u32,
            _ => 0,
        }
    }

    fn read_betas(&self, model: &ModelDefinition) -> Result<Vec<f32>> {
        let node = self
            .field(&model.json_keys.betas)
            .ok_or_else(|| SmplError::DataRead("File does not contain a betas field.".into()))?;
        let betas = float_array(node, "betas")?;
        if betas.len() != model.body_shape_beta_count {
            return Err(SmplError::DataShape(format!(
                "{} betas, model {} expects {}",
                betas.len(),
                model.model_name,
                model.body_shape_beta_count
            )));
        }
        Ok(betas)
    }

    fn read_translations(&self, model: &ModelDefinition) -> Result<Vec<Vec3>> {
        let frames = self
            .field(&model.json_keys.translations)
            .and_then(Value::as_array)
            .ok_or_else(|| SmplError::DataRead("File does not contain a translation array.".into()))?;

        frames
            .iter()
            .enumerate()
            .map(|(frame, node)| {
                let v = fixed_array::<3>(node, || format!("translation at frame {frame}"))?;
                Ok(point_to_engine(Vec3::from_array(v)))
            })
            .collect()
    }

    fn read_poses(&self, model: &ModelDefinition) -> Result<Vec<Vec<Quat>>> {
        let frames = self
            .field(&model.json_keys.poses)
            .and_then(Value::as_array)
            .ok_or_else(|| SmplError::DataRead("File does not contain a poses array.".into()))?;

        frames
            .iter()
            .enumerate()
            .map(|(frame, node)| {
                let joints = node.as_array().ok_or_else(|| {
                    SmplError::DataShape(format!("poses at frame {frame} is not an array"))
                })?;
                if joints.len() != model.joint_count {
                    return Err(SmplError::DataShape(format!(
                        "frame {frame} has {} joints, model {} expects {}",
                        joints.len(),
                        model.model_name,
                        model.joint_count
                    )));
                }
                joints
                    .iter()
                    .enumerate()
                    .map(|(joint, q)| {
                        let q = fixed_array::<4>(q, || format!("pose at frame {frame}, joint {joint}"))?;
                        Ok(quat_to_engine(Quat::from_array(q)))
                    })
                    .collect()
            })
            .collect()
    }
}

impl AnimationSource for AnimationJsonParser {
    fn is_matching_model(&self, model: &ModelDefinition) -> bool {
        self.field(&model.json_keys.betas)
            .and_then(Value::as_array)
            .is_some_and(|betas| betas.len() == model.body_shape_beta_count)
    }

    fn format_data(&self, model: Arc<ModelDefinition>) -> Result<AnimationData> {
        let gender = self.read_gender(&model)?;
        let fps = self.read_fps(&model);
        let betas = self.read_betas(&model)?;
        let translations = self.read_translations(&model)?;
        let poses = self.read_poses(&model)?;

        let data = AnimationData {
            gender,
            fps,
            frame_count: translations.len(),
            translations,
            poses,
            betas,
            model,
        };
        data.validate()?;
        Ok(data)
    }
}

fn float_array(node: &Value, what: &str) -> Result<Vec<f32>> {
    node.as_array()
        .ok_or_else(|| SmplError::DataShape(format!("{what} is not an array")))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| SmplError::DataRead(format!("{what} contains a non-numeric value")))
        })
        .collect()
}

fn fixed_array<const N: usize>(node: &Value, what: impl Fn() -> String) -> Result<[f32; N]> {
    let values = float_array(node, &what())?;
    values.try_into().map_err(|v: Vec<f32>| {
        SmplError::DataShape(format!("{} has {} values, expected {N}", what(), v.len()))
    })
}
