//! 列式（HDF5）动画解析
//!
//! HDF5 二进制格式本身由外部读取器负责，这里只消费按键名取出的数据集。

use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::AnimationSource;
use crate::animation::AnimationData;
use crate::model::{Gender, ModelDefinition};
use crate::space::{point_to_engine, quat_to_engine, rotation_vector_to_quat};
use crate::{Result, SmplError};

const MAX_GENDER_STRING_LENGTH: usize = 20;

/// 按键名读取的数据集
pub trait DatasetSource {
    /// 数据集各维度大小
    fn shape(&self, key: &str) -> Result<Vec<usize>>;
    /// 按行优先展平的数值
    fn read_f64(&self, key: &str) -> Result<Vec<f64>>;
    /// 原始字节（字符串数据集）
    fn read_bytes(&self, key: &str) -> Result<Vec<u8>>;
}

impl<T: DatasetSource + ?Sized> DatasetSource for Box<T> {
    fn shape(&self, key: &str) -> Result<Vec<usize>> {
        (**self).shape(key)
    }

    fn read_f64(&self, key: &str) -> Result<Vec<f64>> {
        (**self).read_f64(key)
    }

    fn read_bytes(&self, key: &str) -> Result<Vec<u8>> {
        (**self).read_bytes(key)
    }
}

/// 打开 .h5 文件的外部读取器
pub type H5Opener = Arc<dyn Fn(&Path) -> Result<Box<dyn DatasetSource + Send>> + Send + Sync>;

/// 内存中的数据集（测试和已解码的数据）
#[derive(Clone, Debug, Default)]
pub struct InMemoryDatasets {
    numeric: HashMap<String, (Vec<usize>, Vec<f64>)>,
    bytes: HashMap<String, Vec<u8>>,
}

impl InMemoryDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_f64(&mut self, key: impl Into<String>, shape: Vec<usize>, values: Vec<f64>) {
        self.numeric.insert(key.into(), (shape, values));
    }

    pub fn insert_bytes(&mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.bytes.insert(key.into(), bytes.into());
    }

    fn missing(key: &str) -> SmplError {
        SmplError::DataRead(format!("dataset {key} not found"))
    }
}

impl DatasetSource for InMemoryDatasets {
    fn shape(&self, key: &str) -> Result<Vec<usize>> {
        if let Some((shape, _)) = self.numeric.get(key) {
            return Ok(shape.clone());
        }
        self.bytes
            .get(key)
            .map(|b| vec![b.len()])
            .ok_or_else(|| Self::missing(key))
    }

    fn read_f64(&self, key: &str) -> Result<Vec<f64>> {
        self.numeric
            .get(key)
            .map(|(_, values)| values.clone())
            .ok_or_else(|| Self::missing(key))
    }

    fn read_bytes(&self, key: &str) -> Result<Vec<u8>> {
        self.bytes.get(key).cloned().ok_or_else(|| Self::missing(key))
    }
}

/// H5 动画解析
///
/// 平移按 `frame * 3` 展平，姿态为轴角向量，按 `frame * joints * 3 + joint * 3` 展平。
pub struct AnimationH5Parser<S: DatasetSource> {
    source: S,
}

impl<S: DatasetSource> AnimationH5Parser<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn read_betas(&self, model: &ModelDefinition) -> Result<Vec<f32>> {
        let values = self.source.read_f64(&model.h5_keys.betas)?;
        if values.len() < model.body_shape_beta_count {
            return Err(SmplError::DataShape(format!(
                "{} betas, model {} expects {}",
                values.len(),
                model.model_name,
                model.body_shape_beta_count
            )));
        }
        Ok(values[..model.body_shape_beta_count]
            .iter()
            .map(|&b| b as f32)
            .collect())
    }

    fn read_gender(&self, model: &ModelDefinition) -> Result<Gender> {
        let keys = &model.h5_keys;
        let bytes = self.source.read_bytes(&keys.gender)?;
        let raw: String = bytes
            .iter()
            .take(MAX_GENDER_STRING_LENGTH)
            .map(|&b| b as char)
            .collect();
        if raw.trim().is_empty() {
            log::error!(
                "H5 gender string not read successfully. key:{}, readBytes Length: {}, readstring: empty",
                keys.gender,
                bytes.len()
            );
        }

        let sanitized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-')
            .collect();
        keys.parse_gender(&sanitized).ok_or_else(|| {
            SmplError::DataRead(format!("Unexpected value for gender ({sanitized})"))
        })
    }

    fn read_fps(&self, model: &ModelDefinition) -> Result<u32> {
        let values = self.source.read_f64(&model.h5_keys.fps)?;
        Ok(match values.first() {
            Some(&fps) if fps > 0.0 => fps.round() as u32,
            _ => 0,
        })
    }

    fn read_frames(&self, model: &ModelDefinition) -> Result<(Vec<Vec3>, Vec<Vec<Quat>>)> {
        let keys = &model.h5_keys;
        let frame_count = self
            .source
            .shape(&keys.translations)?
            .first()
            .copied()
            .unwrap_or(0);
        let joint_count = model.joint_count;

        let translations = self.source.read_f64(&keys.translations)?;
        let poses = self.source.read_f64(&keys.poses)?;
        if translations.len() < frame_count * 3 {
            return Err(SmplError::DataShape(format!(
                "{} translation values for {frame_count} frames",
                translations.len()
            )));
        }
        if poses.len() < frame_count * joint_count * 3 {
            return Err(SmplError::DataShape(format!(
                "{} pose values for {frame_count} frames of {joint_count} joints",
                poses.len()
            )));
        }

        let vec3_at = |values: &[f64], i: usize| {
            Vec3::new(values[i] as f32, values[i + 1] as f32, values[i + 2] as f32)
        };

        let translations = (0..frame_count)
            .map(|frame| point_to_engine(vec3_at(&translations, frame * 3)))
            .collect();
        let poses = (0..frame_count)
            .map(|frame| {
                (0..joint_count)
                    .map(|joint| {
                        let rotation = vec3_at(&poses, frame * joint_count * 3 + joint * 3);
                        quat_to_engine(rotation_vector_to_quat(rotation))
                    })
                    .collect()
            })
            .collect();
        Ok((translations, poses))
    }
}

impl<S: DatasetSource> AnimationSource for AnimationH5Parser<S> {
    fn is_matching_model(&self, model: &ModelDefinition) -> bool {
        self.source
            .read_f64(&model.h5_keys.betas)
            .map(|betas| betas.len() == model.body_shape_beta_count)
            .unwrap_or(false)
    }

    fn format_data(&self, model: Arc<ModelDefinition>) -> Result<AnimationData> {
        let betas = self.read_betas(&model)?;
        let gender = self.read_gender(&model)?;
        let fps = self.read_fps(&model)?;
        let (translations, poses) = self.read_frames(&model)?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::f32::consts::FRAC_PI_2;

    fn datasets(gender: &[u8]) -> InMemoryDatasets {
        let mut sets = InMemoryDatasets::new();
        sets.insert_bytes("gender", gender);
        sets.insert_f64("mocap_framerate", vec![1], vec![59.94]);
        sets.insert_f64("betas", vec![2], vec![0.1, 0.2]);
        sets.insert_f64("trans", vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut poses = vec![0.0; 2 * 4 * 3];
        // 第 1 帧、第 2 个关节绕 Z 轴 90 度
        poses[4 * 3 + 2 * 3 + 2] = FRAC_PI_2 as f64;
        sets.insert_f64("poses", vec![2, 12], poses);
        sets
    }

    #[test]
    fn test_format_data() {
        let model = Arc::new(fixtures::model_definition());
        let parser = AnimationH5Parser::new(datasets(b"female\0\0\0"));
        assert!(parser.is_matching_model(&model));

        let data = parser.format_data(model).unwrap();
        assert_eq!(data.gender, Gender::Female);
        assert_eq!(data.fps, 60);
        assert_eq!(data.frame_count, 2);
        assert_eq!(data.translations[1], Vec3::new(-4.0, 5.0, 6.0));
        assert_eq!(data.poses[0][0], quat_to_engine(Quat::IDENTITY));

        let expected = quat_to_engine(Quat::from_rotation_z(FRAC_PI_2));
        assert!(data.poses[1][2].dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_gender_bytes_are_sanitised() {
        let model = Arc::new(fixtures::model_definition());
        let parser = AnimationH5Parser::new(datasets(b"\"male\"\n"));
        assert_eq!(parser.format_data(model).unwrap().gender, Gender::Male);
    }

    #[test]
    fn test_unknown_gender() {
        let model = Arc::new(fixtures::model_definition());
        let parser = AnimationH5Parser::new(datasets(b"unknown"));
        assert!(matches!(parser.format_data(model), Err(SmplError::DataRead(_))));
    }

    #[test]
    fn test_truncated_poses() {
        let model = Arc::new(fixtures::model_definition());
        let mut sets = datasets(b"male");
        sets.insert_f64("poses", vec![2, 3], vec![0.0; 6]);
        let parser = AnimationH5Parser::new(sets);
        assert!(matches!(parser.format_data(model), Err(SmplError::DataShape(_))));
    }
}
