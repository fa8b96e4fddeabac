//! 关节回归器
//!
//! 由体型参数（betas）预测关节位置：
//!
//! ```text
//! J = J_template + J_regressor · betas
//! ```
//!
//! 其中 `J_template` 为 `[关节数, 3]`，`J_regressor` 为 `[关节数, 3, beta 数]`。
//! 三个坐标轴分别计算，结果最后统一转换到引擎坐标系。

use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::model::ModelDefinition;
use crate::space::point_to_engine;
use crate::{Result, SmplError};

#[derive(Deserialize)]
struct RegressorFile {
    joint_template: Vec<[f64; 3]>,
    joint_regressor: Vec<[Vec<f64>; 3]>,
}

/// 关节回归器（无内部状态，可在任意线程调用）
#[derive(Clone, Debug)]
pub struct JointRegressor {
    joint_count: usize,
    beta_count: usize,
    /// 每个轴一个 `关节数 × beta 数` 的行优先矩阵
    matrices: [Vec<f64>; 3],
    /// 每个轴一列模板位置（源坐标系）
    template: [Vec<f64>; 3],
}

impl JointRegressor {
    /// 从模板与回归矩阵构建，形状在此校验
    pub fn new(template: &[[f64; 3]], regressor: &[[Vec<f64>; 3]]) -> Result<Self> {
        let joint_count = template.len();
        if regressor.len() != joint_count {
            return Err(SmplError::DataShape(format!(
                "regressor has {} joints, template has {}",
                regressor.len(),
                joint_count
            )));
        }
        let beta_count = regressor.first().map(|r| r[0].len()).unwrap_or(0);

        let mut matrices: [Vec<f64>; 3] = Default::default();
        let mut columns: [Vec<f64>; 3] = Default::default();
        for axis in 0..3 {
            matrices[axis].reserve(joint_count * beta_count);
            columns[axis].reserve(joint_count);
        }

        for (joint, (position, rows)) in template.iter().zip(regressor).enumerate() {
            for axis in 0..3 {
                if rows[axis].len() != beta_count {
                    return Err(SmplError::DataShape(format!(
                        "regressor joint {joint} axis {axis}: {} betas, expected {beta_count}",
                        rows[axis].len()
                    )));
                }
                matrices[axis].extend_from_slice(&rows[axis]);
                columns[axis].push(position[axis]);
            }
        }

        Ok(Self {
            joint_count,
            beta_count,
            matrices,
            template: columns,
        })
    }

    /// 解析 JSON：`{"joint_template": [...], "joint_regressor": [...]}`
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: RegressorFile = serde_json::from_str(text)?;
        Self::new(&file.joint_template, &file.joint_regressor)
    }

    /// 从文件加载；文件缺失时返回 RegressorMissing
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SmplError::RegressorMissing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let regressor = Self::from_json_str(&text)?;
        log::debug!(
            "Joint regressor loaded from {} ({} joints x {} betas)",
            path.display(),
            regressor.joint_count,
            regressor.beta_count
        );
        Ok(regressor)
    }

    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    pub fn beta_count(&self) -> usize {
        self.beta_count
    }

    /// 由 betas 计算关节位置（引擎坐标系）
    pub fn joint_positions(&self, model: &ModelDefinition, betas: &[f32]) -> Result<Vec<Vec3>> {
        if betas.len() != model.body_shape_beta_count || betas.len() != self.beta_count {
            return Err(SmplError::DataShape(format!(
                "{} betas given, model {} expects {} (regressor has {})",
                betas.len(),
                model.model_name,
                model.body_shape_beta_count,
                self.beta_count
            )));
        }
        if model.joint_count != self.joint_count {
            return Err(SmplError::DataShape(format!(
                "model {} has {} joints, regressor has {}",
                model.model_name, model.joint_count, self.joint_count
            )));
        }

        let positions = (0..self.joint_count)
            .map(|joint| {
                let mut p = [0.0f32; 3];
                for (axis, value) in p.iter_mut().enumerate() {
                    *value = self.axis_value(axis, joint, betas) as f32;
                }
                point_to_engine(Vec3::from_array(p))
            })
            .collect();
        Ok(positions)
    }

    /// 单轴：回归矩阵的一行点乘 betas，再加模板
    fn axis_value(&self, axis: usize, joint: usize, betas: &[f32]) -> f64 {
        let row = &self.matrices[axis][joint * self.beta_count..(joint + 1) * self.beta_count];
        let dot: f64 = row
            .iter()
            .zip(betas)
            .map(|(r, b)| r * f64::from(*b))
            .sum();
        self.template[axis][joint] + dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn scenario_model() -> ModelDefinition {
        let mut model = fixtures::model_definition();
        model.joint_count = 24;
        model.body_shape_beta_count = 10;
        model
    }

    fn scenario_regressor() -> JointRegressor {
        let mut template = vec![[0.0; 3]; 24];
        template[1] = [0.0, 1.0, 0.0];
        template[2] = [0.5, 0.2, -0.3];
        let regressor: Vec<[Vec<f64>; 3]> = (0..24)
            .map(|j| {
                [
                    (0..10).map(|b| 0.01 * (j + b) as f64).collect(),
                    (0..10).map(|b| if b == 0 { 0.1 } else { 0.0 }).collect(),
                    vec![0.0; 10],
                ]
            })
            .collect();
        JointRegressor::new(&template, &regressor).unwrap()
    }

    #[test]
    fn test_zero_betas_give_converted_template() {
        let model = scenario_model();
        let joints = scenario_regressor()
            .joint_positions(&model, &[0.0; 10])
            .unwrap();
        assert_eq!(joints.len(), 24);
        assert_eq!(joints[0], Vec3::ZERO);
        assert_eq!(joints[1], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(joints[2], Vec3::new(-0.5, 0.2, -0.3));
    }

    #[test]
    fn test_linear_in_betas() {
        let model = scenario_model();
        let regressor = scenario_regressor();
        let zero = regressor.joint_positions(&model, &[0.0; 10]).unwrap();
        let mut b1 = [0.0f32; 10];
        b1[0] = 1.0;
        b1[3] = -2.0;
        let mut b2 = b1;
        for b in &mut b2 {
            *b *= 2.0;
        }
        let p1 = regressor.joint_positions(&model, &b1).unwrap();
        let p2 = regressor.joint_positions(&model, &b2).unwrap();
        for j in 0..24 {
            let d1 = p1[j] - zero[j];
            let d2 = p2[j] - zero[j];
            assert!((d2 - d1 * 2.0).length() < 1e-5);
        }
        // Y 轴系数 0.1 作用于 beta0
        assert!((p1[5].y - zero[5].y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_beta_count_is_data_shape_error() {
        let model = scenario_model();
        let err = scenario_regressor().joint_positions(&model, &[0.0; 9]);
        assert!(matches!(err, Err(SmplError::DataShape(_))));
    }

    #[test]
    fn test_from_json_str_checks_shape() {
        let ok = r#"{"joint_template": [[0,0,0],[1,2,3]],
                     "joint_regressor": [[[1,0],[0,1],[0,0]], [[0,0],[0,0],[1,1]]]}"#;
        let regressor = JointRegressor::from_json_str(ok).unwrap();
        assert_eq!(regressor.joint_count(), 2);
        assert_eq!(regressor.beta_count(), 2);

        let ragged = r#"{"joint_template": [[0,0,0]],
                         "joint_regressor": [[[1,0],[0],[0,0]]]}"#;
        assert!(matches!(
            JointRegressor::from_json_str(ragged),
            Err(SmplError::DataShape(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("smpl_engine_missing_regressor.json");
        assert!(matches!(
            JointRegressor::load(&path),
            Err(SmplError::RegressorMissing(_))
        ));
    }
}
