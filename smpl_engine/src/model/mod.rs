//! 人体模型定义与运行时 rig

mod definition;
mod loader;
mod registry;
mod runtime;

pub use definition::{GenderFiles, ModelDefinition, ModelKeys};
pub use loader::{load_body_template, parse_body_template};
pub use registry::ModelRegistry;
pub use runtime::BodyModel;

use serde::{Deserialize, Serialize};
use std::fmt;

/// 性别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// 模型顶点骨骼权重
#[derive(Clone, Debug, PartialEq)]
pub enum VertexWeight {
    One { bone: i32 },
    Two { bones: [i32; 2], weight: f32 },
    Four { bones: [i32; 4], weights: [f32; 4] },
}

impl Default for VertexWeight {
    fn default() -> Self {
        VertexWeight::One { bone: 0 }
    }
}
