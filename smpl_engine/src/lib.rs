//! SMPL Engine - SMPL/MoSh 人体动画运行时
//!
//! 提供以下功能：
//! - 基于 beta 参数的关节回归与体型个性化
//! - 网格蒙皮偏移校正与体型混合形状
//! - 逐帧姿态解析、姿态相关混合形状与落地处理
//! - 与源帧率无关的重采样播放
//! - JSON / 列式（H5）动画文件加载与动画组序列播放

pub mod animation;
pub mod blendshape;
pub mod body;
pub mod character;
pub mod config;
pub mod loader;
pub mod model;
pub mod pose;
pub mod sequencer;
pub mod skeleton;
pub mod skinning;
pub mod space;

#[cfg(test)]
pub(crate) mod fixtures;

pub use animation::{AnimationData, AnimationInstance, Playback, ResampledFrame};
pub use body::{BodyShaper, JointRegressor, MeshCorrection};
pub use character::{Character, SmplCharacter, TemplateLibrary};
pub use model::{BodyModel, Gender, ModelDefinition, ModelRegistry};
pub use pose::{CharacterTranslator, Grounder, GroundingContext, PoseResolver};
pub use sequencer::{AnimationPlayer, AnimationSequencer};
pub use skeleton::{Bone, JointMap, Skeleton};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmplError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Data read error: {0}")]
    DataRead(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File {file} not found in folder {folder}")]
    FileMissing { file: String, folder: String },

    #[error("Could not match animation to a model: {0}")]
    NoMatchingModel(String),

    #[error("Regressor file missing: {}", .0.display())]
    RegressorMissing(PathBuf),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Bone Not in dictionary: boneIndex: {bone_index}, name: {name}")]
    BoneNotInJointMap { bone_index: usize, name: String },

    #[error("Character {name}: {source}")]
    Character {
        name: String,
        #[source]
        source: Box<SmplError>,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Loading cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SmplError>;
