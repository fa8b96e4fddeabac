//! 按文件类型选择解析器并匹配人体模型

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{AnimationH5Parser, AnimationJsonParser, H5Opener};
use crate::animation::AnimationData;
use crate::model::{ModelDefinition, ModelRegistry};
use crate::{Result, SmplError};

/// 一种动画文件格式
pub trait AnimationSource {
    /// 文件内容是否属于该模型（按 beta 数量判断）
    fn is_matching_model(&self, model: &ModelDefinition) -> bool;

    /// 按模型的字段名读取并转换到引擎坐标系
    fn format_data(&self, model: Arc<ModelDefinition>) -> Result<AnimationData>;
}

/// 支持的文件类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Json,
    H5,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(FileKind::Json),
            Some("h5") => Ok(FileKind::H5),
            other => Err(SmplError::UnsupportedFileType(format!(
                "Extension .{} is unsupported",
                other.unwrap_or("")
            ))),
        }
    }
}

/// 注册表中第一个匹配的模型
pub fn find_matching_model(
    source: &dyn AnimationSource,
    registry: &ModelRegistry,
) -> Result<Arc<ModelDefinition>> {
    registry
        .models()
        .iter()
        .find(|model| source.is_matching_model(model))
        .cloned()
        .ok_or_else(|| {
            SmplError::NoMatchingModel(format!(
                "none of {} model(s) has a matching beta count",
                registry.len()
            ))
        })
}

/// 匹配模型后解析
pub fn load_from_source(source: &dyn AnimationSource, registry: &ModelRegistry) -> Result<AnimationData> {
    let model = find_matching_model(source, registry)?;
    source.format_data(model)
}

/// 加载单个动画文件
///
/// `.h5` 文件需要外部读取器，没有时按不支持的类型处理。
pub fn load_animation_file(
    path: &Path,
    registry: &ModelRegistry,
    h5_opener: Option<&H5Opener>,
) -> Result<AnimationData> {
    if !path.is_file() {
        return Err(SmplError::FileMissing {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            folder: path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        });
    }

    match FileKind::from_path(path)? {
        FileKind::Json => {
            let text = fs::read_to_string(path)?;
            let parser = AnimationJsonParser::parse(&text)?;
            load_from_source(&parser, registry)
        }
        FileKind::H5 => {
            let opener = h5_opener.ok_or_else(|| {
                SmplError::UnsupportedFileType(format!(
                    "no h5 reader configured for {}",
                    path.display()
                ))
            })?;
            let parser = AnimationH5Parser::new(opener(path)?);
            load_from_source(&parser, registry)
        }
    }
}
