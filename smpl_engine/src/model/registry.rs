//! 已知人体模型列表

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::ModelDefinition;
use crate::Result;

#[derive(Deserialize)]
struct RegistryFile {
    models: Vec<ModelDefinition>,
}

/// 模型注册表（保持声明顺序，匹配时取第一个）
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载，相对路径以该文件所在目录为根
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let registry = Self::from_json_str(&text, &base)?;
        log::info!(
            "Loaded {} model definition(s) from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn from_json_str(text: &str, base: &Path) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for mut model in file.models {
            model.validate()?;
            model.regressor_files.resolve_against(base);
            model.template_files.resolve_against(base);
            registry.add(model);
        }
        Ok(registry)
    }

    pub fn add(&mut self, model: ModelDefinition) -> Arc<ModelDefinition> {
        let model = Arc::new(model);
        self.models.push(Arc::clone(&model));
        model
    }

    /// 第一个 beta 数量相同的模型
    pub fn match_beta_count(&self, beta_count: usize) -> Option<Arc<ModelDefinition>> {
        self.models
            .iter()
            .find(|m| m.body_shape_beta_count == beta_count)
            .cloned()
    }

    pub fn models(&self) -> &[Arc<ModelDefinition>] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
