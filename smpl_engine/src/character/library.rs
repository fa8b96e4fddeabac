//! 人体模板缓存

use std::collections::HashMap;
use std::sync::Arc;

use super::SmplCharacter;
use crate::animation::LoadedAnimation;
use crate::body::{JointRegressor, MeshCorrection};
use crate::config::{BodyOptions, DisplaySettings, PlaybackSettings};
use crate::model::{load_body_template, BodyModel, Gender, ModelDefinition};
use crate::{Result, SmplError};

/// 某个模型 + 性别的模板 rig 与关节回归器
#[derive(Clone, Debug)]
pub struct CharacterTemplate {
    pub rig: BodyModel,
    pub correction: MeshCorrection,
    pub regressor: Arc<JointRegressor>,
}

/// 模板库
///
/// 每个 (模型名, 性别) 只从磁盘加载一次，创建角色时深拷贝 rig。
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: HashMap<(String, Gender), Arc<CharacterTemplate>>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接注册模板（不经过文件）
    pub fn insert(&mut self, model_name: impl Into<String>, gender: Gender, template: CharacterTemplate) {
        self.templates
            .insert((model_name.into(), gender), Arc::new(template));
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// 取模板，缓存中没有时从模型定义指向的文件加载
    pub fn template(&mut self, model: &ModelDefinition, gender: Gender) -> Result<Arc<CharacterTemplate>> {
        let key = (model.model_name.clone(), gender);
        if let Some(template) = self.templates.get(&key) {
            return Ok(Arc::clone(template));
        }

        let (rig, correction) = load_body_template(model.template_file(gender))?;
        let regressor = JointRegressor::load(model.regressor_file(gender))?;
        if regressor.joint_count() != model.joint_count || regressor.beta_count() != model.body_shape_beta_count {
            return Err(SmplError::DataShape(format!(
                "regressor for {} {gender} has {} joints / {} betas, model expects {} / {}",
                model.model_name,
                regressor.joint_count(),
                regressor.beta_count(),
                model.joint_count,
                model.body_shape_beta_count
            )));
        }
        log::info!(
            "Loaded {} {gender} template ({} vertices, {} bones)",
            model.model_name,
            rig.vertex_count(),
            rig.bone_count()
        );

        let template = Arc::new(CharacterTemplate {
            rig,
            correction,
            regressor: Arc::new(regressor),
        });
        self.templates.insert(key, Arc::clone(&template));
        Ok(template)
    }

    /// 为动画创建一个新角色
    pub fn create_character(
        &mut self,
        animation: &LoadedAnimation,
        index: usize,
        body_options: &BodyOptions,
        display: &DisplaySettings,
        playback: &PlaybackSettings,
    ) -> Result<SmplCharacter> {
        let data = &animation.data;
        let template = self.template(&data.model, data.gender)?;
        Ok(SmplCharacter::new(
            animation.name.clone(),
            index,
            Arc::clone(&data.model),
            data.gender,
            template.rig.clone(),
            Arc::clone(&template.regressor),
            template.correction,
            body_options.clone(),
            display.clone(),
            playback.clone(),
        ))
    }
}
