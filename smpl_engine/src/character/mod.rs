//! 角色：rig + 体型 + 姿态 + 平移 + 当前动画

mod library;
mod smpl;

pub use library::{CharacterTemplate, TemplateLibrary};
pub use smpl::SmplCharacter;

use crate::animation::{EventDispatcher, LoadedAnimation, PlaybackControls};
use crate::config::{BodyOptions, DisplaySettings, PlaybackSettings};
use crate::model::{BodyModel, Gender, ModelDefinition};
use crate::pose::GroundingContext;
use crate::Result;

/// 每个 tick 所有角色共享的状态
pub struct TickContext<'a> {
    pub controls: &'a PlaybackControls,
    pub playback: &'a PlaybackSettings,
    pub grounding: &'a mut GroundingContext,
    pub events: &'a EventDispatcher,
}

/// 角色事件计数（供显示端与测试读取）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterEvents {
    pub body_changed_count: usize,
    /// 最近一次落地计算后的个体偏移
    pub last_ground_offset: f32,
}

/// 可播放动画的角色
pub trait Character {
    fn name(&self) -> &str;

    /// 蒙皮网格 rig
    fn rig(&self) -> &BodyModel;

    fn model(&self) -> &ModelDefinition;

    fn gender(&self) -> Gender;

    fn body_options(&self) -> &BodyOptions;

    fn display_settings(&self) -> &DisplaySettings;

    fn events(&self) -> &CharacterEvents;

    fn set_index(&mut self, index: usize);

    /// 整形并立即更新第一帧
    fn start_animation(&mut self, animation: &LoadedAnimation, ctx: &mut TickContext<'_>) -> Result<()>;

    /// 每帧更新；动画结束后停止
    fn update(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> Result<()>;

    fn interrupt_animation(&mut self, events: &EventDispatcher);

    fn is_finished(&self) -> bool;
}
