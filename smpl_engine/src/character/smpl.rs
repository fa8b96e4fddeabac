//! SMPL 角色

use glam::Quat;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use super::{Character, CharacterEvents, TickContext};
use crate::animation::{AnimationInstance, EventDispatcher, LoadedAnimation};
use crate::body::{BodyShaper, JointRegressor, MeshCorrection};
use crate::config::{BodyOptions, DisplaySettings, PlaybackSettings};
use crate::model::{BodyModel, Gender, ModelDefinition};
use crate::pose::{CharacterTranslator, Grounder, GroundingContext, PoseResolver};
use crate::Result;

/// SMPL 角色
///
/// 持有自己的 rig 深拷贝，不同角色之间不共享顶点缓冲。
pub struct SmplCharacter {
    name: String,
    model: Arc<ModelDefinition>,
    gender: Gender,
    rig: BodyModel,

    shaper: BodyShaper,
    resolver: PoseResolver,
    translator: CharacterTranslator,
    grounder: Grounder,

    body_options: BodyOptions,
    display: DisplaySettings,
    instance: Option<AnimationInstance>,
    events: CharacterEvents,
    finished: bool,
}

impl SmplCharacter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        index: usize,
        model: Arc<ModelDefinition>,
        gender: Gender,
        mut rig: BodyModel,
        regressor: Arc<JointRegressor>,
        correction: MeshCorrection,
        body_options: BodyOptions,
        display: DisplaySettings,
        playback: PlaybackSettings,
    ) -> Self {
        let shaper = BodyShaper::new(&mut rig, &model, regressor, correction);
        let resolver = PoseResolver::new(&model);
        Self {
            name: name.into(),
            gender,
            rig,
            shaper,
            resolver,
            translator: CharacterTranslator::new(index, playback),
            grounder: Grounder::new(),
            body_options,
            display,
            instance: None,
            events: CharacterEvents::default(),
            finished: false,
            model,
        }
    }

    pub fn set_body_options(&mut self, options: BodyOptions) {
        self.body_options = options;
    }

    pub fn set_display_settings(&mut self, display: DisplaySettings) {
        self.display = display;
    }

    pub fn set_playback_settings(&mut self, playback: PlaybackSettings) {
        self.translator.set_playback_settings(playback);
    }

    /// 落地策略变化后立即重新摆放
    pub fn grounding_changed(&mut self, grounding: &GroundingContext) {
        self.translator
            .grounding_changed(&mut self.rig, &self.grounder, &self.body_options, grounding);
    }

    pub fn set_custom_ground_offset(&mut self, offset: f32) {
        self.grounder.custom_offset = offset;
    }

    pub fn grounder(&self) -> &Grounder {
        &self.grounder
    }

    pub fn shaper(&self) -> &BodyShaper {
        &self.shaper
    }

    pub fn instance(&self) -> Option<&AnimationInstance> {
        self.instance.as_ref()
    }

    /// 演示体型
    pub fn set_debug_betas(&mut self, grounding: &mut GroundingContext) -> Result<()> {
        let changed = self.shaper.set_debug_betas(&mut self.rig, &self.model, self.gender)?;
        self.body_options.show_individualized_body = true;
        if changed {
            self.body_changed(grounding);
        }
        Ok(())
    }

    /// 体型变化：公共落地偏移失效，下一帧重新计算个体偏移
    fn body_changed(&mut self, grounding: &mut GroundingContext) {
        self.events.body_changed_count += 1;
        grounding.reset();
        self.translator.notify_body_changed();
    }

    fn stop(&mut self) {
        if !self.finished {
            log::info!("\t{}'s Animation Complete", self.name);
        }
        self.finished = true;
    }
}

impl Character for SmplCharacter {
    fn name(&self) -> &str {
        &self.name
    }

    fn rig(&self) -> &BodyModel {
        &self.rig
    }

    fn model(&self) -> &ModelDefinition {
        &self.model
    }

    fn gender(&self) -> Gender {
        self.gender
    }

    fn body_options(&self) -> &BodyOptions {
        &self.body_options
    }

    fn display_settings(&self) -> &DisplaySettings {
        &self.display
    }

    fn events(&self) -> &CharacterEvents {
        &self.events
    }

    fn set_index(&mut self, index: usize) {
        self.translator.set_index(index);
    }

    fn start_animation(&mut self, animation: &LoadedAnimation, ctx: &mut TickContext<'_>) -> Result<()> {
        self.instance = Some(animation.instantiate(ctx.playback));
        self.finished = false;
        self.translator.set_playback_settings(ctx.playback.clone());

        if self.model.rotate_to_engine_coords {
            let rotation = self.rig.root_rotation() * Quat::from_rotation_x(-FRAC_PI_2);
            self.rig.set_root_rotation(rotation);
        }

        let changed = self.shaper.reshape(
            &mut self.rig,
            &self.model,
            &animation.data.betas,
            self.body_options.show_individualized_body,
        )?;
        if changed {
            // 首帧会重新计算落地，公共偏移保留给先建立它的角色
            self.events.body_changed_count += 1;
            self.translator.notify_body_changed();
        }

        self.update(0.0, ctx)
    }

    fn update(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let Some(instance) = self.instance.as_mut() else {
            return Ok(());
        };
        let Some(sample) = instance.play_current_frame(dt, ctx.controls, ctx.playback, ctx.events) else {
            self.stop();
            return Ok(());
        };

        if sample.first_frame {
            self.translator.notify_first_frame();
        }
        self.resolver.set_poses(sample.poses);
        self.translator.set_translation(sample.translation);

        let changed = self
            .resolver
            .update(&mut self.rig, &mut self.shaper, &self.model, &self.body_options)?;
        if changed {
            self.body_changed(ctx.grounding);
        }

        self.translator
            .update(&mut self.rig, &mut self.grounder, &self.body_options, ctx.grounding);
        self.events.last_ground_offset = self.grounder.individual_offset;
        Ok(())
    }

    fn interrupt_animation(&mut self, events: &EventDispatcher) {
        if let Some(instance) = self.instance.as_mut() {
            instance.end(events);
        }
        log::debug!("{}'s Animation Interrupted", self.name);
        self.finished = true;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
