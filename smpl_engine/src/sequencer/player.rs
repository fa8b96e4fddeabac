//! 动画组播放器

use crate::animation::{EventDispatcher, LoadedAnimation};
use crate::character::{Character, SmplCharacter, TemplateLibrary, TickContext};
use crate::config::{BodyOptions, DisplaySettings, PlaybackSettings};
use crate::pose::GroundingContext;
use crate::{Result, SmplError};

/// 同时播放一组动画，每个动画一个角色
pub struct AnimationPlayer {
    library: TemplateLibrary,
    characters: Vec<SmplCharacter>,
}

impl AnimationPlayer {
    pub fn new(library: TemplateLibrary) -> Self {
        Self {
            library,
            characters: Vec::new(),
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut TemplateLibrary {
        &mut self.library
    }

    pub fn characters(&self) -> &[SmplCharacter] {
        &self.characters
    }

    pub fn characters_mut(&mut self) -> &mut [SmplCharacter] {
        &mut self.characters
    }

    /// 没有正在播放的角色
    pub fn is_idle(&self) -> bool {
        self.characters.is_empty()
    }

    /// 为组内每个动画创建角色并启动，返回成功启动的数量
    ///
    /// 单个角色失败只记录日志，不影响同组其他角色。
    pub fn play_set(
        &mut self,
        group: &[LoadedAnimation],
        body_options: &BodyOptions,
        display: &DisplaySettings,
        ctx: &mut TickContext<'_>,
    ) -> usize {
        let mut characters = Vec::with_capacity(group.len());
        for (index, animation) in group.iter().enumerate() {
            let mut character =
                match self
                    .library
                    .create_character(animation, index, body_options, display, ctx.playback)
                {
                    Ok(character) => character,
                    Err(e) => {
                        log::error!("Could not create character for {}: {}", animation.name, e);
                        continue;
                    }
                };
            if let Err(e) = character.start_animation(animation, ctx) {
                log::error!("Could not start {}: {}", animation.name, e);
                character.interrupt_animation(ctx.events);
                continue;
            }
            characters.push(character);
        }
        self.characters = characters;
        self.characters.len()
    }

    /// 播放单个动画
    pub fn play_single(
        &mut self,
        animation: &LoadedAnimation,
        body_options: &BodyOptions,
        display: &DisplaySettings,
        ctx: &mut TickContext<'_>,
    ) -> usize {
        self.play_set(std::slice::from_ref(animation), body_options, display, ctx)
    }

    /// 中断所有角色
    pub fn stop_current_animations(&mut self, events: &EventDispatcher) {
        for character in &mut self.characters {
            character.interrupt_animation(events);
        }
        self.characters.clear();
    }

    /// 推进所有角色，移除已结束的
    ///
    /// 更新失败的角色被停止，其余角色照常推进；返回第一个错误。
    pub fn update(&mut self, dt: f32, ctx: &mut TickContext<'_>) -> Result<()> {
        let mut first_error = None;
        for character in &mut self.characters {
            if let Err(e) = character.update(dt, ctx) {
                log::error!("{}: update failed, stopping: {}", character.name(), e);
                character.interrupt_animation(ctx.events);
                first_error.get_or_insert(SmplError::Character {
                    name: character.name().to_string(),
                    source: Box::new(e),
                });
            }
        }
        self.characters.retain(|c| !c.is_finished());
        first_error.map_or(Ok(()), Err)
    }

    pub fn set_body_options(&mut self, options: &BodyOptions) {
        for character in &mut self.characters {
            character.set_body_options(options.clone());
        }
    }

    pub fn set_display_settings(&mut self, display: &DisplaySettings) {
        for character in &mut self.characters {
            character.set_display_settings(display.clone());
        }
    }

    pub fn set_playback_settings(&mut self, playback: &PlaybackSettings) {
        for character in &mut self.characters {
            character.set_playback_settings(playback.clone());
        }
    }

    /// 落地策略变化后重新摆放所有角色
    pub fn grounding_changed(&mut self, grounding: &GroundingContext) {
        for character in &mut self.characters {
            character.grounding_changed(grounding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{PlaybackControls, PlaybackEvent};
    use crate::fixtures;
    use crate::model::Gender;
    use std::sync::Arc;

    #[test]
    fn test_play_set_skips_failed_characters() {
        let controls = PlaybackControls::default();
        let playback = PlaybackSettings::default();
        let mut grounding = GroundingContext::new();
        let events = EventDispatcher::default();
        let mut ctx = TickContext {
            controls: &controls,
            playback: &playback,
            grounding: &mut grounding,
            events: &events,
        };

        // 模板库只有男性模板
        let mut female = fixtures::animation_data(4, 10);
        female.gender = Gender::Female;
        let group = vec![
            LoadedAnimation::new("male", fixtures::animation_data(4, 10)),
            LoadedAnimation::new("female", female),
        ];

        let mut player = AnimationPlayer::new(fixtures::template_library());
        let started = player.play_set(
            &group,
            &BodyOptions::default(),
            &DisplaySettings::default(),
            &mut ctx,
        );
        assert_eq!(started, 1);
        assert_eq!(player.characters()[0].name(), "male");
    }

    #[test]
    fn test_finished_characters_are_dropped() {
        let controls = PlaybackControls::default();
        let playback = PlaybackSettings::default();
        let mut grounding = GroundingContext::new();
        let events = EventDispatcher::default();
        let mut ctx = TickContext {
            controls: &controls,
            playback: &playback,
            grounding: &mut grounding,
            events: &events,
        };

        let short = LoadedAnimation::new("short", fixtures::animation_data(2, 10));
        let long = LoadedAnimation::new("long", fixtures::animation_data(20, 10));
        let mut player = AnimationPlayer::new(fixtures::template_library());
        player.play_set(
            &[short, long],
            &BodyOptions::default(),
            &DisplaySettings::default(),
            &mut ctx,
        );
        for _ in 0..4 {
            player.update(0.1, &mut ctx).unwrap();
        }
        assert_eq!(player.characters().len(), 1);
        assert_eq!(player.characters()[0].name(), "long");
    }

    #[test]
    fn test_common_ground_comes_from_first_character() {
        let controls = PlaybackControls::default();
        let playback = PlaybackSettings::default();
        let mut grounding = GroundingContext::new();
        let events = EventDispatcher::default();
        let mut ctx = TickContext {
            controls: &controls,
            playback: &playback,
            grounding: &mut grounding,
            events: &events,
        };

        let mut raised = fixtures::animation_data(4, 10);
        for t in &mut raised.translations {
            t.y = 0.5;
        }
        let group = vec![
            LoadedAnimation::new("floor", fixtures::animation_data(4, 10)),
            LoadedAnimation::new("raised", raised),
        ];
        let mut player = AnimationPlayer::new(fixtures::template_library());
        player.play_set(&group, &BodyOptions::default(), &DisplaySettings::default(), &mut ctx);

        let first = player.characters()[0].grounder().individual_offset;
        let second = player.characters()[1].grounder().individual_offset;
        assert!((first - second).abs() > 0.1);
        assert_eq!(ctx.grounding.common(), Some(first));
    }

    #[test]
    fn test_update_error_is_returned_and_character_stopped() {
        let controls = PlaybackControls::default();
        let playback = PlaybackSettings::default();
        let mut grounding = GroundingContext::new();
        let events = EventDispatcher::default();
        let mut ctx = TickContext {
            controls: &controls,
            playback: &playback,
            grounding: &mut grounding,
            events: &events,
        };

        // 第 1 帧只有 2 个关节
        let mut broken = fixtures::animation_data(4, 10);
        broken.poses[1].truncate(2);
        let group = vec![
            LoadedAnimation::new("broken", broken),
            LoadedAnimation::new("fine", fixtures::animation_data(4, 10)),
        ];
        let mut player = AnimationPlayer::new(fixtures::template_library());
        assert_eq!(
            player.play_set(&group, &BodyOptions::default(), &DisplaySettings::default(), &mut ctx),
            2
        );

        let err = player.update(0.1, &mut ctx).unwrap_err();
        assert!(matches!(
            &err,
            SmplError::Character { name, source }
                if name == "broken" && matches!(**source, SmplError::DataShape(_))
        ));
        assert_eq!(player.characters().len(), 1);
        assert_eq!(player.characters()[0].name(), "fine");
    }

    #[test]
    fn test_stop_interrupts_everything() {
        let controls = PlaybackControls::default();
        let playback = PlaybackSettings::default();
        let mut grounding = GroundingContext::new();
        let events = EventDispatcher::default();
        let mut rx = events.subscribe();
        let mut ctx = TickContext {
            controls: &controls,
            playback: &playback,
            grounding: &mut grounding,
            events: &events,
        };

        let data = Arc::new(fixtures::animation_data(10, 10));
        let group: Vec<_> = (0..3)
            .map(|i| LoadedAnimation {
                name: format!("clip{i}"),
                data: Arc::clone(&data),
            })
            .collect();
        let mut player = AnimationPlayer::new(fixtures::template_library());
        player.play_set(&group, &BodyOptions::default(), &DisplaySettings::default(), &mut ctx);
        player.stop_current_animations(&events);
        assert!(player.is_idle());

        let ended = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, PlaybackEvent::AnimationEnded { .. }))
            .count();
        assert_eq!(ended, 3);
    }
}
