//! 动画组序列

use super::AnimationPlayer;
use crate::animation::{EventDispatcher, LoadedAnimation, PlaybackControls, PlaybackEvent};
use crate::character::{TemplateLibrary, TickContext};
use crate::config::{BodyOptions, DisplaySettings, PlaybackSettings, ViewerConfig};
use crate::pose::GroundingContext;
use crate::Result;

/// 按顺序播放加载好的动画组
///
/// 同一时刻只播放一组；组内所有角色共享播放控制和公共落地偏移。
pub struct AnimationSequencer {
    sequence: Vec<Vec<LoadedAnimation>>,
    index: usize,
    started: bool,

    settings: ViewerConfig,
    controls: PlaybackControls,
    grounding: GroundingContext,
    events: EventDispatcher,
    player: AnimationPlayer,
}

impl AnimationSequencer {
    pub fn new(settings: ViewerConfig, library: TemplateLibrary) -> Self {
        Self::with_events(settings, library, EventDispatcher::default())
    }

    pub fn with_events(settings: ViewerConfig, library: TemplateLibrary, events: EventDispatcher) -> Self {
        Self {
            sequence: Vec::new(),
            index: 0,
            started: false,
            settings,
            controls: PlaybackControls::default(),
            grounding: GroundingContext::new(),
            events,
            player: AnimationPlayer::new(library),
        }
    }

    /// 加载完成：替换当前序列
    ///
    /// `total` 为列表中的行数（含加载失败的行）。
    pub fn set_sequence(&mut self, sequence: Vec<Vec<LoadedAnimation>>, total: usize) {
        self.stop_all();
        self.sequence = sequence;
        self.index = 0;
        self.started = false;

        self.events.send(PlaybackEvent::DoneLoading {
            loaded: self.sequence.len(),
            total,
        });
        if self.settings.playback.offset_multiple_animations {
            log::warn!(
                "Warning, you have selected to offset multiple animations from each other! This could cause unwanted results."
            );
        }
        if self.sequence.is_empty() {
            return;
        }

        if self.settings.playback.playback_immediately {
            self.go_to_next();
        } else {
            let message = "Waiting to start playing... press \"Next\" button to continue";
            log::info!("{message}");
            self.events.send(PlaybackEvent::Progress(message.to_string()));
        }
    }

    /// 下一组；第一次调用播放第 0 组
    pub fn go_to_next(&mut self) {
        if self.sequence.is_empty() {
            return;
        }
        if !self.started {
            self.started = true;
            self.index = 0;
            self.start_current_set();
            return;
        }

        self.stop_all();
        if self.all_animations_complete() {
            return;
        }
        self.index += 1;
        if self.all_animations_complete() {
            let message = "All Animations Complete";
            log::info!("{message}");
            self.events.send(PlaybackEvent::Progress(message.to_string()));
            self.events.send(PlaybackEvent::AllComplete);
            return;
        }
        self.start_current_set();
    }

    /// 上一组；已经在第 0 组时不做任何事
    pub fn go_to_previous(&mut self) {
        if self.sequence.is_empty() {
            return;
        }
        if self.index == 0 {
            return;
        }
        self.started = true;
        self.index = (self.index - 1).min(self.sequence.len() - 1);
        self.stop_all();
        self.start_current_set();
    }

    /// 从第 0 组重新开始
    pub fn restart(&mut self) {
        if self.sequence.is_empty() {
            return;
        }
        log::info!("Restarting All Animations");
        self.started = true;
        self.index = 0;
        self.stop_all();
        self.start_current_set();
    }

    /// 中断所有角色并清空公共落地偏移
    pub fn stop_all(&mut self) {
        self.player.stop_current_animations(&self.events);
        self.grounding.reset();
    }

    pub fn all_animations_complete(&self) -> bool {
        self.index >= self.sequence.len()
    }

    /// 当前组已开始且所有角色都已结束
    pub fn current_set_finished(&self) -> bool {
        self.started && self.player.is_idle()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.controls.toggle_pause()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.controls.set_speed(speed);
    }

    /// 更新人体选项并传给正在播放的角色
    pub fn update_body_options(&mut self, options: BodyOptions) {
        let ground_snap_changed = options.ground_snap != self.settings.body.ground_snap;
        self.player.set_body_options(&options);
        self.settings.body = options;
        if ground_snap_changed {
            self.player.grounding_changed(&self.grounding);
        }
    }

    pub fn update_playback_settings(&mut self, playback: PlaybackSettings) {
        self.player.set_playback_settings(&playback);
        self.settings.playback = playback;
    }

    pub fn update_display_settings(&mut self, display: DisplaySettings) {
        self.player.set_display_settings(&display);
        self.settings.display = display;
    }

    /// 每帧推进；出错的角色已被停止，错误交给调用方
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        let mut ctx = TickContext {
            controls: &self.controls,
            playback: &self.settings.playback,
            grounding: &mut self.grounding,
            events: &self.events,
        };
        self.player.update(dt, &mut ctx)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn settings(&self) -> &ViewerConfig {
        &self.settings
    }

    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    pub fn grounding(&self) -> &GroundingContext {
        &self.grounding
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    fn start_current_set(&mut self) {
        let Some(group) = self.sequence.get(self.index) else {
            return;
        };
        let message = format!(
            "\tPlaying animation set {} of {}. ({} chars)",
            self.index + 1,
            self.sequence.len(),
            group.len()
        );
        log::info!("{message}");
        self.events.send(PlaybackEvent::Progress(message.trim().to_string()));

        let mut ctx = TickContext {
            controls: &self.controls,
            playback: &self.settings.playback,
            grounding: &mut self.grounding,
            events: &self.events,
        };
        let characters = self
            .player
            .play_set(group, &self.settings.body, &self.settings.display, &mut ctx);
        self.events.send(PlaybackEvent::PlayingNewAnimationSet {
            index: self.index,
            total: self.sequence.len(),
            characters,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::fixtures;

    fn sequence(sets: usize) -> Vec<Vec<LoadedAnimation>> {
        (0..sets)
            .map(|i| vec![LoadedAnimation::new(format!("set{i}"), fixtures::animation_data(4, 10))])
            .collect()
    }

    fn sequencer(playback_immediately: bool) -> AnimationSequencer {
        let mut settings = ViewerConfig::default();
        settings.playback.playback_immediately = playback_immediately;
        AnimationSequencer::new(settings, fixtures::template_library())
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_waits_for_next_when_not_immediate() {
        let mut sequencer = sequencer(false);
        let mut rx = sequencer.events().subscribe();
        sequencer.set_sequence(sequence(2), 3);

        assert!(!sequencer.is_started());
        assert!(sequencer.player().is_idle());
        let events = drain(&mut rx);
        assert!(events.contains(&PlaybackEvent::DoneLoading { loaded: 2, total: 3 }));
        assert!(events.iter().any(|e| matches!(e, PlaybackEvent::Progress(m) if m.starts_with("Waiting"))));

        sequencer.go_to_next();
        assert!(sequencer.is_started());
        assert_eq!(sequencer.index(), 0);
        assert_eq!(sequencer.player().characters().len(), 1);
    }

    #[test]
    fn test_runs_through_all_sets() {
        let mut sequencer = sequencer(true);
        let mut rx = sequencer.events().subscribe();
        sequencer.set_sequence(sequence(2), 2);
        assert_eq!(sequencer.index(), 0);

        sequencer.go_to_next();
        assert_eq!(sequencer.index(), 1);
        assert!(!sequencer.all_animations_complete());

        sequencer.go_to_next();
        assert!(sequencer.all_animations_complete());
        assert!(sequencer.player().is_idle());
        assert!(drain(&mut rx).contains(&PlaybackEvent::AllComplete));

        // 已经结束后再按下一组不会越界
        sequencer.go_to_next();
        assert_eq!(sequencer.index(), 2);
    }

    #[test]
    fn test_previous_is_clamped_at_zero() {
        let mut sequencer = sequencer(true);
        sequencer.set_sequence(sequence(3), 3);
        sequencer.go_to_previous();
        assert_eq!(sequencer.index(), 0);

        sequencer.go_to_next();
        sequencer.go_to_next();
        assert_eq!(sequencer.index(), 2);
        sequencer.go_to_previous();
        assert_eq!(sequencer.index(), 1);
        assert_eq!(sequencer.player().characters()[0].name(), "set1");

        sequencer.restart();
        assert_eq!(sequencer.index(), 0);
        assert_eq!(sequencer.player().characters()[0].name(), "set0");
    }

    #[test]
    fn test_tick_until_set_finished() {
        let mut sequencer = sequencer(true);
        sequencer.set_sequence(sequence(1), 1);
        assert!(!sequencer.current_set_finished());
        for _ in 0..10 {
            sequencer.tick(0.1).unwrap();
        }
        assert!(sequencer.current_set_finished());
    }

    #[test]
    fn test_pause_holds_playback() {
        let mut sequencer = sequencer(true);
        sequencer.set_sequence(sequence(1), 1);
        assert!(sequencer.toggle_pause());
        for _ in 0..10 {
            sequencer.tick(0.1).unwrap();
        }
        assert!(!sequencer.current_set_finished());
        let playback = sequencer.player().characters()[0]
            .instance()
            .map(|i| i.playback().elapsed_time());
        assert_eq!(playback, Some(0.0));
    }

    #[test]
    fn test_stop_all_resets_common_ground() {
        let mut sequencer = sequencer(true);
        sequencer.set_sequence(sequence(1), 1);
        assert!(sequencer.grounding().common().is_some());
        sequencer.stop_all();
        assert!(sequencer.grounding().common().is_none());
        assert!(sequencer.player().is_idle());
    }

    #[test]
    fn test_option_updates_reach_characters() {
        let mut sequencer = sequencer(true);
        sequencer.set_sequence(sequence(1), 1);

        let mut options = BodyOptions::default();
        options.update_poses_live = false;
        sequencer.update_body_options(options);
        assert!(!sequencer.player().characters()[0].body_options().update_poses_live);
        assert!(!sequencer.settings().body.update_poses_live);

        let mut playback = PlaybackSettings::default();
        playback.looping = true;
        sequencer.update_playback_settings(playback);
        assert!(sequencer.settings().playback.looping);
    }
}
