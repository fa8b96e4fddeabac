//! 动画实例：共享只读数据 + 独立播放状态

use glam::{Quat, Vec3};
use std::sync::Arc;

use super::{AnimationData, EventDispatcher, Playback, PlaybackControls, PlaybackEvent, ResampledFrame};
use crate::config::PlaybackSettings;

/// 已加载并命名的动画
#[derive(Clone, Debug)]
pub struct LoadedAnimation {
    pub name: String,
    pub data: Arc<AnimationData>,
}

impl LoadedAnimation {
    pub fn new(name: impl Into<String>, data: AnimationData) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data),
        }
    }

    /// 创建一个新的播放实例
    pub fn instantiate(&self, settings: &PlaybackSettings) -> AnimationInstance {
        AnimationInstance::new(self.name.clone(), Arc::clone(&self.data), settings)
    }
}

/// 一帧采样结果
#[derive(Clone, Debug)]
pub struct FrameSample {
    pub translation: Vec3,
    pub poses: Vec<Quat>,
    /// 本次播放的第一次更新（落地在这一帧初始化）
    pub first_frame: bool,
    pub frame: ResampledFrame,
}

/// 动画实例
#[derive(Debug)]
pub struct AnimationInstance {
    name: String,
    data: Arc<AnimationData>,
    playback: Playback,
}

impl AnimationInstance {
    pub fn new(name: impl Into<String>, data: Arc<AnimationData>, settings: &PlaybackSettings) -> Self {
        let name = name.into();
        let playback = Playback::new(name.clone(), data.frame_count, data.fps, settings.fallback_fps);
        Self { name, data, playback }
    }

    /// 推进时钟并采样当前帧
    ///
    /// 第一次调用时启动播放并返回首帧；已结束时返回 None。
    pub fn play_current_frame(
        &mut self,
        dt: f32,
        controls: &PlaybackControls,
        settings: &PlaybackSettings,
        events: &EventDispatcher,
    ) -> Option<FrameSample> {
        if self.playback.is_finished() {
            return None;
        }

        let first_update = !self.playback.is_started();
        let frame = if first_update {
            self.playback.start(events);
            events.send(PlaybackEvent::AnimationStarted {
                name: self.name.clone(),
            });
            ResampledFrame::first_frame_guaranteed(self.data.frame_count, settings.play_backwards)
        } else {
            self.playback.next_frame(dt, controls, settings, events)
        };

        Some(FrameSample {
            translation: self.data.translation_at(&frame),
            poses: self.data.poses_at(&frame),
            first_frame: first_update,
            frame,
        })
    }

    /// 中断播放
    pub fn end(&mut self, events: &EventDispatcher) {
        self.playback.finish(events);
    }

    pub fn is_finished(&self) -> bool {
        self.playback.is_finished()
    }

    pub fn is_started(&self) -> bool {
        self.playback.is_started()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &AnimationData {
        &self.data
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_first_call_returns_exact_first_frame() {
        let events = EventDispatcher::default();
        let settings = PlaybackSettings::default();
        let loaded = LoadedAnimation::new("walk", fixtures::animation_data(4, 10));
        let mut instance = loaded.instantiate(&settings);

        let sample = instance
            .play_current_frame(0.5, &PlaybackControls::default(), &settings, &events)
            .unwrap();
        assert!(sample.first_frame);
        assert_eq!(sample.translation, loaded.data.translations[0]);
        assert!(instance.is_started());
        assert_eq!(instance.playback().elapsed_time(), 0.0);
    }

    #[test]
    fn test_instances_share_data_but_not_state() {
        let events = EventDispatcher::default();
        let settings = PlaybackSettings::default();
        let controls = PlaybackControls::default();
        let loaded = LoadedAnimation::new("walk", fixtures::animation_data(4, 10));
        let mut a = loaded.instantiate(&settings);
        let b = loaded.instantiate(&settings);

        a.play_current_frame(0.0, &controls, &settings, &events);
        a.play_current_frame(0.1, &controls, &settings, &events);
        assert!(a.playback().elapsed_time() > 0.0);
        assert_eq!(b.playback().elapsed_time(), 0.0);
        assert_eq!(Arc::strong_count(&loaded.data), 3);
    }

    #[test]
    fn test_finished_instance_yields_nothing() {
        let events = EventDispatcher::default();
        let mut rx = events.subscribe();
        let settings = PlaybackSettings::default();
        let controls = PlaybackControls::default();
        let mut instance = LoadedAnimation::new("walk", fixtures::animation_data(4, 10)).instantiate(&settings);

        instance.play_current_frame(0.0, &controls, &settings, &events);
        let last = instance
            .play_current_frame(1.0, &controls, &settings, &events)
            .unwrap();
        assert!(last.frame.is_last_frame);
        assert!(instance.is_finished());
        assert!(instance.play_current_frame(0.1, &controls, &settings, &events).is_none());

        instance.end(&events);
        let ended = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, PlaybackEvent::AnimationEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }
}
