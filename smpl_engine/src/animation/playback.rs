//! 播放时钟

use super::{EventDispatcher, PlaybackControls, PlaybackEvent, ResampledFrame};
use crate::config::PlaybackSettings;

const DEFAULT_FPS: u32 = 60;

/// 当前帧信息（进度条用）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameData {
    pub current_frame: f32,
    pub total_frames: usize,
    pub frame_rate: u32,
}

/// 播放时钟
///
/// 累计经过时间并换算成源帧；到达末帧时循环或结束。
#[derive(Clone, Debug)]
pub struct Playback {
    name: String,
    source_total_frame_count: usize,
    source_fps: u32,
    source_duration: f32,
    elapsed_time: f32,
    started: bool,
    finished: bool,
}

impl Playback {
    /// fps 为 0 时使用 fallback_fps（它也为 0 时使用 60）
    pub fn new(name: impl Into<String>, total_frames: usize, fps: u32, fallback_fps: u32) -> Self {
        let name = name.into();
        let source_fps = if fps == 0 {
            let fallback = if fallback_fps == 0 { DEFAULT_FPS } else { fallback_fps };
            log::warn!("{name}: source fps missing, defaulting fps to {fallback}");
            fallback
        } else {
            fps
        };

        Self {
            source_total_frame_count: total_frames,
            source_fps,
            source_duration: total_frames as f32 / source_fps as f32,
            elapsed_time: 0.0,
            started: false,
            finished: false,
            name,
        }
    }

    /// 开始播放
    pub fn start(&mut self, events: &EventDispatcher) {
        self.started = true;
        self.elapsed_time = 0.0;
        events.send(PlaybackEvent::TotalFrames {
            name: self.name.clone(),
            total_frames: self.source_total_frame_count,
        });
    }

    /// 推进 dt 秒并返回重采样帧
    ///
    /// 暂停时不累计时间但仍返回当前帧；经过时间不会小于 0。
    pub fn next_frame(
        &mut self,
        dt: f32,
        controls: &PlaybackControls,
        settings: &PlaybackSettings,
        events: &EventDispatcher,
    ) -> ResampledFrame {
        if !controls.is_paused() {
            self.elapsed_time = (self.elapsed_time + dt * controls.speed()).max(0.0);
        }

        let frame = if settings.play_backwards {
            ResampledFrame::backwards(self.elapsed_time, self.source_total_frame_count, self.source_duration)
        } else {
            ResampledFrame::forwards(self.elapsed_time, self.source_total_frame_count, self.source_duration)
        };

        events.send(PlaybackEvent::FrameData {
            name: self.name.clone(),
            frame: FrameData {
                current_frame: frame.frame(),
                total_frames: self.source_total_frame_count,
                frame_rate: self.source_fps,
            },
        });

        if frame.is_last_frame {
            if settings.looping {
                self.elapsed_time = 0.0;
            } else {
                self.finish(events);
            }
        }

        frame
    }

    /// 跳到指定源帧
    pub fn jump_to_frame(&mut self, frame: f32) {
        if self.source_total_frame_count == 0 {
            return;
        }
        self.elapsed_time = frame / self.source_total_frame_count as f32 * self.source_duration;
    }

    /// 结束播放（只生效一次）
    pub fn finish(&mut self, events: &EventDispatcher) {
        if self.finished {
            return;
        }
        self.finished = true;
        log::debug!("{}: playback ended", self.name);
        events.send(PlaybackEvent::AnimationEnded {
            name: self.name.clone(),
        });
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn duration(&self) -> f32 {
        self.source_duration
    }

    pub fn fps(&self) -> u32 {
        self.source_fps
    }

    pub fn total_frames(&self) -> usize {
        self.source_total_frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PlaybackSettings {
        PlaybackSettings::default()
    }

    #[test]
    fn test_zero_fps_falls_back() {
        let playback = Playback::new("clip", 120, 0, 60);
        assert_eq!(playback.fps(), 60);
        assert!((playback.duration() - 2.0).abs() < 1e-6);

        let playback = Playback::new("clip", 120, 0, 0);
        assert_eq!(playback.fps(), 60);
    }

    #[test]
    fn test_start_broadcasts_total_frames() {
        let events = EventDispatcher::default();
        let mut rx = events.subscribe();
        let mut playback = Playback::new("clip", 10, 30, 60);
        playback.start(&events);
        assert!(playback.is_started());
        assert_eq!(
            rx.try_recv().unwrap(),
            PlaybackEvent::TotalFrames {
                name: "clip".into(),
                total_frames: 10
            }
        );
    }

    #[test]
    fn test_pause_freezes_time() {
        let events = EventDispatcher::default();
        let mut controls = PlaybackControls::default();
        let mut playback = Playback::new("clip", 10, 10, 60);
        playback.start(&events);
        playback.next_frame(0.25, &controls, &settings(), &events);
        controls.set_paused(true);
        let frame = playback.next_frame(0.25, &controls, &settings(), &events);
        assert!((playback.elapsed_time() - 0.25).abs() < 1e-6);
        assert_eq!(frame.frame_before, 2);
    }

    #[test]
    fn test_speed_scales_time_and_never_goes_negative() {
        let events = EventDispatcher::default();
        let mut controls = PlaybackControls::default();
        controls.set_speed(2.0);
        let mut playback = Playback::new("clip", 10, 10, 60);
        playback.start(&events);
        playback.next_frame(0.125, &controls, &settings(), &events);
        assert!((playback.elapsed_time() - 0.25).abs() < 1e-6);

        controls.set_speed(-4.0);
        playback.next_frame(0.125, &controls, &settings(), &events);
        assert_eq!(playback.elapsed_time(), 0.0);
    }

    #[test]
    fn test_finishes_exactly_once() {
        let events = EventDispatcher::default();
        let mut rx = events.subscribe();
        let controls = PlaybackControls::default();
        let mut playback = Playback::new("clip", 10, 10, 60);
        playback.start(&events);

        let frame = playback.next_frame(2.0, &controls, &settings(), &events);
        assert!(frame.is_last_frame);
        assert!(playback.is_finished());
        playback.next_frame(0.1, &controls, &settings(), &events);
        playback.finish(&events);

        let ended = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, PlaybackEvent::AnimationEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_loop_resets_to_first_frame() {
        let events = EventDispatcher::default();
        let controls = PlaybackControls::default();
        let mut settings = settings();
        settings.looping = true;
        let mut playback = Playback::new("clip", 10, 10, 60);
        playback.start(&events);

        let last = playback.next_frame(1.0, &controls, &settings, &events);
        assert!(last.is_last_frame);
        assert!(!playback.is_finished());

        let next = playback.next_frame(0.0, &controls, &settings, &events);
        assert!(next.is_first_frame);
        assert!(!playback.is_finished());
    }

    #[test]
    fn test_backwards_playback() {
        let events = EventDispatcher::default();
        let controls = PlaybackControls::default();
        let mut settings = settings();
        settings.play_backwards = true;
        let mut playback = Playback::new("clip", 10, 10, 60);
        playback.start(&events);

        let frame = playback.next_frame(0.25, &controls, &settings, &events);
        assert!((frame.decimal_frame - 7.5).abs() < 1e-5);
        let frame = playback.next_frame(0.75, &controls, &settings, &events);
        assert!(frame.is_last_frame);
        assert!(playback.is_finished());
    }

    #[test]
    fn test_jump_to_frame() {
        let mut playback = Playback::new("clip", 100, 50, 60);
        playback.jump_to_frame(25.0);
        assert!((playback.elapsed_time() - 0.5).abs() < 1e-6);
    }
}
