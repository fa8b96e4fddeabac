//! 播放控制与事件广播

use tokio::sync::broadcast;

use super::FrameData;

/// 所有 Playback 每个 tick 读取的共享控制量
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackControls {
    paused: bool,
    /// 带符号的速度倍率，负数表示倒退
    speed: f32,
}

impl PlaybackControls {
    pub fn new() -> Self {
        Self {
            paused: false,
            speed: 1.0,
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Default for PlaybackControls {
    fn default() -> Self {
        Self::new()
    }
}

/// 播放事件
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    TotalFrames { name: String, total_frames: usize },
    FrameData { name: String, frame: FrameData },
    AnimationStarted { name: String },
    AnimationEnded { name: String },
    /// 加载进度等文字信息
    Progress(String),
    PlayingNewAnimationSet { index: usize, total: usize, characters: usize },
    AllComplete,
    DoneLoading { loaded: usize, total: usize },
}

const DEFAULT_CAPACITY: usize = 1024;

/// 事件分发器：一个发送端，任意多个独立监听者
///
/// 没有监听者时事件直接丢弃；跟不上的监听者会收到 `Lagged`。
#[derive(Clone, Debug)]
pub struct EventDispatcher {
    sender: broadcast::Sender<PlaybackEvent>,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.sender.subscribe()
    }

    pub fn send(&self, event: PlaybackEvent) {
        let _ = self.sender.send(event);
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
