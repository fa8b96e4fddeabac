//! 动画播放
//!
//! 动画数据、与帧率无关的重采样、播放时钟和播放事件。

mod controls;
mod data;
mod instance;
mod playback;
mod resampled_frame;

pub use controls::{EventDispatcher, PlaybackControls, PlaybackEvent};
pub use data::AnimationData;
pub use instance::{AnimationInstance, FrameSample, LoadedAnimation};
pub use playback::{FrameData, Playback};
pub use resampled_frame::{ResampledFrame, FIRST_FRAME_EPSILON};
