//! 动画组序列播放

mod player;
mod sequencer;

pub use player::AnimationPlayer;
pub use sequencer::AnimationSequencer;
