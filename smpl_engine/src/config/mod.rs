//! 运行时配置

mod settings;
mod viewer;

pub use settings::{
    BodyOptions, BoneDisplayState, DisplaySettings, GroundSnapType, MeshDisplayState,
    PlaybackSettings,
};
pub use viewer::{get_config, load_config, reset_config, save_config, set_config, ViewerConfig};
