//! 查看器配置（全局实例 + confy 持久化）

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use super::{BodyOptions, DisplaySettings, PlaybackSettings};
use crate::{Result, SmplError};

const CONFY_APP_NAME: &str = "smpl_viewer";
const CONFY_CONFIG_NAME: &str = "viewer";

/// 查看器配置
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub body: BodyOptions,
    pub playback: PlaybackSettings,
    pub display: DisplaySettings,
}

/// 全局配置实例
static VIEWER_CONFIG: Lazy<RwLock<ViewerConfig>> =
    Lazy::new(|| RwLock::new(ViewerConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> ViewerConfig {
    VIEWER_CONFIG
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// 手动设置配置
pub fn set_config(config: ViewerConfig) {
    *VIEWER_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(ViewerConfig::default());
}

/// 从用户配置目录读取并设为全局配置；读取失败时使用默认值
pub fn load_config() -> ViewerConfig {
    let config: ViewerConfig = match confy::load(CONFY_APP_NAME, CONFY_CONFIG_NAME) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Could not load viewer config, using defaults: {e}");
            ViewerConfig::default()
        }
    };
    set_config(config.clone());
    config
}

/// 把当前全局配置写回用户配置目录
pub fn save_config() -> Result<()> {
    confy::store(CONFY_APP_NAME, CONFY_CONFIG_NAME, get_config())
        .map_err(|e| SmplError::Config(e.to_string()))
}
