//! 扁平化设置项
//!
//! 直接在代码中修改默认值即可。

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 落地策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundSnapType {
    /// 不做落地偏移
    None,
    /// 所有同时播放的角色共用一个偏移
    #[default]
    Common,
    /// 每个角色使用自己的偏移
    Individual,
    /// 手动指定
    Custom,
}

/// 人体选项（原渲染选项）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    /// 显示个体体型；关闭时显示平均体型（实际 betas 仍保留）
    pub show_individualized_body: bool,
    /// 每帧重新整形
    pub update_body_shape_live: bool,
    /// 每帧应用动画姿态
    pub update_poses_live: bool,
    /// 每帧更新姿态相关混合形状
    pub update_pose_blend_shapes_live: bool,
    /// 允许手动摆姿态（此时忽略动画姿态与平移）
    pub allow_pose_manipulation: bool,
    pub update_translation_live_y: bool,
    pub update_translation_live_xz: bool,
    pub ground_snap: GroundSnapType,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            show_individualized_body: true,
            update_body_shape_live: false,
            update_poses_live: true,
            update_pose_blend_shapes_live: true,
            allow_pose_manipulation: false,
            update_translation_live_y: true,
            update_translation_live_xz: true,
            ground_snap: GroundSnapType::Common,
        }
    }
}

/// 播放设置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub play_backwards: bool,
    /// 源帧率缺失或为 0 时使用
    pub fallback_fps: u32,
    pub looping: bool,
    /// 同组多个角色按索引错开摆放
    pub offset_multiple_animations: bool,
    pub offset_spacing: Vec3,
    /// 加载完成后立即播放第一组
    pub playback_immediately: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            play_backwards: false,
            fallback_fps: 60,
            looping: false,
            offset_multiple_animations: false,
            offset_spacing: Vec3::new(1.0, 0.0, 0.0),
            playback_immediately: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshDisplayState {
    #[default]
    Opaque,
    SemiTransparent,
    Off,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoneDisplayState {
    On,
    #[default]
    Off,
}

/// 显示设置（只作为数据传给渲染端）
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub mesh: MeshDisplayState,
    pub bones: BoneDisplayState,
    pub joints: BoneDisplayState,
}
