//! 角色根节点平移

use glam::Vec3;

use super::{Grounder, GroundingContext};
use crate::config::{BodyOptions, PlaybackSettings};
use crate::model::BodyModel;

/// 把动画平移、落地偏移和多角色错位合成到根节点上
#[derive(Clone, Debug)]
pub struct CharacterTranslator {
    current_translation: Vec3,
    first_frame_translation: Vec3,
    first_frame: bool,
    body_changed: bool,
    index: usize,
    playback: PlaybackSettings,
}

impl CharacterTranslator {
    pub fn new(index: usize, playback: PlaybackSettings) -> Self {
        Self {
            current_translation: Vec3::ZERO,
            first_frame_translation: Vec3::ZERO,
            first_frame: false,
            body_changed: false,
            index,
            playback,
        }
    }

    /// 当前帧的动画平移（未落地）
    pub fn set_translation(&mut self, translation: Vec3) {
        self.current_translation = translation;
    }

    pub fn notify_first_frame(&mut self) {
        self.first_frame = true;
    }

    pub fn notify_body_changed(&mut self) {
        self.body_changed = true;
    }

    pub fn set_playback_settings(&mut self, playback: PlaybackSettings) {
        self.playback = playback;
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn first_frame_translation(&self) -> Vec3 {
        self.first_frame_translation
    }

    /// 每帧更新
    pub fn update(
        &mut self,
        rig: &mut BodyModel,
        grounder: &mut Grounder,
        options: &BodyOptions,
        ctx: &mut GroundingContext,
    ) {
        self.update_translation(rig, grounder, options, ctx);

        if self.first_frame {
            self.configure_first_frame(rig, grounder, options, ctx);
        }

        if !options.update_poses_live || (!self.first_frame && self.body_changed) {
            self.update_foot_offset(rig, grounder, options, ctx);
        }
    }

    /// 落地策略变化后立即重新合成
    pub fn grounding_changed(
        &self,
        rig: &mut BodyModel,
        grounder: &Grounder,
        options: &BodyOptions,
        ctx: &GroundingContext,
    ) {
        self.update_translation(rig, grounder, options, ctx);
    }

    fn configure_first_frame(
        &mut self,
        rig: &mut BodyModel,
        grounder: &mut Grounder,
        options: &BodyOptions,
        ctx: &mut GroundingContext,
    ) {
        self.first_frame_translation = self.current_translation;
        grounder.init_ground(rig, ctx);
        self.body_changed = false;
        self.first_frame = false;
        self.update_translation(rig, grounder, options, ctx);
    }

    fn update_foot_offset(
        &mut self,
        rig: &mut BodyModel,
        grounder: &mut Grounder,
        options: &BodyOptions,
        ctx: &mut GroundingContext,
    ) {
        self.body_changed = false;
        grounder.update_ground(rig);
        self.update_translation(rig, grounder, options, ctx);
    }

    fn update_translation(
        &self,
        rig: &mut BodyModel,
        grounder: &Grounder,
        options: &BodyOptions,
        ctx: &GroundingContext,
    ) {
        if options.allow_pose_manipulation {
            return;
        }

        let mut translation = Vec3::ZERO;

        // 高度单独处理，需要叠加落地偏移
        translation.y = if options.update_translation_live_y && options.update_poses_live {
            self.current_translation.y
        } else {
            self.first_frame_translation.y
        };
        translation = grounder.apply_ground(translation, self.first_frame, options.ground_snap, ctx);

        if options.update_poses_live {
            let source = if options.update_translation_live_xz {
                self.current_translation
            } else {
                self.first_frame_translation
            };
            translation.x = source.x;
            translation.z = source.z;
        }

        translation += self.offset_from_index();
        rig.set_root_translation(translation);
    }

    /// 同组多个角色沿 spacing 方向左右交替排开
    fn offset_from_index(&self) -> Vec3 {
        if !self.playback.offset_multiple_animations {
            return Vec3::ZERO;
        }
        let spacing = self.playback.offset_spacing;
        let offset = spacing * self.index as f32;
        if self.index % 2 == 1 {
            -(offset + spacing)
        } else {
            offset
        }
    }
}
