//! 落地处理

use glam::Vec3;

use crate::config::GroundSnapType;
use crate::model::BodyModel;

/// 同时播放的角色共享的落地偏移
///
/// 第一个初始化落地的角色写入，其余角色只读。
/// 停止全部动画或任何角色体型变化时清空。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundingContext {
    common: Option<f32>,
}

impl GroundingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尚未建立时写入 offset，返回当前的公共偏移
    pub fn establish(&mut self, offset: f32) -> f32 {
        *self.common.get_or_insert(offset)
    }

    pub fn common(&self) -> Option<f32> {
        self.common
    }

    pub fn reset(&mut self) {
        self.common = None;
    }
}

/// 单个角色的落地偏移
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Grounder {
    pub individual_offset: f32,
    /// 手动指定的偏移（GroundSnapType::Custom）
    pub custom_offset: f32,
}

impl Grounder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首帧初始化：重新计算个体偏移并尝试建立公共偏移
    pub fn init_ground(&mut self, rig: &BodyModel, ctx: &mut GroundingContext) {
        self.individual_offset = Self::calculate_ground(rig);
        let common = ctx.establish(self.individual_offset);
        log::debug!(
            "{}: ground initialised, individual {:.4}, common {:.4}",
            rig.name,
            self.individual_offset,
            common
        );
    }

    /// 让当前烘焙网格最低点落到 y = 0 所需的偏移
    pub fn calculate_ground(rig: &BodyModel) -> f32 {
        let min_y = rig
            .bake()
            .iter()
            .map(|v| v.y)
            .fold(f32::INFINITY, f32::min);
        if !min_y.is_finite() {
            return 0.0;
        }
        -rig.world_point(Vec3::new(0.0, min_y, 0.0)).y
    }

    /// 在当前偏移基础上累加一次新的计算结果
    pub fn update_ground(&mut self, rig: &BodyModel) {
        self.individual_offset += Self::calculate_ground(rig);
    }

    /// 把落地偏移加到平移的 Y 分量上
    pub fn apply_ground(
        &self,
        mut translation: Vec3,
        first_frame: bool,
        policy: GroundSnapType,
        ctx: &GroundingContext,
    ) -> Vec3 {
        if first_frame {
            translation.y += self.individual_offset;
            return translation;
        }

        translation.y += match policy {
            GroundSnapType::None => 0.0,
            GroundSnapType::Common => ctx.common().unwrap_or(self.individual_offset),
            GroundSnapType::Individual => self.individual_offset,
            GroundSnapType::Custom => self.custom_offset,
        };
        translation
    }
}
