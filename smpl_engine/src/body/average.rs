//! 平均体型快照

use glam::Vec3;

use crate::model::{BodyModel, ModelDefinition};

/// 平均体型快照
///
/// 构建时保存骨骼的模型空间位置和顶点缓冲，`restore` 把 rig 恢复到这个状态。
#[derive(Clone, Debug)]
pub struct AverageBody {
    bone_positions: Vec<Vec3>,
    vertices: Vec<Vec3>,
}

impl AverageBody {
    pub fn capture(rig: &BodyModel) -> Self {
        Self {
            bone_positions: rig.skeleton.model_positions(),
            vertices: rig.vertices().to_vec(),
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn bone_positions(&self) -> &[Vec3] {
        &self.bone_positions
    }

    /// 恢复混合形状、骨骼和顶点
    pub fn restore(&self, rig: &mut BodyModel, model: &ModelDefinition) {
        for beta_index in 0..model.body_shape_beta_count {
            rig.set_blend_shape_weight(beta_index, 0.0);
        }
        for (_, _, channel) in model.pose_channels() {
            rig.set_blend_shape_weight(channel, 0.0);
        }

        let positions = &self.bone_positions;
        rig.skeleton
            .set_positions_downwards(model.pelvis_index, |index, _| positions.get(index).copied());

        rig.set_vertices(&self.vertices);
    }
}
