//! 网格与骨骼原点偏差校正

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 模板自带的两个固定偏差
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshCorrection {
    pub offset_error_between_pelvis_and_zero: Vec3,
    pub offset_error_in_fbx_between_rig_and_mesh: Vec3,
}

impl MeshCorrection {
    pub fn new(pelvis_to_zero: Vec3, rig_to_mesh: Vec3) -> Self {
        Self {
            offset_error_between_pelvis_and_zero: pelvis_to_zero,
            offset_error_in_fbx_between_rig_and_mesh: rig_to_mesh,
        }
    }

    /// 需要从每个顶点减去的合成偏差
    pub fn combined_offset(&self) -> Vec3 {
        self.offset_error_between_pelvis_and_zero - self.offset_error_in_fbx_between_rig_and_mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_offset() {
        let c = MeshCorrection::new(Vec3::new(0.0, 0.3, 0.1), Vec3::new(0.0, 0.1, 0.1));
        assert!((c.combined_offset() - Vec3::new(0.0, 0.2, 0.0)).length() < 1e-6);
    }
}
