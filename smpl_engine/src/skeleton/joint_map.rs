//! 骨骼名称 -> 关节索引映射表

use std::collections::HashMap;

/// SMPL 身体关节名称（按关节索引排列）
pub const BODY_JOINT_NAMES: [&str; 24] = [
    "Pelvis",
    "L_Hip",
    "R_Hip",
    "Spine1",
    "L_Knee",
    "R_Knee",
    "Spine2",
    "L_Ankle",
    "R_Ankle",
    "Spine3",
    "L_Foot",
    "R_Foot",
    "Neck",
    "L_Collar",
    "R_Collar",
    "Head",
    "L_Shoulder",
    "R_Shoulder",
    "L_Elbow",
    "R_Elbow",
    "L_Wrist",
    "R_Wrist",
    "L_Hand",
    "R_Hand",
];

pub const PELVIS: &str = "Pelvis";
pub const LEFT_FOOT: &str = "L_Foot";
pub const RIGHT_FOOT: &str = "R_Foot";

/// SMPL-H 手指关节起始索引（与 L_Hand / R_Hand 重叠）
pub const FIRST_FINGER_JOINT: usize = 22;

const FINGERS: [&str; 5] = ["index", "middle", "pinky", "ring", "thumb"];

/// 骨骼名称 -> 关节索引
#[derive(Clone, Debug)]
pub struct JointMap {
    name_to_index: HashMap<String, usize>,
    joint_count: usize,
}

impl JointMap {
    /// 24 个 SMPL 身体关节，名称与索引一一对应
    pub fn canonical() -> Self {
        let name_to_index = BODY_JOINT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self {
            name_to_index,
            joint_count: BODY_JOINT_NAMES.len(),
        }
    }

    /// SMPL-H 扩展表：追加左右手各 15 个手指关节（lindex0 = 22 ... rthumb2 = 51）
    ///
    /// L_Hand / R_Hand 保留原索引，因此该表不是双射。
    pub fn with_hands() -> Self {
        let mut map = Self::canonical();
        let mut index = FIRST_FINGER_JOINT;
        for side in ["l", "r"] {
            for finger in FINGERS {
                for segment in 0..3 {
                    map.name_to_index
                        .insert(format!("{side}{finger}{segment}"), index);
                    index += 1;
                }
            }
        }
        map.joint_count = index;
        map
    }

    /// 按关节数量选择映射表
    pub fn for_joint_count(joint_count: usize) -> Self {
        if joint_count > BODY_JOINT_NAMES.len() {
            Self::with_hands()
        } else {
            Self::canonical()
        }
    }

    pub fn joint_index(&self, bone_name: &str) -> Option<usize> {
        self.name_to_index.get(bone_name).copied()
    }

    pub fn contains(&self, bone_name: &str) -> bool {
        self.name_to_index.contains_key(bone_name)
    }

    /// 表覆盖的关节数量
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }
}

impl Default for JointMap {
    fn default() -> Self {
        Self::canonical()
    }
}
