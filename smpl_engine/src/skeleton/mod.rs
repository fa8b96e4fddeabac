//! 骨骼系统和关节映射

mod bone;
mod joint_map;
mod manager;

pub use bone::Bone;
pub use joint_map::{JointMap, BODY_JOINT_NAMES, FIRST_FINGER_JOINT, LEFT_FOOT, PELVIS, RIGHT_FOOT};
pub use manager::Skeleton;
