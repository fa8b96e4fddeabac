//! 体型个性化：关节回归、网格校正、平均体型与体型整形

mod average;
mod correction;
mod regressor;
mod shaper;

pub use average::AverageBody;
pub use correction::MeshCorrection;
pub use regressor::JointRegressor;
pub use shaper::{debug_betas, BodyShaper};
