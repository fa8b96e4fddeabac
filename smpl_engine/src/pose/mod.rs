//! 逐帧姿态、落地与根节点平移

mod grounder;
mod resolver;
mod translation;

pub use grounder::{Grounder, GroundingContext};
pub use resolver::PoseResolver;
pub use translation::CharacterTranslator;
