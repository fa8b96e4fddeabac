//! 动画文件加载
//!
//! JSON 与列式（H5）两种格式、模型匹配、文件列表和异步批量加载。

mod batch;
mod file_reference;
mod h5;
mod json;
mod strategy;

pub use batch::{AnimationBatchLoader, LoadCancellation};
pub use file_reference::AnimationFileReference;
pub use h5::{AnimationH5Parser, DatasetSource, H5Opener, InMemoryDatasets};
pub use json::AnimationJsonParser;
pub use strategy::{find_matching_model, load_animation_file, load_from_source, AnimationSource, FileKind};
