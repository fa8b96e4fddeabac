//! 混合形状通道

use super::VertexDelta;

/// 混合形状通道
///
/// 体型通道与姿态相关通道共用同一结构，只有索引区间不同。
#[derive(Clone, Debug)]
pub struct BlendShape {
    pub name: String,
    pub weight: f32,
    pub deltas: Vec<VertexDelta>,
}

impl BlendShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 0.0,
            deltas: Vec::new(),
        }
    }

    pub fn with_deltas(name: impl Into<String>, deltas: Vec<VertexDelta>) -> Self {
        let mut shape = Self::new(name);
        shape.deltas = deltas;
        shape
    }

    /// 设置权重
    ///
    /// 不做截断：姿态相关通道的权重可以为负，也可以超过 100。
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn reset(&mut self) {
        self.weight = 0.0;
    }
}

impl Default for BlendShape {
    fn default() -> Self {
        Self::new(String::new())
    }
}
