//! 混合形状管理器

use glam::Vec3;
use std::collections::HashMap;

use super::{BlendShape, FULL_WEIGHT};

/// 混合形状管理器
#[derive(Clone, Debug, Default)]
pub struct BlendShapeManager {
    shapes: Vec<BlendShape>,
    name_to_index: HashMap<String, usize>,
}

impl BlendShapeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加通道
    pub fn add_shape(&mut self, shape: BlendShape) {
        let index = self.shapes.len();
        self.name_to_index.insert(shape.name.clone(), index);
        self.shapes.push(shape);
    }

    pub fn find_shape_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 通道数量
    pub fn channel_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn get_shape(&self, index: usize) -> Option<&BlendShape> {
        self.shapes.get(index)
    }

    /// 设置通道权重，越界索引忽略
    pub fn set_weight(&mut self, index: usize, weight: f32) {
        if let Some(shape) = self.shapes.get_mut(index) {
            shape.set_weight(weight);
        }
    }

    pub fn weight(&self, index: usize) -> f32 {
        self.shapes.get(index).map(|s| s.weight).unwrap_or(0.0)
    }

    /// 所有权重清零
    pub fn reset_all(&mut self) {
        for shape in &mut self.shapes {
            shape.reset();
        }
    }

    /// 叠加所有非零通道到顶点
    pub fn apply(&self, positions: &mut [Vec3]) {
        for shape in &self.shapes {
            if shape.weight == 0.0 {
                continue;
            }
            let scale = shape.weight / FULL_WEIGHT;
            for delta in &shape.deltas {
                let idx = delta.vertex_index as usize;
                if idx < positions.len() {
                    positions[idx] += delta.offset * scale;
                }
            }
        }
    }
}
