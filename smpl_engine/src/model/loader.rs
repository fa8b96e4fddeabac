//! 人体模板（JSON）加载器

use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::{BodyModel, VertexWeight};
use crate::blendshape::{BlendShape, BlendShapeManager, VertexDelta};
use crate::body::MeshCorrection;
use crate::skeleton::{Bone, Skeleton};
use crate::{Result, SmplError};

#[derive(Deserialize)]
struct TemplateFile {
    name: String,
    bones: Vec<TemplateBone>,
    vertices: Vec<[f32; 3]>,
    skin_weights: Vec<TemplateWeight>,
    #[serde(default)]
    blend_shapes: Vec<TemplateBlendShape>,
    #[serde(default)]
    mesh_correction: MeshCorrection,
}

#[derive(Deserialize)]
struct TemplateBone {
    name: String,
    parent: i32,
    /// 模型空间位置
    position: [f32; 3],
}

#[derive(Deserialize)]
struct TemplateWeight {
    bones: Vec<i32>,
    weights: Vec<f32>,
}

#[derive(Deserialize)]
struct TemplateBlendShape {
    name: String,
    indices: Vec<u32>,
    offsets: Vec<[f32; 3]>,
}

/// 从 JSON 文件加载人体模板
pub fn load_body_template<P: AsRef<Path>>(path: P) -> Result<(BodyModel, MeshCorrection)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        SmplError::Template(format!("cannot read template {}: {}", path.display(), e))
    })?;
    let (model, correction) = parse_body_template(&text)?;
    log::info!(
        "Body template loaded: {} ({} bones, {} vertices, {} blendshapes)",
        model.name,
        model.bone_count(),
        model.vertex_count(),
        model.blend_shapes.channel_count()
    );
    Ok((model, correction))
}

/// 解析人体模板 JSON
pub fn parse_body_template(text: &str) -> Result<(BodyModel, MeshCorrection)> {
    let file: TemplateFile = serde_json::from_str(text)?;

    if file.skin_weights.len() != file.vertices.len() {
        return Err(SmplError::Template(format!(
            "{}: {} skin weights for {} vertices",
            file.name,
            file.skin_weights.len(),
            file.vertices.len()
        )));
    }

    let mut skeleton = Skeleton::new();
    for bone in &file.bones {
        skeleton.add_bone(Bone::with_parent(
            bone.name.clone(),
            bone.parent,
            Vec3::from_array(bone.position),
        ));
    }
    skeleton.build_hierarchy()?;

    let bone_count = skeleton.bone_count() as i32;
    let weights = file
        .skin_weights
        .iter()
        .enumerate()
        .map(|(i, w)| convert_weight(i, w, bone_count))
        .collect::<Result<Vec<_>>>()?;

    let vertex_count = file.vertices.len() as u32;
    let mut blend_shapes = BlendShapeManager::new();
    for shape in file.blend_shapes {
        if shape.indices.len() != shape.offsets.len() {
            return Err(SmplError::Template(format!(
                "blendshape {}: {} indices but {} offsets",
                shape.name,
                shape.indices.len(),
                shape.offsets.len()
            )));
        }
        if let Some(bad) = shape.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(SmplError::Template(format!(
                "blendshape {}: vertex {} out of range",
                shape.name, bad
            )));
        }
        let deltas = shape
            .indices
            .iter()
            .zip(shape.offsets.iter())
            .map(|(&vertex_index, offset)| VertexDelta {
                vertex_index,
                offset: Vec3::from_array(*offset),
            })
            .collect();
        blend_shapes.add_shape(BlendShape::with_deltas(shape.name, deltas));
    }

    let vertices = file.vertices.iter().map(|v| Vec3::from_array(*v)).collect();
    let model = BodyModel::new(file.name, skeleton, blend_shapes, vertices, weights);
    Ok((model, file.mesh_correction))
}

/// 转换顶点权重（1/2/4 骨骼）
fn convert_weight(vertex: usize, weight: &TemplateWeight, bone_count: i32) -> Result<VertexWeight> {
    if weight.bones.len() != weight.weights.len() {
        return Err(SmplError::Template(format!(
            "vertex {vertex}: {} bones but {} weights",
            weight.bones.len(),
            weight.weights.len()
        )));
    }
    if let Some(bad) = weight.bones.iter().find(|&&b| b >= bone_count) {
        return Err(SmplError::Template(format!(
            "vertex {vertex}: bone {bad} out of range"
        )));
    }

    match weight.bones.len() {
        1 => Ok(VertexWeight::One {
            bone: weight.bones[0],
        }),
        2 => Ok(VertexWeight::Two {
            bones: [weight.bones[0], weight.bones[1]],
            weight: weight.weights[0],
        }),
        3 | 4 => {
            let mut bones = [-1; 4];
            let mut weights = [0.0; 4];
            for i in 0..weight.bones.len() {
                bones[i] = weight.bones[i];
                weights[i] = weight.weights[i];
            }
            Ok(VertexWeight::Four { bones, weights })
        }
        n => Err(SmplError::Template(format!(
            "vertex {vertex}: unsupported influence count {n}"
        ))),
    }
}
