//! 测试用的小型人体模型
//!
//! 4 个关节、2 个 beta、6 个顶点，结构与 SMPL 相同但规模很小。

use glam::{Quat, Vec3};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::animation::AnimationData;
use crate::blendshape::{BlendShape, BlendShapeManager, VertexDelta};
use crate::body::{JointRegressor, MeshCorrection};
use crate::character::{CharacterTemplate, TemplateLibrary};
use crate::model::{BodyModel, Gender, GenderFiles, ModelDefinition, ModelKeys, VertexWeight};
use crate::skeleton::{Bone, Skeleton};

/// 体型通道 0 加在第 0 号顶点上的偏移
pub const SHAPE_DELTA: Vec3 = Vec3::new(0.01, 0.0, 0.0);

const BONES: [(&str, i32, [f32; 3]); 4] = [
    ("Pelvis", -1, [0.0, 0.0, 0.0]),
    ("L_Hip", 0, [0.1, -0.1, 0.0]),
    ("R_Hip", 0, [-0.1, -0.1, 0.0]),
    ("Spine1", 0, [0.0, 0.2, 0.0]),
];

const VERTICES: [[f32; 3]; 6] = [
    [0.0, 0.0, 0.1],
    [0.1, -0.9, 0.0],
    [-0.1, -0.9, 0.0],
    [0.0, 0.5, 0.0],
    [0.1, -0.05, 0.0],
    [0.0, 0.1, 0.0],
];

pub fn model_definition() -> ModelDefinition {
    ModelDefinition {
        model_name: "TestModel".into(),
        body_shape_beta_count: 2,
        joint_count: 4,
        pose_dependent_blend_shape_count: None,
        json_keys: ModelKeys::json(),
        h5_keys: ModelKeys::h5(),
        rotate_to_engine_coords: false,
        pelvis_index: 0,
        first_pose_is_pelvis_translation: true,
        regressor_files: GenderFiles {
            male: PathBuf::from("regressor_male.json"),
            female: PathBuf::from("regressor_female.json"),
        },
        template_files: GenderFiles {
            male: PathBuf::from("template_male.json"),
            female: PathBuf::from("template_female.json"),
        },
        unity_blend_shape_scale_factor: 100.0,
        pose_blend_shape_scaling_factor: 1.0,
        shape_blend_shape_scaling_factor: 1.0,
    }
}

fn weights() -> Vec<VertexWeight> {
    vec![
        VertexWeight::One { bone: 0 },
        VertexWeight::One { bone: 1 },
        VertexWeight::One { bone: 2 },
        VertexWeight::One { bone: 3 },
        VertexWeight::Two {
            bones: [0, 1],
            weight: 0.5,
        },
        VertexWeight::Four {
            bones: [0, 3, -1, -1],
            weights: [0.5, 0.5, 0.0, 0.0],
        },
    ]
}

fn blend_shapes() -> BlendShapeManager {
    let mut shapes = BlendShapeManager::new();
    shapes.add_shape(BlendShape::with_deltas(
        "Shape000",
        vec![VertexDelta {
            vertex_index: 0,
            offset: SHAPE_DELTA,
        }],
    ));
    shapes.add_shape(BlendShape::with_deltas(
        "Shape001",
        vec![VertexDelta {
            vertex_index: 3,
            offset: Vec3::new(0.0, 0.1, 0.0),
        }],
    ));
    for i in 0..27 {
        shapes.add_shape(BlendShape::new(format!("Pose{i:03}")));
    }
    shapes
}

/// 平均体型 rig
pub fn body_model() -> BodyModel {
    let mut skeleton = Skeleton::new();
    for (name, parent, position) in BONES {
        skeleton.add_bone(Bone::with_parent(name, parent, Vec3::from_array(position)));
    }
    skeleton.build_hierarchy().unwrap();

    let vertices = VERTICES.iter().map(|v| Vec3::from_array(*v)).collect();
    BodyModel::new("TestBody", skeleton, blend_shapes(), vertices, weights())
}

/// 源坐标系（X 取反）下的回归器
///
/// beta0 让两髋下移、脊柱上移；beta1 让两髋向外分开。
pub fn regressor() -> JointRegressor {
    JointRegressor::new(&regressor_template(), &regressor_rows()).unwrap()
}

fn regressor_template() -> Vec<[f64; 3]> {
    vec![
        [0.0, 0.0, 0.0],
        [-0.1, -0.1, 0.0],
        [0.1, -0.1, 0.0],
        [0.0, 0.2, 0.0],
    ]
}

fn regressor_rows() -> Vec<[Vec<f64>; 3]> {
    vec![
        [vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]],
        [vec![0.0, -0.01], vec![-0.01, 0.0], vec![0.0, 0.0]],
        [vec![0.0, 0.01], vec![-0.01, 0.0], vec![0.0, 0.0]],
        [vec![0.0, 0.0], vec![0.01, 0.0], vec![0.0, 0.0]],
    ]
}

pub fn regressor_json() -> String {
    json!({
        "joint_template": regressor_template(),
        "joint_regressor": regressor_rows(),
    })
    .to_string()
}

pub fn mesh_correction() -> MeshCorrection {
    MeshCorrection::new(Vec3::new(0.0, 0.02, 0.0), Vec3::new(0.0, 0.01, 0.0))
}

/// 与 [`body_model`] 相同内容的模板 JSON
pub fn template_json() -> String {
    let bones: Vec<_> = BONES
        .iter()
        .map(|(name, parent, position)| json!({"name": name, "parent": parent, "position": position}))
        .collect();
    let skin_weights: Vec<_> = weights()
        .iter()
        .map(|w| match w {
            VertexWeight::One { bone } => json!({"bones": [bone], "weights": [1.0]}),
            VertexWeight::Two { bones, weight } => {
                json!({"bones": bones, "weights": [weight, 1.0 - weight]})
            }
            VertexWeight::Four { bones, weights } => json!({"bones": bones, "weights": weights}),
        })
        .collect();
    let shapes = blend_shapes();
    let blend_shapes: Vec<_> = (0..shapes.channel_count())
        .filter_map(|i| shapes.get_shape(i))
        .map(|shape| {
            let indices: Vec<u32> = shape.deltas.iter().map(|d| d.vertex_index).collect();
            let offsets: Vec<[f32; 3]> = shape.deltas.iter().map(|d| d.offset.to_array()).collect();
            json!({"name": shape.name, "indices": indices, "offsets": offsets})
        })
        .collect();
    let correction = mesh_correction();

    json!({
        "name": "TestBody",
        "bones": bones,
        "vertices": VERTICES,
        "skin_weights": skin_weights,
        "blend_shapes": blend_shapes,
        "mesh_correction": {
            "offset_error_between_pelvis_and_zero": correction.offset_error_between_pelvis_and_zero.to_array(),
            "offset_error_in_fbx_between_rig_and_mesh": correction.offset_error_in_fbx_between_rig_and_mesh.to_array(),
        },
    })
    .to_string()
}

/// 把模板和回归器写到 dir，并让 model 指向这些文件
pub fn write_model_files(dir: &Path, model: &mut ModelDefinition) {
    for gender in [Gender::Male, Gender::Female] {
        let suffix = gender.to_string().to_lowercase();
        let template = dir.join(format!("template_{suffix}.json"));
        let regressor = dir.join(format!("regressor_{suffix}.json"));
        fs::write(&template, template_json()).unwrap();
        fs::write(&regressor, regressor_json()).unwrap();
        match gender {
            Gender::Male => {
                model.template_files.male = template;
                model.regressor_files.male = regressor;
            }
            Gender::Female => {
                model.template_files.female = template;
                model.regressor_files.female = regressor;
            }
        }
    }
}

/// 只含男性模板的模板库
pub fn template_library() -> TemplateLibrary {
    let mut library = TemplateLibrary::new();
    library.insert(
        "TestModel",
        Gender::Male,
        CharacterTemplate {
            rig: body_model(),
            correction: mesh_correction(),
            regressor: Arc::new(regressor()),
        },
    );
    library
}

/// 恒等姿态、沿 X 匀速前进的动画
pub fn animation_data(frames: usize, fps: u32) -> AnimationData {
    AnimationData {
        gender: Gender::Male,
        fps,
        frame_count: frames,
        translations: (0..frames).map(|i| Vec3::new(i as f32 * 0.1, 0.0, 0.0)).collect(),
        poses: vec![vec![Quat::IDENTITY; 4]; frames],
        betas: vec![0.0, 0.0],
        model: Arc::new(model_definition()),
    }
}

/// 对应测试模型的 JSON 动画文件内容
pub fn animation_json(gender: &str, frames: usize) -> String {
    let trans: Vec<[f32; 3]> = (0..frames).map(|i| [i as f32 * 0.1, 0.0, 0.0]).collect();
    let poses = vec![vec![[0.0f32, 0.0, 0.0, 1.0]; 4]; frames];
    json!({
        "gender": gender,
        "fps": 30,
        "betas": [0.0, 0.0],
        "trans": trans,
        "poses": poses,
    })
    .to_string()
}

/// 每个测试独占的临时目录
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("smpl_engine_{name}_{}", std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}
