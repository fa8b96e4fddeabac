//! 待加载的动画文件列表

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, SmplError};

const SUPPORTED_EXTENSIONS: [&str; 2] = ["json", "h5"];

/// 动画文件引用
///
/// 每行是一组同时播放的动画，行内文件名以空格分隔，相对于 `folder`。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationFileReference {
    folder: PathBuf,
    lines: Vec<String>,
}

impl AnimationFileReference {
    /// 从列表文件读取；列表文件不存在时记录错误并返回空列表
    pub fn from_list_file(folder: impl Into<PathBuf>, list_file: &Path) -> Self {
        let folder = folder.into();
        let lines = match fs::read_to_string(list_file) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                log::error!(
                    "Animation list file path specified, but could not find file at {} ({e})",
                    list_file.display()
                );
                Vec::new()
            }
        };
        Self { folder, lines }
    }

    /// 递归扫描目录下所有 .json / .h5 文件，每个文件单独成组
    pub fn from_folder(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        let mut found = Vec::new();
        collect_animation_files(&folder, &mut found)?;
        found.sort();

        let lines = found
            .iter()
            .filter_map(|path| path.strip_prefix(&folder).ok())
            .map(|relative| relative.to_string_lossy().into_owned())
            .collect();
        Ok(Self { folder, lines })
    }

    /// 单个动画文件
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        match file {
            Some(file) if path.is_file() => Ok(Self {
                folder,
                lines: vec![file],
            }),
            _ => Err(SmplError::FileMissing {
                file: path.display().to_string(),
                folder: folder.display().to_string(),
            }),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// 一行中的文件名
    pub fn file_names(line: &str) -> impl Iterator<Item = &str> {
        line.split(' ').filter(|name| !name.is_empty())
    }
}

fn collect_animation_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_animation_files(&path, found)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e))
        {
            found.push(path);
        }
    }
    Ok(())
}
