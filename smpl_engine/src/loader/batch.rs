//! 异步批量加载

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::{load_animation_file, AnimationFileReference, H5Opener};
use crate::animation::LoadedAnimation;
use crate::model::ModelRegistry;
use crate::{Result, SmplError};

/// 加载取消标志（可在任意线程设置）
#[derive(Clone, Debug, Default)]
pub struct LoadCancellation(Arc<AtomicBool>);

impl LoadCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 批量加载器
///
/// 每个文件在阻塞线程池中解析；每行之间让出一次执行权。
/// 单个文件失败只记录日志并跳过，整行都失败时跳过该行。
#[derive(Clone)]
pub struct AnimationBatchLoader {
    registry: Arc<ModelRegistry>,
    h5_opener: Option<H5Opener>,
    progress: Option<UnboundedSender<String>>,
    cancellation: LoadCancellation,
}

impl AnimationBatchLoader {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            h5_opener: None,
            progress: None,
            cancellation: LoadCancellation::new(),
        }
    }

    pub fn with_h5_opener(mut self, opener: H5Opener) -> Self {
        self.h5_opener = Some(opener);
        self
    }

    pub fn with_progress(mut self, sender: UnboundedSender<String>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, cancellation: LoadCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &LoadCancellation {
        &self.cancellation
    }

    /// 加载全部行，返回成功的动画组
    pub async fn load(&self, reference: &AnimationFileReference) -> Result<Vec<Vec<LoadedAnimation>>> {
        let total = reference.count();
        self.report(format!(
            "Loading {total} animations from files. If there are a lot, this could take a few seconds..."
        ));

        let mut sequence = Vec::new();
        for (line_index, line) in reference.lines().iter().enumerate() {
            let group = self.load_line(line, reference).await?;

            let mut message = format!("Loaded {} of {total}", line_index + 1);
            if group.is_empty() {
                message.push_str(" [WITH ERRORS]. Skipping line.");
                log::warn!("\t...{message}");
                self.send(message);
                continue;
            }

            message.push_str(&format!(
                " (Model:{}), containing animations for {} characters",
                group[0].data.model.model_name,
                group.len()
            ));
            log::info!("\t...{message}");
            self.send(message);
            sequence.push(group);

            tokio::task::yield_now().await;
        }

        self.report(format!(
            "Done Loading All Animations. Successfully loaded {} of {total}.",
            sequence.len()
        ));
        Ok(sequence)
    }

    async fn load_line(
        &self,
        line: &str,
        reference: &AnimationFileReference,
    ) -> Result<Vec<LoadedAnimation>> {
        let folder = reference.folder();
        let mut group = Vec::new();

        for file_name in AnimationFileReference::file_names(line) {
            if self.cancellation.is_cancelled() {
                log::info!("Loading cancelled");
                return Err(SmplError::Cancelled);
            }

            let path: PathBuf = folder.join(file_name);
            let registry = Arc::clone(&self.registry);
            let opener = self.h5_opener.clone();
            let result = tokio::task::spawn_blocking(move || {
                load_animation_file(&path, &registry, opener.as_ref())
            })
            .await;

            match result {
                Ok(Ok(data)) => group.push(LoadedAnimation::new(file_name, data)),
                Ok(Err(SmplError::UnsupportedFileType(message))) => log::warn!(
                    "{message}. File skipped.\n\t\tFileName: {file_name}\n\t\tFolder: {}",
                    folder.display()
                ),
                Ok(Err(e)) => log::error!(
                    "{e}\n\t\tFileName: {file_name}\n\t\tFolder: {}",
                    folder.display()
                ),
                Err(e) => log::error!("load task for {file_name} failed: {e}"),
            }
        }
        Ok(group)
    }

    fn report(&self, message: String) {
        log::info!("{message}");
        self.send(message);
    }

    fn send(&self, message: String) {
        if let Some(progress) = &self.progress {
            let _ = progress.send(message);
        }
    }
}
