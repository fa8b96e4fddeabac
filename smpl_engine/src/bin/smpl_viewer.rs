//! 无界面播放器
//!
//! 用法：smpl_viewer <models.json> <动画目录> [列表文件]
//! 不给列表文件时播放目录下所有动画文件，每个文件一组。

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use smpl_engine::animation::PlaybackEvent;
use smpl_engine::config::load_config;
use smpl_engine::loader::{AnimationBatchLoader, AnimationFileReference};
use smpl_engine::{AnimationSequencer, Character, ModelRegistry, TemplateLibrary};

const TICK_RATE: f32 = 60.0;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <models.json> <animation folder> [list file]", args[0]);
    }
    let registry_path = PathBuf::from(&args[1]);
    let folder = PathBuf::from(&args[2]);
    let list_file = args.get(3).map(PathBuf::from);

    let mut config = load_config();
    // 无人按"下一组"，加载完立即播放
    config.playback.playback_immediately = true;
    let registry = ModelRegistry::load(&registry_path)
        .with_context(|| format!("loading model registry {}", registry_path.display()))?;

    let reference = match &list_file {
        Some(list) => AnimationFileReference::from_list_file(&folder, list),
        None => AnimationFileReference::from_folder(&folder)
            .with_context(|| format!("scanning {}", folder.display()))?,
    };
    if reference.count() == 0 {
        bail!("no animations to play in {}", folder.display());
    }

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(message) = progress_rx.recv().await {
            println!("{message}");
        }
    });

    let loader = AnimationBatchLoader::new(Arc::new(registry)).with_progress(progress_tx);
    let sequence = loader.load(&reference).await?;
    drop(loader);
    printer.await?;

    let mut sequencer = AnimationSequencer::new(config, TemplateLibrary::new());
    let mut events = sequencer.events().subscribe();
    sequencer.set_sequence(sequence, reference.count());
    report_grounding(&sequencer);

    let dt = 1.0 / TICK_RATE;
    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    while !sequencer.all_animations_complete() {
        interval.tick().await;
        if let Err(e) = sequencer.tick(dt) {
            log::error!("{e}");
        }

        while let Ok(event) = events.try_recv() {
            match event {
                PlaybackEvent::Progress(message) => println!("{message}"),
                PlaybackEvent::AnimationStarted { name } => log::debug!("{name} started"),
                PlaybackEvent::AnimationEnded { name } => log::debug!("{name} ended"),
                _ => {}
            }
        }

        if sequencer.current_set_finished() {
            sequencer.go_to_next();
            report_grounding(&sequencer);
        }
    }

    Ok(())
}

fn report_grounding(sequencer: &AnimationSequencer) {
    let common = sequencer.grounding().common();
    for character in sequencer.player().characters() {
        log::info!(
            "{}: individual ground offset {:.4}, common {:?}, finished {}",
            character.name(),
            character.events().last_ground_offset,
            common,
            character.is_finished()
        );
    }
}
