//! Headless progressive viewer.
//!
//! Runs a render farm on the demo room and writes the running mean to a PNG
//! after every round of progress messages, so the file sharpens while the
//! render goes on.
//!
//! Usage: ember_viewer [--config farm.json] [--rounds N] [output.png]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use ember_farm::{FarmConfig, RenderFarm, SceneFactory};
use ember_renderer::Scene;

const DEFAULT_ROUNDS: u64 = 8;

/// Command line options
struct Args {
    config: Option<PathBuf>,
    rounds: u64,
    output: PathBuf,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args {
            config: None,
            rounds: DEFAULT_ROUNDS,
            output: PathBuf::from("ember.png"),
        };

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    let path = iter.next().context("--config needs a path")?;
                    args.config = Some(PathBuf::from(path));
                }
                "--rounds" => {
                    let value = iter.next().context("--rounds needs a number")?;
                    args.rounds = value
                        .parse()
                        .with_context(|| format!("invalid round count {:?}", value))?;
                }
                flag if flag.starts_with("--") => bail!("unknown option {}", flag),
                path => args.output = PathBuf::from(path),
            }
        }

        Ok(args)
    }
}

fn save_png(farm: &RenderFarm, path: &Path) -> Result<()> {
    let output = farm.coordinator().output();
    let image = image::RgbaImage::from_raw(output.width, output.height, farm.to_rgba())
        .context("display buffer does not match the output size")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse()?;
    let config = match &args.config {
        Some(path) => FarmConfig::load(path)?,
        None => FarmConfig::default(),
    };

    log::info!("Starting Ember viewer");

    let scene_factory: SceneFactory = Arc::new(Scene::demo_room);
    let mut farm = RenderFarm::spawn(&config, scene_factory)?;
    let start = Instant::now();

    for round in 1..=args.rounds {
        let merged = farm.run_messages(config.workers as u64)?;
        save_png(&farm, &args.output)?;
        log::info!(
            "Round {}/{}: {} samples per pixel after {:.1?}",
            round,
            args.rounds,
            farm.coordinator().total_iterations(),
            start.elapsed()
        );

        if merged < config.workers as u64 {
            log::info!("Workers finished early");
            break;
        }
    }

    let coordinator = farm.shutdown();
    log::info!(
        "Done: {} messages, {} samples per pixel, written to {:?}",
        coordinator.messages(),
        coordinator.total_iterations(),
        args.output
    );

    Ok(())
}
