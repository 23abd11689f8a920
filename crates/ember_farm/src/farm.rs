//! Spawns render workers and drives the coordinator.
//!
//! Each worker runs on its own thread with its own scene and renderer. The
//! farm receives their progress messages in whatever order they arrive,
//! merges them into the [`Coordinator`] and tells the sender to continue.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use ember_renderer::{OutputSize, RenderConfig};
use thiserror::Error;

use crate::config::{ConfigError, FarmConfig};
use crate::coordinator::Coordinator;
use crate::protocol::ProtocolError;
use crate::worker::{self, Control, SceneFactory, WorkerEvent, WorkerSettings};

/// Errors raised while running a farm.
#[derive(Error, Debug)]
pub enum FarmError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Worker {worker_id} failed: {source}")]
    Worker {
        worker_id: usize,
        #[source]
        source: ProtocolError,
    },

    #[error("All workers have disconnected")]
    Disconnected,
}

pub type FarmResult<T> = Result<T, FarmError>;

struct WorkerHandle {
    control: Sender<Control>,
    thread: Option<JoinHandle<()>>,
    finished: bool,
}

/// A running set of render workers and the coordinator merging their output.
pub struct RenderFarm {
    coordinator: Coordinator,
    events: Receiver<WorkerEvent>,
    workers: Vec<WorkerHandle>,
}

impl RenderFarm {
    /// Validate `config` and start its workers.
    pub fn spawn(config: &FarmConfig, scene_factory: SceneFactory) -> FarmResult<Self> {
        config.validate()?;
        log::info!(
            "Starting {} workers: {}x{}, {} iterations per message",
            config.workers,
            config.width,
            config.height,
            config.iterations_per_message
        );

        let (to_coordinator, events) = channel();
        let startup = config.startup_message();
        let mut workers = Vec::with_capacity(config.workers);

        for worker_id in 0..config.workers {
            let (control, from_coordinator) = channel();
            let settings = WorkerSettings {
                worker_id,
                render: RenderConfig {
                    max_depth: config.max_depth,
                    seed: config.seed.map(|seed| seed.wrapping_add(worker_id as u64)),
                },
                max_batches: config.max_batches_per_worker,
            };
            let scene_factory = scene_factory.clone();
            let startup = startup.clone();
            let to_coordinator: Sender<WorkerEvent> = to_coordinator.clone();

            let thread = thread::Builder::new()
                .name(format!("ember-worker-{}", worker_id))
                .spawn(move || {
                    let result = worker::run(
                        &settings,
                        &scene_factory,
                        &startup,
                        &to_coordinator,
                        &from_coordinator,
                    );
                    if let Err(error) = result {
                        log::warn!("Worker {}: {}", worker_id, error);
                        let _ = to_coordinator.send(WorkerEvent::Failed { worker_id, error });
                    }
                })
                .map_err(FarmError::Spawn)?;

            workers.push(WorkerHandle {
                control,
                thread: Some(thread),
                finished: false,
            });
        }

        Ok(Self {
            coordinator: Coordinator::new(
                OutputSize::new(config.width, config.height),
                config.iterations_per_message,
            ),
            events,
            workers,
        })
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Number of workers that have not finished yet.
    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.finished).count()
    }

    /// Merge `messages` more progress messages, from any workers.
    ///
    /// Returns how many were merged, which is fewer than requested only if
    /// every worker finished first.
    pub fn run_messages(&mut self, messages: u64) -> FarmResult<u64> {
        let mut merged = 0;

        while merged < messages {
            if self.active_workers() == 0 {
                log::info!("All workers finished after {} messages", merged);
                break;
            }

            let event = self.events.recv().map_err(|_| FarmError::Disconnected)?;
            match event {
                WorkerEvent::Progress { worker_id, message } => {
                    self.coordinator.accumulate(message)?;
                    merged += 1;
                    log::debug!(
                        "Merged batch from worker {} ({} samples per pixel)",
                        worker_id,
                        self.coordinator.total_iterations()
                    );
                    // A worker at its batch limit has already left
                    let _ = self.workers[worker_id].control.send(Control::Continue);
                }
                WorkerEvent::Finished { worker_id, batches } => {
                    log::debug!("Worker {} finished after {} batches", worker_id, batches);
                    self.workers[worker_id].finished = true;
                }
                WorkerEvent::Failed { worker_id, error } => {
                    self.workers[worker_id].finished = true;
                    return Err(FarmError::Worker {
                        worker_id,
                        source: error,
                    });
                }
            }
        }

        Ok(merged)
    }

    /// Running mean as 8-bit RGBA.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.coordinator.to_rgba()
    }

    /// Tell every worker to stop and wait for their threads.
    pub fn shutdown(mut self) -> Coordinator {
        self.stop_workers();
        std::mem::replace(
            &mut self.coordinator,
            Coordinator::new(OutputSize::new(0, 0), 0),
        )
    }

    fn stop_workers(&mut self) {
        for worker in &self.workers {
            let _ = worker.control.send(Control::Stop);
        }
        for (worker_id, worker) in self.workers.iter_mut().enumerate() {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    log::warn!("Worker {} panicked", worker_id);
                }
            }
            worker.finished = true;
        }
    }
}

impl Drop for RenderFarm {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Encoding;
    use ember_renderer::{Body, Camera, Color, Diffuse, Scene, Sphere, Vec3};
    use std::sync::Arc;

    fn light_wall() -> SceneFactory {
        Arc::new(|output: OutputSize| {
            Scene::new(
                output,
                Camera::new(
                    Vec3::ZERO,
                    Vec3::new(-1.0, 1.0, 1.0),
                    Vec3::new(1.0, 1.0, 1.0),
                    Vec3::new(-1.0, 1.0, -1.0),
                ),
                vec![Body::new(
                    Sphere::new(Vec3::new(0.0, 1e4 + 10.0, 0.0), 1e4),
                    Diffuse::emissive(Color::ONE, Color::splat(0.5)),
                )],
            )
        })
    }

    fn config(encoding: Encoding) -> FarmConfig {
        FarmConfig {
            workers: 3,
            width: 4,
            height: 3,
            iterations_per_message: 2,
            max_depth: 0,
            seed: Some(17),
            encoding,
            max_batches_per_worker: None,
        }
    }

    #[test]
    fn test_farm_merges_all_workers() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut farm = RenderFarm::spawn(&config(Encoding::Native), light_wall()).unwrap();
        assert_eq!(farm.run_messages(6).unwrap(), 6);

        let coordinator = farm.shutdown();
        // Messages in flight during shutdown are never merged
        assert_eq!(coordinator.messages(), 6);
        assert_eq!(coordinator.total_iterations(), 12);
        // Every sample is exactly the 0.5 emission
        assert!(coordinator.buffer().iter().all(|v| *v == 6.0));
        // 0.5 * 255 = 127.5 rounds to even
        assert!(coordinator
            .to_rgba()
            .chunks_exact(4)
            .all(|p| p == [128u8, 128, 128, 255]));
    }

    #[test]
    fn test_farm_json_encoding() {
        let mut farm = RenderFarm::spawn(&config(Encoding::Json), light_wall()).unwrap();
        assert_eq!(farm.run_messages(4).unwrap(), 4);
        assert_eq!(farm.coordinator().total_iterations(), 8);
        assert!(farm.coordinator().buffer().iter().all(|v| *v == 4.0));
    }

    #[test]
    fn test_farm_stops_when_workers_finish() {
        let mut config = config(Encoding::Native);
        config.max_batches_per_worker = Some(2);

        let mut farm = RenderFarm::spawn(&config, light_wall()).unwrap();
        assert_eq!(farm.run_messages(100).unwrap(), 6);
        assert_eq!(farm.active_workers(), 0);
    }

    #[test]
    fn test_farm_rejects_invalid_config() {
        let mut config = config(Encoding::Native);
        config.workers = 0;

        let result = RenderFarm::spawn(&config, light_wall());
        assert!(matches!(result, Err(FarmError::Config(ConfigError::Invalid(_)))));
    }
}
