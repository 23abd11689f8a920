//! Render worker loop.
//!
//! A worker owns a private scene, renderer and accumulation buffer. It
//! renders a batch of iterations, reports the buffer, clears it and then
//! waits for the coordinator to tell it to continue.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use ember_renderer::{OutputSize, RenderConfig, Renderer, Scene};

use crate::protocol::{ProgressMessage, ProtocolError, ProtocolResult, StartupMessage};

/// Builds the scene a worker renders, given the output size it was started with.
pub type SceneFactory = Arc<dyn Fn(OutputSize) -> Scene + Send + Sync>;

/// Coordinator to worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Worker to coordinator.
#[derive(Debug)]
pub enum WorkerEvent {
    Progress {
        worker_id: usize,
        message: ProgressMessage,
    },
    Finished {
        worker_id: usize,
        batches: u64,
    },
    Failed {
        worker_id: usize,
        error: ProtocolError,
    },
}

/// Per-worker settings that are not part of the startup message.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub worker_id: usize,
    pub render: RenderConfig,
    /// Stop after this many batches (None = until told to stop)
    pub max_batches: Option<u64>,
}

/// Run a worker to completion and return the number of batches reported.
///
/// Ends when the coordinator sends [`Control::Stop`], when either channel is
/// disconnected, or after `max_batches`. A `Finished` event is sent on every
/// normal exit; startup and encoding errors are returned to the caller.
pub fn run(
    settings: &WorkerSettings,
    scene_factory: &SceneFactory,
    startup: &StartupMessage,
    to_coordinator: &Sender<WorkerEvent>,
    from_coordinator: &Receiver<Control>,
) -> ProtocolResult<u64> {
    let worker_id = settings.worker_id;
    let (params, encoding) = startup.parse()?;
    log::debug!(
        "Worker {}: {}x{}, {} iterations per message, {:?} encoding",
        worker_id,
        params.width,
        params.height,
        params.iterations_per_message,
        encoding
    );

    let scene = scene_factory(OutputSize::new(params.width, params.height));
    let mut renderer = Renderer::new(scene, settings.render.clone());
    let mut batches = 0;

    loop {
        for _ in 0..params.iterations_per_message {
            renderer.iterate();
        }

        let message = ProgressMessage::encode(renderer.buffer(), encoding)?;
        if to_coordinator
            .send(WorkerEvent::Progress { worker_id, message })
            .is_err()
        {
            log::debug!("Worker {}: coordinator gone", worker_id);
            break;
        }
        renderer.clear_buffer();
        batches += 1;

        if settings.max_batches.is_some_and(|max| batches >= max) {
            log::debug!("Worker {}: batch limit reached", worker_id);
            break;
        }

        match from_coordinator.recv() {
            Ok(Control::Continue) => {}
            Ok(Control::Stop) => {
                log::debug!("Worker {}: stopped by coordinator", worker_id);
                break;
            }
            Err(_) => {
                log::debug!("Worker {}: control channel disconnected", worker_id);
                break;
            }
        }
    }

    // The coordinator may already be gone
    let _ = to_coordinator.send(WorkerEvent::Finished { worker_id, batches });
    Ok(batches)
}
