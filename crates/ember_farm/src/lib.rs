//! Ember farm - parallel progressive rendering with independent workers.
//!
//! This crate provides:
//!
//! - **Protocol**: startup and progress messages, native or JSON encoded
//! - **Workers**: one thread per worker, each with a private renderer
//! - **Coordinator**: merges worker batches and produces the display image
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ember_farm::{FarmConfig, RenderFarm};
//! use ember_renderer::Scene;
//!
//! let config = FarmConfig::default().with_resolution(320, 240);
//! let mut farm = RenderFarm::spawn(&config, Arc::new(Scene::demo_room))?;
//! farm.run_messages(32)?;
//! let rgba = farm.to_rgba();
//! ```

pub mod config;
pub mod coordinator;
pub mod farm;
pub mod protocol;
pub mod worker;

// Re-export commonly used types
pub use config::{ConfigError, FarmConfig};
pub use coordinator::Coordinator;
pub use farm::{FarmError, FarmResult, RenderFarm};
pub use protocol::{Encoding, ProgressMessage, ProtocolError, StartupMessage, StartupParams};
pub use worker::{Control, SceneFactory, WorkerEvent, WorkerSettings};
