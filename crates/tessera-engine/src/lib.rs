//! Tessera Engine -- frame loop, snapshots and process setup.
//!
//! This crate builds on [`tessera_world`] to provide the driver around a
//! world: a fixed-timestep [`FrameLoop`](frame::FrameLoop) that runs update,
//! render and debug-UI passes in order, BLAKE3-hashed snapshots of the
//! entity set, and one-call setup for logging and the reflection registry.
//!
//! # Quick Start
//!
//! ```
//! use tessera_engine::prelude::*;
//!
//! tessera_engine::install_reflection(|_| {}).unwrap();
//!
//! let mut world = World::new();
//! world.initialize(32);
//! world.create("", "camera");
//!
//! let config = FrameConfig { headless: true, ..Default::default() };
//! let mut frame_loop = FrameLoop::new(world, config);
//! frame_loop.run_frames(100);
//!
//! let snapshot = frame_loop.capture_snapshot();
//! assert_eq!(snapshot.frame_counter, 100);
//! assert_eq!(snapshot.hash, frame_loop.state_hash());
//! ```

#![deny(unsafe_code)]

pub mod frame;
pub mod logging;
pub mod snapshot;

use anyhow::Context;
use tessera_meta::MetaRegistry;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the reflection crate for convenience.
pub use tessera_meta;

/// Re-export the world crate for convenience.
pub use tessera_world;

/// Build the process-wide reflection registry from the built-in classes plus
/// whatever `register` adds, and install it.
///
/// # Errors
///
/// Fails if a registry was already installed in this process.
pub fn install_reflection(
    register: impl FnOnce(&mut MetaRegistry),
) -> anyhow::Result<&'static MetaRegistry> {
    let mut registry = MetaRegistry::new();
    tessera_world::register_builtins(&mut registry);
    register(&mut registry);
    let installed = registry
        .install()
        .context("failed to install the reflection registry")?;
    tracing::info!(
        classes = installed.len(),
        "reflection registry ready"
    );
    Ok(installed)
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use tessera_world::prelude::*;

    pub use crate::frame::{FrameConfig, FrameDiagnostics, FrameLoop};
    pub use crate::snapshot::FrameSnapshot;
}
