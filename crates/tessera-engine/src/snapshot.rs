//! Frame-loop snapshots with BLAKE3 hashing.
//!
//! A [`FrameSnapshot`] captures the world's scene document (every live
//! entity with its registered components) plus the frame counter, and a
//! BLAKE3 digest over both. Two runs that produce the same hash reached the
//! same observable state.
//!
//! # What Is NOT Captured
//!
//! - **Handles**: restoring recreates entities, so their handles differ from
//!   the ones held before the snapshot.
//! - **Unregistered components**: only components whose type is registered
//!   with the world's component registry are written.
//! - **Services**: they live outside the entity set and are left untouched.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_world::{Handle, SceneDocument};

use crate::frame::FrameLoop;

// ---------------------------------------------------------------------------
// FrameSnapshot
// ---------------------------------------------------------------------------

/// Captured frame-loop state plus its BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Scene document of the world at capture time.
    pub scene: Value,
    /// Frames run at capture time.
    pub frame_counter: u64,
    /// BLAKE3 hex digest (64 lowercase hex chars) of `scene` and
    /// `frame_counter`.
    pub hash: String,
}

fn compute_hash(scene: &Value, frame_counter: u64) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        scene: &'a Value,
        frame_counter: u64,
    }

    let mut hasher = blake3::Hasher::new();
    if let Err(error) = serde_json::to_writer(
        &mut hasher,
        &HashableState {
            scene,
            frame_counter,
        },
    ) {
        tracing::error!(%error, "failed to serialize state for hashing");
    }
    hasher.finalize().to_hex().to_string()
}

// ---------------------------------------------------------------------------
// FrameLoop snapshot methods
// ---------------------------------------------------------------------------

impl FrameLoop {
    /// Capture the current entity set and frame counter.
    pub fn capture_snapshot(&self) -> FrameSnapshot {
        let scene = self.world().save_scene().to_value();
        let frame_counter = self.frame_count();
        let hash = compute_hash(&scene, frame_counter);
        FrameSnapshot {
            scene,
            frame_counter,
            hash,
        }
    }

    /// BLAKE3 digest of the current state; equal to
    /// `capture_snapshot().hash`.
    pub fn state_hash(&self) -> String {
        compute_hash(&self.world().save_scene().to_value(), self.frame_count())
    }

    /// Replace every entity with the ones recorded in `snapshot` and rewind
    /// the frame counter.
    ///
    /// # Errors
    ///
    /// Fails without touching the world if the hash does not match the
    /// snapshot's contents, if the scene document is malformed, or if the
    /// world is not initialized.
    pub fn restore_from_snapshot(&mut self, snapshot: &FrameSnapshot) -> anyhow::Result<Vec<Handle>> {
        let expected = compute_hash(&snapshot.scene, snapshot.frame_counter);
        if expected != snapshot.hash {
            bail!(
                "snapshot hash mismatch: recorded {} but recomputed {}",
                snapshot.hash,
                expected
            );
        }
        let scene = SceneDocument::from_value(&snapshot.scene)
            .context("snapshot holds a malformed scene document")?;
        if !self.world().is_initialized() {
            bail!("cannot restore a snapshot into an uninitialized world");
        }

        let world = self.world_mut();
        for handle in world.live_handles() {
            world.destroy(handle);
        }
        let handles = world.load_scene(&scene);
        self.set_frame_counter(snapshot.frame_counter);

        tracing::debug!(
            frame = snapshot.frame_counter,
            entities = handles.len(),
            "restored snapshot"
        );
        Ok(handles)
    }

    /// Load a scene file into the running world.
    pub fn load_scene_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<Vec<Handle>> {
        let path = path.as_ref();
        let handles = self
            .world_mut()
            .load_scene_from(path)
            .with_context(|| format!("failed to load scene file '{}'", path.display()))?;
        let dropped = handles.iter().filter(|handle| handle.is_null()).count();
        if dropped > 0 {
            tracing::warn!(
                scene = %path.display(),
                dropped,
                "scene did not fit in the world; some entities were not created"
            );
        }
        Ok(handles)
    }

    /// Write the current scene to a file.
    pub fn save_scene_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.world()
            .save_scene_to(path)
            .with_context(|| format!("failed to save scene file '{}'", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
