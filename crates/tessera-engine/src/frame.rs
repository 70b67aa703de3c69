//! Fixed-timestep frame loop.
//!
//! The [`FrameLoop`] owns a [`World`] and drives it forward. Each frame:
//!
//! 1. [`World::update`] runs with the fixed time step (services first, then
//!    entities in creation order, then the deferred destroy drain).
//! 2. Unless headless, [`World::render`] and [`World::debug_ui`] run.
//! 3. The frame counter advances.
//!
//! Simulation time is computed as `frame_count * fixed_dt` rather than
//! accumulated, so it does not drift.
//!
//! # Example
//!
//! ```
//! use tessera_engine::prelude::*;
//!
//! let mut world = World::new();
//! world.initialize(64);
//! world.create("", "player");
//!
//! let config = FrameConfig { headless: true, ..Default::default() };
//! let mut frame_loop = FrameLoop::new(world, config);
//! frame_loop.run_frames(10);
//!
//! assert_eq!(frame_loop.frame_count(), 10);
//! assert_eq!(frame_loop.world().entity_count(), 1);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tessera_world::World;

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Seconds per frame. Must be positive and finite.
    pub fixed_dt: f32,
    /// Skip render and debug-UI passes.
    pub headless: bool,
    /// Upper bound on frames run by a single [`FrameLoop::advance`] call.
    pub max_steps_per_advance: u32,
}

impl Default for FrameConfig {
    /// 60 Hz, rendering on, at most 8 catch-up frames.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            headless: false,
            max_steps_per_advance: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    pub update_time: Duration,
    /// Zero when headless.
    pub render_time: Duration,
    /// Zero when headless.
    pub debug_ui_time: Duration,
    pub total_time: Duration,
    /// Live entities after the frame.
    pub entity_count: usize,
}

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

/// Drives a [`World`] forward one fixed step at a time.
pub struct FrameLoop {
    world: World,
    config: FrameConfig,
    frame_counter: u64,
    /// Wall-clock time not yet consumed by [`advance`](Self::advance).
    accumulator: f32,
    last_diagnostics: FrameDiagnostics,
}

impl FrameLoop {
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(world: World, config: FrameConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            world,
            config,
            frame_counter: 0,
            accumulator: 0.0,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Run one frame.
    pub fn tick(&mut self) {
        let frame_start = Instant::now();

        let update_start = Instant::now();
        self.world.update(self.config.fixed_dt);
        let update_time = update_start.elapsed();

        let (render_time, debug_ui_time) = if self.config.headless {
            (Duration::ZERO, Duration::ZERO)
        } else {
            let render_start = Instant::now();
            self.world.render();
            let render_time = render_start.elapsed();

            let debug_start = Instant::now();
            self.world.debug_ui();
            (render_time, debug_start.elapsed())
        };

        self.frame_counter += 1;
        self.last_diagnostics = FrameDiagnostics {
            update_time,
            render_time,
            debug_ui_time,
            total_time: frame_start.elapsed(),
            entity_count: self.world.entity_count(),
        };
        tracing::trace!(
            frame = self.frame_counter,
            entities = self.last_diagnostics.entity_count,
            "frame complete"
        );
    }

    /// Run `count` frames back to back.
    pub fn run_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Feed `elapsed` seconds of wall-clock time and run as many whole frames
    /// as fit, up to `max_steps_per_advance`. Returns the number of frames
    /// run.
    ///
    /// When the cap is hit the backlog is dropped instead of carried over, so
    /// a long stall does not cause a spiral of catch-up frames.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }

        let dt = self.config.fixed_dt;
        let mut steps = 0;
        while self.accumulator >= dt && steps < self.config.max_steps_per_advance {
            self.tick();
            self.accumulator -= dt;
            steps += 1;
        }

        if self.accumulator >= dt {
            let dropped = (self.accumulator / dt) as u64;
            tracing::warn!(
                dropped_frames = dropped,
                max_steps = self.config.max_steps_per_advance,
                "frame loop fell behind; dropping backlog"
            );
            self.accumulator %= dt;
        }
        steps
    }

    // -- accessors ----------------------------------------------------------

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Simulated seconds, `frame_count * fixed_dt`.
    pub fn elapsed_time(&self) -> f64 {
        self.frame_counter as f64 * f64::from(self.config.fixed_dt)
    }

    /// Seconds simulated per frame.
    pub fn fixed_dt(&self) -> f32 {
        self.config.fixed_dt
    }

    /// The loop's configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Whether render and debug-UI passes are skipped.
    pub fn is_headless(&self) -> bool {
        self.config.headless
    }

    /// The driven world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the driven world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Consume the loop and hand back its world.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Timing for the most recent frame.
    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    pub(crate) fn set_frame_counter(&mut self, frame_counter: u64) {
        self.frame_counter = frame_counter;
        self.accumulator = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
