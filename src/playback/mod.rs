pub mod controller;

pub use controller::{PlaybackController, RenderSink};

use std::time::Duration;

/// Playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Paused,
    Playing,
}

/// Delay between auto-advance ticks. Fixed-delay: the next tick is scheduled
/// after the previous render completes, so a slow frame delays the next tick
/// rather than skipping or doubling it.
pub const TICK_DELAY: Duration = Duration::from_millis(1000);
