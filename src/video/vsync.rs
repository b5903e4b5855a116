//! Vsync signal sources
//!
//! A vsync source tells the pacer when the display can accept a new
//! image. Sources come in two typed variants: synchronous sources
//! expose a blocking wait the pacer's vsync thread parks on, and
//! asynchronous sources push ticks from their own thread through a
//! [`VsyncTicker`]. Each variant only exposes the operations valid for
//! it, so calling a blocking wait on a push-driven source is not
//! representable.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PacerError, Result};

pub use super::pacer::VsyncTicker;

/// Opaque handle to the platform window/surface the display is bound to
///
/// The pacer never interprets the value; it is forwarded verbatim to
/// the vsync source, which knows which windowing backend produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(pub u64);

/// Synchronous vsync source
///
/// The pacer runs a dedicated thread that calls [`wait_for_vsync`]
/// in a loop; each return marks one display refresh.
///
/// [`wait_for_vsync`]: SyncVsyncSource::wait_for_vsync
pub trait SyncVsyncSource: Send {
    /// Bind to the display surface; called once before the first wait
    fn initialize(&mut self, surface: SurfaceHandle, display_refresh_hz: u32) -> Result<()>;

    /// Block until the next display refresh
    fn wait_for_vsync(&mut self);
}

/// Asynchronous vsync source
///
/// The source delivers ticks by invoking [`VsyncTicker::tick`] from its
/// own execution context, once per display refresh. The pacer spawns no
/// vsync thread for this variant; promotion runs on the source's
/// thread.
pub trait AsyncVsyncSource: Send {
    /// Bind to the display surface and retain `ticker` for delivery
    fn initialize(
        &mut self,
        surface: SurfaceHandle,
        display_refresh_hz: u32,
        ticker: VsyncTicker,
    ) -> Result<()>;
}

/// Either kind of vsync source, as configured by the platform layer
pub enum VsyncProvider {
    Sync(Box<dyn SyncVsyncSource>),
    Async(Box<dyn AsyncVsyncSource>),
}

impl VsyncProvider {
    /// Check if this provider pushes ticks from its own thread
    pub fn is_async(&self) -> bool {
        matches!(self, VsyncProvider::Async(_))
    }
}

/// Timer-driven fallback vsync source
///
/// Paces off the monotonic clock at the display refresh interval, for
/// platforms without a usable native vsync signal. The schedule is
/// absolute (each tick is one interval after the previous deadline, not
/// after wakeup), so sleep overshoot does not accumulate drift; after a
/// long stall the schedule resets instead of bursting ticks.
pub struct TimerVsyncSource {
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl TimerVsyncSource {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_micros(16_667),
            next_deadline: None,
        }
    }
}

impl Default for TimerVsyncSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncVsyncSource for TimerVsyncSource {
    fn initialize(&mut self, _surface: SurfaceHandle, display_refresh_hz: u32) -> Result<()> {
        if display_refresh_hz == 0 {
            return Err(PacerError::VsyncInit(
                "display refresh rate must be non-zero".to_string(),
            ));
        }
        self.interval = Duration::from_secs_f64(1.0 / f64::from(display_refresh_hz));
        self.next_deadline = Some(Instant::now() + self.interval);
        Ok(())
    }

    fn wait_for_vsync(&mut self) {
        let interval = self.interval;
        let deadline = self
            .next_deadline
            .get_or_insert_with(|| Instant::now() + interval);

        let now = Instant::now();
        if *deadline > now {
            thread::sleep(*deadline - now);
        }

        let mut next = *deadline + interval;
        if next < Instant::now() {
            // Overslept past a full interval; reset the schedule
            next = Instant::now() + interval;
        }
        *deadline = next;
    }
}
