//! Frame pacing engine
//!
//! Reconciles the decoder's bursty frame arrivals with the display's
//! fixed refresh cadence. Decoded frames are buffered in a small
//! bounded pacing queue, promoted to a single-slot render queue on each
//! vsync tick, and drawn by the renderer with a one-cycle deferred
//! free. A drop policy absorbs overload and an optional repetition path
//! absorbs producer stalls, so neither the decoder nor the display is
//! ever blocked on the other.
//!
//! All shared mutable state lives behind one exclusive lock; the
//! critical sections are short and the queues tiny, so finer-grained
//! locking buys nothing here.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::config::schema::FrameDropPolicy;
use crate::config::SettingsStore;
use crate::error::{PacerError, Result};
use crate::stats::{DepthHistory, PacerTelemetry, VideoStats};
use crate::utils::LogThrottler;
use crate::{info_throttled, warn_throttled};

use super::adaptive::{AdaptiveController, AdaptiveStatus, PacingParams};
use super::frame::VideoFrame;
use super::renderer::{Renderer, RendererAttributes};
use super::vsync::{SurfaceHandle, SyncVsyncSource, VsyncProvider};

/// Render-queue occupancy bound: one frame in flight to the renderer
const RENDER_QUEUE_BOUND: usize = 1;
/// Queue-depth history capacity (one sample per vsync tick)
const DEPTH_HISTORY_SAMPLES: usize = 240;
/// Throttle interval for overload and stall logging
const LOG_THROTTLE_SECS: u64 = 5;

/// Pacer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    /// Constructed, not yet initialized
    Idle,
    /// Vsync source bound, worker threads starting
    Initialized,
    /// Accepting and promoting frames
    Running,
    /// Teardown requested, workers draining
    Stopping,
    /// Workers joined, all frames released
    Stopped,
}

/// Queue state guarded by the single pacer lock
struct QueueState {
    /// Frames awaiting their vsync slot, oldest first
    pacing: VecDeque<VideoFrame>,
    /// Handoff to the render dispatcher
    render: VecDeque<VideoFrame>,
    /// Last rendered frame, freed one render cycle late
    deferred_free: Option<VideoFrame>,
    /// True while the dispatcher is inside the renderer, outside the lock
    rendering: bool,
    pacing_history: DepthHistory,
    render_history: DepthHistory,
    /// Live parameters; swapped atomically with policy under this lock
    params: PacingParams,
    stall_detected: bool,
    last_arrival: Option<Instant>,
    stopping: bool,
    pacing_enabled: bool,
    /// Display refresh interval
    frame_interval: Duration,
    /// Expected frame arrival interval from the producer
    stream_interval: Duration,
}

impl QueueState {
    fn new(params: PacingParams) -> Self {
        Self {
            pacing: VecDeque::new(),
            render: VecDeque::new(),
            deferred_free: None,
            rendering: false,
            pacing_history: DepthHistory::new(DEPTH_HISTORY_SAMPLES),
            render_history: DepthHistory::new(DEPTH_HISTORY_SAMPLES),
            params,
            stall_detected: false,
            last_arrival: None,
            stopping: false,
            pacing_enabled: true,
            frame_interval: Duration::from_micros(16_667),
            stream_interval: Duration::from_micros(16_667),
        }
    }
}

/// State shared with the worker threads and vsync tickers
struct PacerShared {
    queues: Mutex<QueueState>,
    pacing_not_empty: Condvar,
    render_not_empty: Condvar,
    renderer: Arc<dyn Renderer>,
    stats: Arc<VideoStats>,
    throttle: LogThrottler,
}

impl PacerShared {
    /// One vsync tick: wait briefly for a frame, promote the head of
    /// the pacing queue into the render queue, sample telemetry.
    ///
    /// Runs on the vsync thread for synchronous sources and on the
    /// source's own thread for asynchronous ones.
    fn handle_vsync(&self) {
        let mut q = self.queues.lock();
        if q.stopping {
            return;
        }

        // A frame landing mid-interval is promoted on this tick rather
        // than the next; the wait budget ends where the next tick begins.
        let deadline = Instant::now() + q.frame_interval;
        while q.pacing.is_empty() && !q.stopping {
            if self
                .pacing_not_empty
                .wait_until(&mut q, deadline)
                .timed_out()
            {
                break;
            }
        }
        if q.stopping {
            return;
        }

        let pacing_depth = q.pacing.len() as u16;
        let render_depth = q.render.len() as u16;
        q.pacing_history.push(pacing_depth);
        q.render_history.push(render_depth);

        match q.pacing.pop_front() {
            Some(frame) => {
                trace!(sequence = frame.sequence, "Promoting frame to render queue");
                self.enqueue_for_rendering(&mut q, frame);
            }
            // Nothing to promote is normal under low load; it only
            // matters once the producer has been quiet for too long.
            None => self.check_stall(&mut q),
        }
    }

    /// Hand a frame to the render dispatcher, evicting a stale frame if
    /// the renderer has fallen behind the handoff bound.
    fn enqueue_for_rendering(&self, q: &mut QueueState, frame: VideoFrame) {
        while q.render.len() >= RENDER_QUEUE_BOUND {
            if let Some(stale) = q.render.pop_front() {
                self.stats.record_dropped(1);
                warn_throttled!(
                    self.throttle,
                    "render_overflow",
                    "Renderer falling behind, dropped queued frame {}",
                    stale.sequence
                );
            }
        }
        q.render.push_back(frame);
        self.render_not_empty.notify_one();
    }

    /// Declare a producer stall once arrivals have been quiet past the
    /// threshold, and re-present the last rendered frame if the
    /// RepeatLast policy is active.
    fn check_stall(&self, q: &mut QueueState) {
        let Some(last_arrival) = q.last_arrival else {
            return;
        };
        let threshold = q.params.stall_threshold(q.stream_interval);
        if last_arrival.elapsed() < threshold {
            return;
        }

        if !q.stall_detected {
            q.stall_detected = true;
            warn_throttled!(
                self.throttle,
                "producer_stall",
                "No frame for {:?} (threshold {:?}), producer stall detected",
                last_arrival.elapsed(),
                threshold
            );
        }

        // Re-presentation is the stall substitute for fresh content; it
        // never runs while a frame is queued or being drawn, so arrival
        // order of real frames is unaffected.
        if q.params.drop_policy == FrameDropPolicy::RepeatLast
            && q.params.frame_repetition
            && q.render.is_empty()
            && !q.rendering
        {
            if let Some(frame) = q.deferred_free.take() {
                trace!(sequence = frame.sequence, "Re-presenting last rendered frame");
                q.render.push_back(frame);
                self.stats.record_repeated();
                self.render_not_empty.notify_one();
            }
        }
    }

    /// Draw one frame and rotate the deferred-free slot
    fn render_one(&self, q: &mut MutexGuard<'_, QueueState>, frame: VideoFrame) {
        q.rendering = true;
        // Draw outside the lock so submit and vsync never wait on the
        // renderer.
        MutexGuard::unlocked(q, || {
            self.renderer.render_frame(&frame);
        });
        q.rendering = false;
        self.stats.record_rendered();

        // The frame just drawn replaces the previous occupant, which is
        // only now safe to free: the renderer's pipeline may still
        // reference the prior buffer until this draw completed.
        let retired = q.deferred_free.replace(frame);
        drop(retired);
    }
}

/// Dedicated render thread body
fn render_loop(shared: Arc<PacerShared>) {
    debug!("Render thread started");
    let mut q = shared.queues.lock();
    loop {
        while q.render.is_empty() && !q.stopping {
            shared.render_not_empty.wait(&mut q);
        }
        if q.stopping {
            break;
        }
        if let Some(frame) = q.render.pop_front() {
            shared.render_one(&mut q, frame);
        }
    }
    drop(q);
    debug!("Render thread exiting");
}

/// Dedicated vsync thread body for synchronous sources
fn vsync_loop(shared: Arc<PacerShared>, mut source: Box<dyn SyncVsyncSource>) {
    debug!("Vsync thread started");
    loop {
        if shared.queues.lock().stopping {
            break;
        }
        // Block for the refresh outside the lock
        source.wait_for_vsync();
        shared.handle_vsync();
    }
    debug!("Vsync thread exiting");
}

/// Push handle handed to asynchronous vsync sources
///
/// Each `tick` announces one display refresh and runs the promotion
/// step on the calling thread.
#[derive(Clone)]
pub struct VsyncTicker {
    shared: Arc<PacerShared>,
}

impl VsyncTicker {
    /// Announce one display refresh
    pub fn tick(&self) {
        self.shared.handle_vsync();
    }
}

/// Frame pacing engine
///
/// Sits between the decoder and the renderer: the decoder calls
/// [`submit_frame`] from its own thread, the engine promotes frames on
/// the vsync cadence, and the renderer is invoked from the engine's
/// render thread or from the application's main thread via
/// [`render_on_main_thread`].
///
/// [`submit_frame`]: Pacer::submit_frame
/// [`render_on_main_thread`]: Pacer::render_on_main_thread
pub struct Pacer {
    shared: Arc<PacerShared>,
    controller: Mutex<AdaptiveController>,
    state_tx: watch::Sender<PacerState>,
    state_rx: watch::Receiver<PacerState>,
    vsync_thread: Mutex<Option<JoinHandle<()>>>,
    render_thread: Mutex<Option<JoinHandle<()>>>,
    /// Kept alive so an async source keeps delivering ticks
    async_source: Mutex<Option<Box<dyn super::vsync::AsyncVsyncSource>>>,
}

impl Pacer {
    /// Create a pacer with fixed behavior (constant queue depth,
    /// DropOldest policy)
    pub fn new(renderer: Arc<dyn Renderer>, stats: Arc<VideoStats>) -> Self {
        Self::build(renderer, stats, AdaptiveController::fixed())
    }

    /// Create a pacer with the adaptive capability bound to a settings
    /// store
    pub fn with_adaptive(
        renderer: Arc<dyn Renderer>,
        stats: Arc<VideoStats>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self::build(renderer, stats, AdaptiveController::adaptive(settings))
    }

    fn build(
        renderer: Arc<dyn Renderer>,
        stats: Arc<VideoStats>,
        controller: AdaptiveController,
    ) -> Self {
        let params = controller.current_params();
        let (state_tx, state_rx) = watch::channel(PacerState::Idle);
        Self {
            shared: Arc::new(PacerShared {
                queues: Mutex::new(QueueState::new(params)),
                pacing_not_empty: Condvar::new(),
                render_not_empty: Condvar::new(),
                renderer,
                stats,
                throttle: LogThrottler::with_secs(LOG_THROTTLE_SECS),
            }),
            controller: Mutex::new(controller),
            state_tx,
            state_rx,
            vsync_thread: Mutex::new(None),
            render_thread: Mutex::new(None),
            async_source: Mutex::new(None),
        }
    }

    /// One-time setup: bind the vsync source and start the worker
    /// threads
    ///
    /// With `enable_pacing` false the pacing queue and vsync machinery
    /// are bypassed entirely and submitted frames go straight to the
    /// render dispatcher. On error no worker threads remain and the
    /// engine transitions to `Stopped`; it performs no further work.
    pub fn initialize(
        &self,
        vsync: VsyncProvider,
        surface: SurfaceHandle,
        display_refresh_hz: u32,
        max_video_fps: u32,
        enable_pacing: bool,
    ) -> Result<()> {
        if self.state() != PacerState::Idle {
            return Err(PacerError::AlreadyInitialized);
        }
        match self.try_initialize(vsync, surface, display_refresh_hz, max_video_fps, enable_pacing)
        {
            Ok(()) => {
                self.state_tx.send_replace(PacerState::Running);
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    fn try_initialize(
        &self,
        vsync: VsyncProvider,
        surface: SurfaceHandle,
        display_refresh_hz: u32,
        max_video_fps: u32,
        enable_pacing: bool,
    ) -> Result<()> {
        info!(
            display_refresh_hz,
            max_video_fps, enable_pacing, "Initializing pacer"
        );
        if display_refresh_hz == 0 {
            return Err(PacerError::VsyncInit(
                "display refresh rate must be non-zero".to_string(),
            ));
        }

        {
            let mut q = self.shared.queues.lock();
            q.frame_interval = Duration::from_secs_f64(1.0 / f64::from(display_refresh_hz));
            q.stream_interval = Duration::from_secs_f64(1.0 / f64::from(max_video_fps.max(1)));
            q.pacing_enabled = enable_pacing;
        }

        // Bind the vsync source first so the common failure starts no
        // threads at all.
        let sync_source = if enable_pacing {
            match vsync {
                VsyncProvider::Sync(mut source) => {
                    source.initialize(surface, display_refresh_hz)?;
                    Some(source)
                }
                VsyncProvider::Async(mut source) => {
                    let ticker = VsyncTicker {
                        shared: Arc::clone(&self.shared),
                    };
                    source.initialize(surface, display_refresh_hz, ticker)?;
                    *self.async_source.lock() = Some(source);
                    None
                }
            }
        } else {
            None
        };
        self.state_tx.send_replace(PacerState::Initialized);

        let attrs = self.shared.renderer.attributes();
        if attrs.contains(RendererAttributes::MAIN_THREAD_RENDERING) {
            debug!("Renderer draws on the owning thread, skipping render thread");
        } else {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name("pacer-render".to_string())
                .spawn(move || render_loop(shared))
                .map_err(|source| PacerError::ThreadSpawn {
                    thread: "pacer-render",
                    source,
                })?;
            *self.render_thread.lock() = Some(handle);
        }

        if let Some(source) = sync_source {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name("pacer-vsync".to_string())
                .spawn(move || vsync_loop(shared, source))
                .map_err(|source| PacerError::ThreadSpawn {
                    thread: "pacer-vsync",
                    source,
                })?;
            *self.vsync_thread.lock() = Some(handle);
        }

        Ok(())
    }

    /// Producer entry point; takes ownership of the frame
    ///
    /// Never fails: overload is absorbed by the drop policy, and an
    /// empty (invalid) handle is counted and discarded.
    pub fn submit_frame(&self, frame: VideoFrame) {
        if frame.is_empty() {
            self.shared.stats.record_invalid();
            debug!(sequence = frame.sequence, "Discarding empty frame handle");
            return;
        }

        let shared = &self.shared;
        let mut q = shared.queues.lock();
        if q.stopping {
            trace!(sequence = frame.sequence, "Pacer stopping, releasing frame");
            return;
        }

        shared.stats.record_submitted();
        q.last_arrival = Some(Instant::now());
        if q.stall_detected {
            q.stall_detected = false;
            info_throttled!(
                shared.throttle,
                "producer_recovered",
                "Producer resumed frame delivery"
            );
        }

        if !q.pacing_enabled {
            shared.enqueue_for_rendering(&mut q, frame);
            return;
        }

        let depth = q.params.queue_depth;
        if q.pacing.len() >= depth {
            match q.params.drop_policy {
                FrameDropPolicy::DropNewest => {
                    shared.stats.record_dropped(1);
                    warn_throttled!(
                        shared.throttle,
                        "pacing_overflow",
                        "Pacing queue full (depth {}), discarding incoming frame {}",
                        depth,
                        frame.sequence
                    );
                    return;
                }
                // Repetition is a stall-path substitute; overflow under
                // RepeatLast evicts the head like DropOldest.
                FrameDropPolicy::DropOldest | FrameDropPolicy::RepeatLast => {
                    let mut evicted: u64 = 0;
                    while q.pacing.len() >= depth {
                        if let Some(stale) = q.pacing.pop_front() {
                            trace!(sequence = stale.sequence, "Evicting oldest queued frame");
                            evicted += 1;
                        }
                    }
                    shared.stats.record_dropped(evicted);
                    warn_throttled!(
                        shared.throttle,
                        "pacing_overflow",
                        "Pacing queue full (depth {}), evicted {} oldest frame(s)",
                        depth,
                        evicted
                    );
                }
            }
        }

        q.pacing.push_back(frame);
        shared.pacing_not_empty.notify_one();
    }

    /// Announce a vsync tick from an asynchronous source's thread
    pub fn signal_vsync(&self) {
        self.shared.handle_vsync();
    }

    /// Cooperative poll for main-thread-bound renderers
    ///
    /// Performs one dequeue/draw/free cycle; returns immediately when
    /// the render queue is empty.
    pub fn render_on_main_thread(&self) {
        let shared = &self.shared;
        let mut q = shared.queues.lock();
        if q.stopping {
            return;
        }
        if let Some(frame) = q.render.pop_front() {
            shared.render_one(&mut q, frame);
        }
    }

    /// Attach the adaptive settings store and apply its current values
    pub fn set_adaptive_preferences(&self, store: Arc<SettingsStore>) {
        self.controller.lock().attach_store(store);
        self.update_adaptive_settings();
    }

    /// Re-read the settings store and republish the live parameters
    ///
    /// A reduced queue depth takes effect for subsequent submits; an
    /// over-full queue shrinks as frames drain or the drop policy runs.
    pub fn update_adaptive_settings(&self) {
        let params = self.controller.lock().current_params();
        let mut q = self.shared.queues.lock();
        if q.params != params {
            info!(
                queue_depth = params.queue_depth,
                drop_policy = ?params.drop_policy,
                frame_repetition = params.frame_repetition,
                "Pacing parameters updated"
            );
            q.params = params;
        }
    }

    /// Queue depth currently enforced
    pub fn effective_queue_depth(&self) -> usize {
        self.shared.queues.lock().params.queue_depth
    }

    /// Check whether the adaptive capability is present
    pub fn is_adaptive(&self) -> bool {
        self.controller.lock().is_adaptive()
    }

    /// Runtime adaptive readback for UI overlays
    pub fn adaptive_status(&self) -> AdaptiveStatus {
        let q = self.shared.queues.lock();
        AdaptiveStatus {
            effective_queue_depth: q.params.queue_depth,
            stall_detected: q.stall_detected,
            frames_repeated: self.shared.stats.frames_repeated(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PacerState {
        *self.state_rx.borrow()
    }

    /// Subscribe to lifecycle state changes
    pub fn state_watch(&self) -> watch::Receiver<PacerState> {
        self.state_rx.clone()
    }

    /// Current pacing-queue occupancy
    pub fn pacing_queue_len(&self) -> usize {
        self.shared.queues.lock().pacing.len()
    }

    /// Current render-queue occupancy
    pub fn render_queue_len(&self) -> usize {
        self.shared.queues.lock().render.len()
    }

    /// Counters and queue-depth history for the telemetry sink
    pub fn telemetry(&self) -> PacerTelemetry {
        let q = self.shared.queues.lock();
        PacerTelemetry {
            stats: self.shared.stats.snapshot(),
            pacing_depth_history: q.pacing_history.to_vec(),
            render_depth_history: q.render_history.to_vec(),
        }
    }

    /// Tear down: stop both workers, join them, release all owned
    /// frames. Idempotent; also runs on drop.
    pub fn stop(&self) {
        let prior = self.state();
        if prior == PacerState::Stopped {
            return;
        }
        if matches!(prior, PacerState::Initialized | PacerState::Running) {
            info!("Stopping pacer");
            self.state_tx.send_replace(PacerState::Stopping);
        }

        {
            let mut q = self.shared.queues.lock();
            q.stopping = true;
            self.shared.pacing_not_empty.notify_all();
            self.shared.render_not_empty.notify_all();
        }

        if let Some(handle) = self.vsync_thread.lock().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.render_thread.lock().take() {
            let _ = handle.join();
        }
        // Dropping the source stops an async provider from ticking
        self.async_source.lock().take();

        {
            let mut q = self.shared.queues.lock();
            let released =
                q.pacing.len() + q.render.len() + usize::from(q.deferred_free.is_some());
            q.pacing.clear();
            q.render.clear();
            q.deferred_free = None;
            if released > 0 {
                debug!(released, "Released queued frames on teardown");
            }
        }

        self.state_tx.send_replace(PacerState::Stopped);
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        self.stop();
    }
}
