use crate::buffers::PacketBatch;
use crate::core::{AcquisitionError, Frame, FrameAssembler};
use crate::engine::{AcquisitionConfig, AcquisitionState, CancelToken, Pacer, SharedState};
use crate::hal::{ProbeSource, ReadStatus, Session};
use crate::observability::AcquisitionMetrics;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub type FrameResult = Result<Frame, AcquisitionError>;

/// How an acquisition session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The device reported end of stream
    Drained,
    /// Cancelled by the caller, or the consumer went away
    Cancelled,
    /// A fatal error was delivered to the consumer
    Faulted,
}

/// Summary returned by the worker once the session is closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub exit: ExitReason,
    pub frames_emitted: u64,
    pub packets_read: u64,
}

/// Ordered, single-consumer sequence of frames.
///
/// Ends with `None` on end of stream or cancellation; a fault arrives as a
/// final `Err` item before the end.
pub struct FrameStream {
    rx: mpsc::UnboundedReceiver<FrameResult>,
}

impl FrameStream {
    pub async fn next(&mut self) -> Option<FrameResult> {
        self.rx.recv().await
    }

    /// Blocking variant for callers outside an async runtime
    pub fn blocking_next(&mut self) -> Option<FrameResult> {
        self.rx.blocking_recv()
    }
}

/// Real-time acquisition loop bound to one hardware source
pub struct AcquisitionLoop<S: ProbeSource> {
    source: S,
    config: AcquisitionConfig,
}

impl<S: ProbeSource + 'static> AcquisitionLoop<S> {
    pub fn new(source: S, config: AcquisitionConfig) -> Result<Self, AcquisitionError> {
        config.validate_for(source.packet_shape())?;
        Ok(Self { source, config })
    }

    /// Spawn the dedicated worker thread and start streaming frames
    pub fn start(self) -> Result<Acquisition, AcquisitionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let metrics = Arc::new(AcquisitionMetrics::new());
        let state = Arc::new(SharedState::new());

        let worker = Worker {
            session: Session::new(self.source),
            config: self.config,
            tx,
            cancel: cancel.clone(),
            metrics: metrics.clone(),
            state: state.clone(),
        };

        // If the spawn fails the worker is dropped here and its session closed.
        let handle = thread::Builder::new()
            .name("npx-acquisition".to_string())
            .spawn(move || worker.run())
            .map_err(AcquisitionError::Spawn)?;

        Ok(Acquisition {
            frames: FrameStream { rx },
            cancel,
            metrics,
            state,
            worker: Some(handle),
        })
    }
}

/// Caller-side handle of a running acquisition. Dropping it cancels.
pub struct Acquisition {
    frames: FrameStream,
    cancel: CancelToken,
    metrics: Arc<AcquisitionMetrics>,
    state: Arc<SharedState>,
    worker: Option<JoinHandle<SessionReport>>,
}

impl Acquisition {
    pub async fn next_frame(&mut self) -> Option<FrameResult> {
        self.frames.next().await
    }

    pub fn blocking_next_frame(&mut self) -> Option<FrameResult> {
        self.frames.blocking_next()
    }

    pub fn frames(&mut self) -> &mut FrameStream {
        &mut self.frames
    }

    /// Request a stop; acknowledged asynchronously by the worker
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> AcquisitionState {
        self.state.get()
    }

    pub fn metrics(&self) -> Arc<AcquisitionMetrics> {
        self.metrics.clone()
    }

    /// Wait for the worker to close the session.
    ///
    /// Blocks until the source drains, faults or the acquisition is
    /// cancelled. Returns `None` if the worker panicked.
    pub fn join(mut self) -> Option<SessionReport> {
        let handle = self.worker.take()?;
        handle.join().ok()
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker<S: ProbeSource> {
    session: Session<S>,
    config: AcquisitionConfig,
    tx: mpsc::UnboundedSender<FrameResult>,
    cancel: CancelToken,
    metrics: Arc<AcquisitionMetrics>,
    state: Arc<SharedState>,
}

impl<S: ProbeSource> Worker<S> {
    fn run(mut self) -> SessionReport {
        info!(
            frequency_hz = self.config.frequency_hz,
            buffer_size = self.config.buffer_size,
            "starting acquisition"
        );

        // A panic on this thread still faults and closes the session.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.acquire()))
            .unwrap_or_else(|payload| {
                Err(AcquisitionError::WorkerPanicked(panic_message(payload.as_ref())))
            });
        let exit = match &outcome {
            Ok(exit) => *exit,
            Err(_) => ExitReason::Faulted,
        };
        self.state.advance(match exit {
            ExitReason::Drained => AcquisitionState::Draining,
            ExitReason::Cancelled => AcquisitionState::Cancelled,
            ExitReason::Faulted => AcquisitionState::Faulted,
        });

        if let Err(e) = self.session.close() {
            warn!(error = %e, "failed to close hardware session");
        }
        self.state.advance(AcquisitionState::Closed);

        // Errors reach the consumer only after the session is released.
        if let Err(e) = outcome {
            let cause = std::error::Error::source(&e).map(ToString::to_string);
            error!(error = %e, cause = ?cause, "acquisition faulted");
            let _ = self.tx.send(Err(e));
        }

        let report = SessionReport {
            exit,
            frames_emitted: self.metrics.frames_emitted(),
            packets_read: self.metrics.packets_read(),
        };
        info!(
            exit = ?report.exit,
            frames = report.frames_emitted,
            packets = report.packets_read,
            "acquisition finished"
        );
        report
    }

    fn acquire(&mut self) -> Result<ExitReason, AcquisitionError> {
        self.session.open().map_err(AcquisitionError::Open)?;
        self.state.advance(AcquisitionState::Armed);

        let shape = self.session.packet_shape();
        self.config.validate_for(shape)?;
        let assembler = FrameAssembler::new(shape);
        let mut batch = PacketBatch::new(shape, self.config.buffer_size);
        let pacer = Pacer::new(self.config.frequency_hz, shape.samples, batch.len());
        let poll_interval = self.config.effective_poll_interval();
        let mut capacity = 0.0f32;
        let mut cycle: u64 = 0;

        debug!(%shape, budget = ?pacer.budget(), poll_interval, "acquisition armed");
        self.state.advance(AcquisitionState::Running);

        loop {
            if self.cancel.is_cancelled() {
                return Ok(ExitReason::Cancelled);
            }

            let started = self.metrics.start_cycle();
            if cycle % poll_interval == 0 {
                capacity = self.poll_capacity(capacity);
            }

            for packet in batch.iter_mut() {
                match self
                    .session
                    .read_packet(packet)
                    .map_err(AcquisitionError::HardwareRead)?
                {
                    ReadStatus::Filled => self.metrics.record_packets_read(1),
                    ReadStatus::EndOfStream => {
                        debug!(cycle, "device reported end of stream");
                        return Ok(ExitReason::Drained);
                    }
                }
            }

            // A batch is atomic: once cancelled it is discarded, never emitted.
            if self.cancel.is_cancelled() {
                debug!(cycle, packets = batch.len(), "discarding batch read during cancellation");
                return Ok(ExitReason::Cancelled);
            }

            let mut frame = assembler.assemble(batch.packets(), capacity)?;
            frame.sequence_id = cycle;
            if self.tx.send(Ok(frame)).is_err() {
                debug!(cycle, "frame consumer dropped");
                return Ok(ExitReason::Cancelled);
            }
            self.metrics.record_frame_emitted();
            let elapsed = self.metrics.finish_cycle(started);
            cycle += 1;

            match pacer.remaining(elapsed) {
                Some(remaining) => {
                    if self.cancel.wait_timeout(remaining) {
                        return Ok(ExitReason::Cancelled);
                    }
                }
                None => {
                    if pacer.is_overrun(elapsed) {
                        self.metrics.record_overrun();
                    }
                }
            }
        }
    }

    fn poll_capacity(&mut self, previous: f32) -> f32 {
        match self.session.queue_fill_level() {
            Ok(level) => {
                self.metrics.record_capacity(level);
                debug!(level, "polled hardware queue fill level");
                level
            }
            Err(e) => {
                warn!(error = %e, "queue fill level poll failed");
                previous
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
