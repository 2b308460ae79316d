use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, trace, warn};
use scan_reticle_core::Frame;

use crate::decoder::{DecodeError, DecodeEvent, Decoder};

/// Producer of camera frames.
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Option<Frame>;
}

impl<I: Iterator<Item = Frame>> FrameSource for I {
    fn next_frame(&mut self) -> Option<Frame> {
        self.next()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    #[error("failed to spawn analyzer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What happened to an offered frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Offer {
    Accepted,
    /// A decode was already in flight; the frame was released unanalyzed.
    Dropped,
    /// The worker has stopped.
    Closed,
}

/// Serializes frames into one decoder running on a worker thread.
///
/// At most one decode request is in flight. Frames offered while the worker
/// is busy are dropped, which releases them immediately. Results come back
/// as [`DecodeEvent`]s for the owning thread to apply.
pub struct Analyzer {
    frames: Option<SyncSender<Frame>>,
    events: Receiver<DecodeEvent>,
    busy: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    dropped: u64,
}

impl Analyzer {
    pub fn spawn<D>(decoder: D) -> Result<Self, AnalyzerError>
    where
        D: Decoder + Send + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::sync_channel::<Frame>(1);
        let (event_tx, event_rx) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = busy.clone();

        let worker = thread::Builder::new()
            .name("scan-analyzer".into())
            .spawn(move || run_worker(decoder, frame_rx, event_tx, worker_busy))?;

        Ok(Self {
            frames: Some(frame_tx),
            events: event_rx,
            busy,
            worker: Some(worker),
            dropped: 0,
        })
    }

    /// True while a decode request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Frames dropped because the worker was busy.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn offer(&mut self, frame: Frame) -> Offer {
        if self.worker.as_ref().is_none_or(|w| w.is_finished()) {
            if self.frames.take().is_some() {
                warn!("analyzer worker has stopped");
            }
            return Offer::Closed;
        }
        let Some(frames) = self.frames.as_ref() else {
            return Offer::Closed;
        };
        if self.busy.swap(true, Ordering::AcqRel) {
            self.dropped += 1;
            trace!("analyzer busy, dropping frame at {:?}", frame.timestamp());
            return Offer::Dropped;
        }
        match frames.try_send(frame) {
            Ok(()) => Offer::Accepted,
            Err(TrySendError::Full(_)) => {
                // Unreachable while the busy flag is honored; the frame is
                // released on drop either way.
                self.busy.store(false, Ordering::Release);
                self.dropped += 1;
                Offer::Dropped
            }
            Err(TrySendError::Disconnected(_)) => {
                self.busy.store(false, Ordering::Release);
                warn!("analyzer worker has stopped");
                Offer::Closed
            }
        }
    }

    /// Offer the next frame of `source`; `None` when the source is empty.
    pub fn offer_next<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Option<Offer> {
        source.next_frame().map(|frame| self.offer(frame))
    }

    pub fn try_recv_event(&self) -> Option<DecodeEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<DecodeEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Stop accepting frames and wait for the worker to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.frames.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("analyzer worker panicked");
            }
        }
    }
}

impl Drop for Analyzer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<D: Decoder>(
    mut decoder: D,
    frames: Receiver<Frame>,
    events: mpsc::Sender<DecodeEvent>,
    busy: Arc<AtomicBool>,
) {
    for frame in frames {
        let timestamp = frame.timestamp();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            decoder.process(&frame.input_image())
        }))
        .unwrap_or_else(|_| {
            warn!("decoder panicked on frame at {:?}", timestamp);
            Err(DecodeError::Failed("decoder panicked".into()))
        });
        drop(frame);
        if let Err(err) = &outcome {
            debug!("decode at {:?} failed: {}", timestamp, err);
        }
        // Idle before the event is visible, so a consumer reacting to it can
        // offer the next frame straight away.
        busy.store(false, Ordering::Release);
        if events.send(DecodeEvent { timestamp, outcome }).is_err() {
            break;
        }
    }
    debug!("analyzer worker exiting");
}
