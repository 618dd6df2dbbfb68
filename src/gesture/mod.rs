//! Gesture classification
//!
//! A worker thread receives JPEG frames through a rendezvous channel and
//! posts them to a remote multimodal classifier. The zero-capacity channel
//! is the busy flag: a submission is only accepted while the worker sits
//! idle in `recv()`, so overlapping calls are discarded instead of queued.
//! The worker publishes its latest reading into a shared slot; failures
//! leave the previous reading in place.

pub mod remote;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::config::ClassifierConfig;
use crate::effects::tree_morph::DisplayMode;
use remote::RemoteClassifier;

/// Gesture classes the remote service reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Gesture {
    OpenPalm,
    ClosedFist,
    /// No hand visible or ambiguous response
    #[default]
    None,
}

/// Map a gesture to the display mode it requests, if any
pub fn mode_for_gesture(gesture: Gesture) -> Option<DisplayMode> {
    match gesture {
        Gesture::OpenPalm => Some(DisplayMode::Chaos),
        Gesture::ClosedFist => Some(DisplayMode::Formed),
        Gesture::None => None,
    }
}

/// Latest classifier output
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureReading {
    pub gesture: Gesture,
    /// Increments on every completed classification
    pub seq: u64,
}

/// Handle to the classifier worker thread
pub struct GestureClassifier {
    latest: Arc<Mutex<GestureReading>>,
    frame_sender: Option<Sender<Vec<u8>>>,
    /// Remote client constructed successfully
    ready: Arc<AtomicBool>,
    /// A call is in flight
    busy: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl GestureClassifier {
    /// Spawn the worker thread. The remote client is built on the worker so
    /// a slow TLS setup never stalls the render loop.
    pub fn new(config: ClassifierConfig) -> Result<Self, String> {
        let latest = Arc::new(Mutex::new(GestureReading::default()));
        let ready = Arc::new(AtomicBool::new(false));
        let busy = Arc::new(AtomicBool::new(false));

        // Zero capacity: try_send succeeds only while the worker is idle
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded::<Vec<u8>>(0);

        let latest_clone = latest.clone();
        let ready_clone = ready.clone();
        let busy_clone = busy.clone();

        let thread_handle = std::thread::Builder::new()
            .name("gesture-classifier".to_string())
            .spawn(move || {
                Self::worker_thread(config, frame_receiver, latest_clone, ready_clone, busy_clone);
            })
            .map_err(|e| format!("Failed to spawn classifier thread: {}", e))?;

        Ok(Self {
            latest,
            frame_sender: Some(frame_sender),
            ready,
            busy,
            thread_handle: Some(thread_handle),
        })
    }

    fn worker_thread(
        config: ClassifierConfig,
        frame_receiver: Receiver<Vec<u8>>,
        latest: Arc<Mutex<GestureReading>>,
        ready: Arc<AtomicBool>,
        busy: Arc<AtomicBool>,
    ) {
        log::info!("Gesture classifier thread started");

        let client = match RemoteClassifier::new(&config) {
            Ok(c) => {
                ready.store(true, Ordering::Release);
                c
            }
            Err(e) => {
                log::warn!("Gesture classification disabled: {}", e);
                // Drain submissions so senders never block on a dead worker
                while frame_receiver.recv().is_ok() {}
                return;
            }
        };

        while let Ok(jpeg) = frame_receiver.recv() {
            busy.store(true, Ordering::Release);
            match client.classify(&jpeg) {
                Ok(gesture) => {
                    let mut reading = latest.lock();
                    reading.gesture = gesture;
                    reading.seq += 1;
                }
                Err(e) => {
                    // Best effort: the next poll tick is the only retry
                    log::debug!("Gesture classification failed: {}", e);
                }
            }
            busy.store(false, Ordering::Release);
        }

        ready.store(false, Ordering::Release);
        log::info!("Gesture classifier thread stopped");
    }

    /// Submit a JPEG frame. Returns false if a call is already in flight
    /// (the frame is discarded, not queued).
    pub fn submit(&self, jpeg: Vec<u8>) -> bool {
        match &self.frame_sender {
            Some(sender) => sender.try_send(jpeg).is_ok(),
            None => false,
        }
    }

    /// Latest reading published by the worker
    pub fn latest(&self) -> GestureReading {
        *self.latest.lock()
    }

    /// Remote client is up
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// A classification call is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Stop the worker thread
    pub fn stop(&mut self) {
        // Dropping the sender ends the recv loop
        self.frame_sender = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for GestureClassifier {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_for_gesture() {
        assert_eq!(mode_for_gesture(Gesture::OpenPalm), Some(DisplayMode::Chaos));
        assert_eq!(
            mode_for_gesture(Gesture::ClosedFist),
            Some(DisplayMode::Formed)
        );
        assert_eq!(mode_for_gesture(Gesture::None), None);
    }

    #[test]
    fn test_default_reading() {
        let reading = GestureReading::default();
        assert_eq!(reading.gesture, Gesture::None);
        assert_eq!(reading.seq, 0);
    }

    #[test]
    fn test_rendezvous_busy_discard() {
        // The zero-capacity channel only accepts a value while the worker is
        // parked in recv(); a worker mid-call rejects the submission.
        let (tx, rx) = crossbeam_channel::bounded::<u32>(0);
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = std::thread::spawn(move || {
            while rx.recv().is_ok() {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            }
        });

        // Worker idle: the submission is eventually accepted
        while tx.try_send(1).is_err() {
            std::thread::yield_now();
        }
        started_rx.recv().unwrap();

        // Worker busy: the submission is discarded
        assert!(tx.try_send(2).is_err());

        release_tx.send(()).unwrap();
        drop(tx);
        handle.join().unwrap();
    }
}
