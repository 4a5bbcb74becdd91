//! Channel-fed tracker for devices that deliver samples on their own thread.
//!
//! A device thread pushes [`EyeGazesState`] values through a
//! [`TrackerFeed`]; the sampler polls the paired [`ChannelTracker`] on the
//! tick loop and only ever sees the newest state.

use crate::tracker::types::EyeGazesState;
use crate::tracker::{EyeTracker, TrackerError};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Producer half handed to the device thread.
#[derive(Clone)]
pub struct TrackerFeed {
    sender: Sender<EyeGazesState>,
    running: Arc<AtomicBool>,
}

impl TrackerFeed {
    /// Push a state without blocking.
    ///
    /// Returns false if the state was dropped because the tracker is
    /// stopped, the queue is full or the consumer is gone.
    pub fn push(&self, state: EyeGazesState) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        match self.sender.try_send(state) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half polled by the gaze sampler.
pub struct ChannelTracker {
    receiver: Receiver<EyeGazesState>,
    running: Arc<AtomicBool>,
}

/// Create a connected feed/tracker pair with the given queue capacity.
pub fn channel_tracker(capacity: usize) -> (TrackerFeed, ChannelTracker) {
    let (sender, receiver) = bounded(capacity.max(1));
    let running = Arc::new(AtomicBool::new(false));
    (
        TrackerFeed {
            sender,
            running: running.clone(),
        },
        ChannelTracker { receiver, running },
    )
}

impl ChannelTracker {
    /// Start accepting states from the feed.
    pub fn start(&mut self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stop accepting states and discard anything queued.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of states waiting to be polled.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl EyeTracker for ChannelTracker {
    fn poll(&mut self) -> Result<EyeGazesState, TrackerError> {
        if !self.is_running() {
            return Err(TrackerError::NotRunning);
        }

        let mut newest = match self.receiver.try_recv() {
            Ok(state) => state,
            Err(TryRecvError::Empty) => return Err(TrackerError::NoData),
            Err(TryRecvError::Disconnected) => return Err(TrackerError::Disconnected),
        };
        // Render ticks can run slower than the device; only the newest counts.
        while let Ok(state) = self.receiver.try_recv() {
            newest = state;
        }
        Ok(newest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::types::{Eye, PerEyeSample, Pose};

    fn state(confidence: f32) -> EyeGazesState {
        EyeGazesState::new(
            PerEyeSample::new(Eye::Left, Pose::IDENTITY, confidence),
            PerEyeSample::new(Eye::Right, Pose::IDENTITY, confidence),
        )
    }

    #[test]
    fn test_poll_before_start_fails() {
        let (feed, mut tracker) = channel_tracker(4);
        assert!(!feed.push(state(0.9)));
        assert_eq!(tracker.poll(), Err(TrackerError::NotRunning));
    }

    #[test]
    fn test_poll_returns_newest_state() {
        let (feed, mut tracker) = channel_tracker(8);
        tracker.start();
        assert!(feed.push(state(0.2)));
        assert!(feed.push(state(0.7)));

        let polled = tracker.poll().unwrap();
        assert_eq!(polled.left.confidence, 0.7);
        assert_eq!(tracker.poll(), Err(TrackerError::NoData));
    }

    #[test]
    fn test_disconnected_feed() {
        let (feed, mut tracker) = channel_tracker(2);
        tracker.start();
        drop(feed);
        assert_eq!(tracker.poll(), Err(TrackerError::Disconnected));
    }

    #[test]
    fn test_stop_drains_queue() {
        let (feed, mut tracker) = channel_tracker(4);
        tracker.start();
        feed.push(state(0.5));
        assert_eq!(tracker.pending(), 1);
        tracker.stop();
        assert_eq!(tracker.pending(), 0);
    }
}
