use std::sync::mpsc::{Receiver, TryRecvError};

#[derive(Debug, PartialEq)]
pub(in crate::app) enum BuildPoll<T> {
    Idle,
    Pending,
    Finished(T),
    /// The worker went away without sending a result.
    Lost,
}

/// One background build at a time.
///
/// Requests made while a build runs collapse into a single follow-up build,
/// started as soon as the running one reports back.
#[derive(Debug)]
pub(in crate::app) struct RebuildQueue<T> {
    in_flight: Option<Receiver<T>>,
    queued: bool,
}

impl<T> Default for RebuildQueue<T> {
    fn default() -> Self {
        Self {
            in_flight: None,
            queued: false,
        }
    }
}

impl<T> RebuildQueue<T> {
    pub(in crate::app) fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(in crate::app) fn request(&mut self, spawn: impl FnOnce() -> Receiver<T>) {
        if self.in_flight.is_some() {
            self.queued = true;
        } else {
            self.in_flight = Some(spawn());
        }
    }

    /// Collects a finished build; a queued request is started right away
    /// through `spawn`, so it sees the caller's current options.
    pub(in crate::app) fn poll(&mut self, spawn: impl FnOnce() -> Receiver<T>) -> BuildPoll<T> {
        let Some(rx) = self.in_flight.take() else {
            return BuildPoll::Idle;
        };

        let outcome = match rx.try_recv() {
            Ok(result) => BuildPoll::Finished(result),
            Err(TryRecvError::Empty) => {
                self.in_flight = Some(rx);
                return BuildPoll::Pending;
            }
            Err(TryRecvError::Disconnected) => BuildPoll::Lost,
        };

        if std::mem::take(&mut self.queued) {
            self.in_flight = Some(spawn());
        }
        outcome
    }

    pub(in crate::app) fn clear(&mut self) {
        self.in_flight = None;
        self.queued = false;
    }
}
