//! Background generation job publishing progress over a channel.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEvent {
    Status(String),
    /// Percent of cells finished, 0..=100.
    Progress(u8),
    Done(PathBuf),
    Error(String),
}

/// Sending half handed to the job. A silent sink drops every event.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<Sender<PlanEvent>>,
}

impl EventSink {
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, Receiver<PlanEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(PlanEvent::Status(message.into()));
    }

    pub fn progress(&self, done: usize, total: usize) {
        let percent = if total == 0 { 100 } else { (done.min(total) * 100 / total) as u8 };
        self.send(PlanEvent::Progress(percent));
    }

    fn send(&self, event: PlanEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is watching; the job keeps going.
            let _ = tx.send(event);
        }
    }
}

pub struct PlanJob {
    events: Receiver<PlanEvent>,
    handle: JoinHandle<()>,
}

impl PlanJob {
    /// Next event if one is queued. `Ok(None)` means the job is still
    /// running with nothing new; `Err` means the worker has hung up.
    pub fn poll(&self) -> Result<Option<PlanEvent>, TryRecvError> {
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker thread and returns every event not yet polled.
    pub fn join(self) -> Vec<PlanEvent> {
        let panicked = self.handle.join().is_err();
        let mut rest: Vec<PlanEvent> = self.events.try_iter().collect();
        if panicked {
            rest.push(PlanEvent::Error("generation worker panicked".to_string()));
        }
        rest
    }
}

/// Runs `job` on a named background thread. Its outcome is published as a
/// final `Done` or `Error` event after any events the job sent itself.
pub fn spawn<F>(job: F) -> std::io::Result<PlanJob>
where
    F: FnOnce(&EventSink) -> anyhow::Result<PathBuf> + Send + 'static,
{
    let (sink, events) = EventSink::channel();
    let handle = thread::Builder::new()
        .name("plan-worker".to_string())
        .spawn(move || match job(&sink) {
            Ok(path) => sink.send(PlanEvent::Done(path)),
            Err(e) => sink.send(PlanEvent::Error(format!("{e:#}"))),
        })?;
    Ok(PlanJob { events, handle })
}
