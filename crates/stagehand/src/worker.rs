//! Off-thread execution of a layout strategy.
//!
//! A worker owns a [`StrategyInstance`] and a copy of the snapshot, runs the
//! strategy to completion on its own thread and reports back over a channel.
//! Every message carries the generation of the run that spawned it so the
//! controller can discard results of superseded runs. Cancelling a worker
//! stops it at the next tick boundary.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
    },
    thread,
    time::Duration,
};

use log::{debug, trace};

use stagehand_core::geometry::Point;

use crate::{error::LayoutError, slot::StrategyInstance, snapshot::LayoutSnapshot};

/// Upper bound on ticks a worker runs before reporting what it has.
const TICK_LIMIT: usize = 10_000;

/// What a worker reports.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Intermediate positions of an iterative run, one per node.
    Tick(Vec<Point>),
    /// Final positions, one per node.
    Settled(Vec<Point>),
    /// The strategy failed. Positions stay where the last tick left them.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerMessage {
    pub generation: u64,
    pub event: WorkerEvent,
}

/// Controller-side end of a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    kind: String,
    generation: u64,
    receiver: Receiver<WorkerMessage>,
    cancel: Arc<AtomicBool>,
}

impl WorkerHandle {
    /// Starts `instance` on a new thread.
    ///
    /// With `emit_ticks`, every intermediate step of an iterative strategy is
    /// reported as a [`WorkerEvent::Tick`].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Worker`] if the thread cannot be spawned.
    pub fn spawn(
        mut instance: StrategyInstance,
        mut snapshot: LayoutSnapshot,
        generation: u64,
        emit_ticks: bool,
    ) -> Result<Self, LayoutError> {
        let (sender, receiver) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let kind = instance.kind().to_string();

        let worker_cancel = Arc::clone(&cancel);
        thread::Builder::new()
            .name(format!("stagehand-{kind}"))
            .spawn(move || {
                let event = run(&mut instance, &mut snapshot, &worker_cancel, |positions| {
                    if emit_ticks {
                        let message = WorkerMessage {
                            generation,
                            event: WorkerEvent::Tick(positions),
                        };
                        return sender.send(message).is_ok();
                    }
                    true
                });
                instance.destroy();
                if let Some(event) = event {
                    // The controller may be gone already.
                    let _ = sender.send(WorkerMessage { generation, event });
                }
            })
            .map_err(|err| LayoutError::Worker(err.to_string()))?;

        debug!(kind = kind.as_str(), generation; "Started layout worker");
        Ok(Self {
            kind,
            generation,
            receiver,
            cancel,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Asks the worker to stop at the next tick boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Returns the next message without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Worker`] if the worker exited without a final
    /// message.
    pub fn try_next(&self) -> Result<Option<WorkerMessage>, LayoutError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Waits up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Worker`] if the worker exited without a final
    /// message.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<WorkerMessage>, LayoutError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn disconnected() -> LayoutError {
    LayoutError::Worker("worker exited without reporting a result".to_string())
}

/// Runs the strategy to completion. Returns `None` when cancelled.
fn run(
    instance: &mut StrategyInstance,
    snapshot: &mut LayoutSnapshot,
    cancel: &AtomicBool,
    mut on_tick: impl FnMut(Vec<Point>) -> bool,
) -> Option<WorkerEvent> {
    let mut progress = match instance.execute(snapshot) {
        Ok(progress) => progress,
        Err(err) => return Some(WorkerEvent::Failed(err.to_string())),
    };

    let mut ticks = 0;
    while !progress.is_settled() && ticks < TICK_LIMIT {
        if cancel.load(Ordering::Acquire) {
            trace!(ticks; "Worker cancelled");
            return None;
        }
        progress = match instance.tick(snapshot) {
            Ok(progress) => progress,
            Err(err) => return Some(WorkerEvent::Failed(err.to_string())),
        };
        ticks += 1;
        if !progress.is_settled() && !on_tick(snapshot.positions_or_origin()) {
            return None;
        }
    }

    if cancel.load(Ordering::Acquire) {
        return None;
    }
    Some(WorkerEvent::Settled(snapshot.positions_or_origin()))
}
