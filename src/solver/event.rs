//! Progress notifications and their asynchronous delivery.

use std::fmt;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::warn;

use crate::model::TaskAssigningSolution;
use crate::score::BendableScore;

/// Kind of solver phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    ConstructionHeuristic,
    LocalSearch,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::ConstructionHeuristic => f.write_str("Construction Heuristic"),
            PhaseKind::LocalSearch => f.write_str("Local Search"),
        }
    }
}

/// Notification emitted during a solving run.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    /// A strictly better solution was retained. The snapshot is immutable
    /// and shared; the solver never touches it again.
    BestSolutionChanged {
        solution: Arc<TaskAssigningSolution>,
        score: BendableScore,
        elapsed: Duration,
        /// Local search steps taken so far over all phases.
        step: u64,
    },
    /// A phase finished.
    PhaseEnded {
        /// The working solution as the phase left it; not necessarily the
        /// best one.
        solution: Arc<TaskAssigningSolution>,
        phase: PhaseKind,
        /// 0 for construction, then 1.. for local search phases.
        index: usize,
        score: BendableScore,
        steps: u64,
        elapsed: Duration,
    },
}

impl SolverEvent {
    pub fn solution(&self) -> &Arc<TaskAssigningSolution> {
        match self {
            SolverEvent::BestSolutionChanged { solution, .. }
            | SolverEvent::PhaseEnded { solution, .. } => solution,
        }
    }

    pub fn score(&self) -> &BendableScore {
        match self {
            SolverEvent::BestSolutionChanged { score, .. } | SolverEvent::PhaseEnded { score, .. } => {
                score
            }
        }
    }
}

/// Callback receiving solver events.
pub type EventListener = Box<dyn FnMut(&SolverEvent) + Send>;

pub(crate) type ListenerList = Arc<Mutex<Vec<EventListener>>>;

fn deliver(listeners: &ListenerList, event: &SolverEvent) {
    let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
    for listener in listeners.iter_mut() {
        listener(event);
    }
}

/// Forwards events to the listeners on a dedicated thread, in emission order.
pub(crate) struct EventDispatcher {
    listeners: ListenerList,
    sender: Option<Sender<SolverEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Starts the delivery thread. Without listeners no thread is spawned
    /// and events are dropped.
    pub(crate) fn start(listeners: ListenerList) -> Self {
        let empty = listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty();
        if empty {
            return Self {
                listeners,
                sender: None,
                handle: None,
            };
        }

        let (sender, receiver) = mpsc::channel::<SolverEvent>();
        let thread_listeners = listeners.clone();
        let spawned = std::thread::Builder::new()
            .name("u-assign-events".into())
            .spawn(move || {
                for event in receiver {
                    deliver(&thread_listeners, &event);
                }
            });
        match spawned {
            Ok(handle) => Self {
                listeners,
                sender: Some(sender),
                handle: Some(handle),
            },
            Err(err) => {
                warn!(error = %err, "Event thread unavailable, delivering events inline");
                Self {
                    listeners,
                    sender: None,
                    handle: None,
                }
            }
        }
    }

    pub(crate) fn emit(&self, event: SolverEvent) {
        match &self.sender {
            Some(sender) => {
                if let Err(mpsc::SendError(event)) = sender.send(event) {
                    deliver(&self.listeners, &event);
                }
            }
            None => {
                if !self.listeners.lock().unwrap_or_else(PoisonError::into_inner).is_empty() {
                    deliver(&self.listeners, &event);
                }
            }
        }
    }

    /// Closes the channel and waits until every event has been delivered.
    pub(crate) fn finish(mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("An event listener panicked; remaining events were dropped");
            }
        }
    }
}
