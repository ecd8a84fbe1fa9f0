//! Completion notifications.
//!
//! When a communication completes, the tracker hands a [`CompletionEvent`] to a
//! [`NotificationDispatcher`]. The dispatcher owns a bounded queue served by a
//! small pool of tokio tasks, each forwarding events to a
//! [`CompletionNotifier`] (for example an HTTP webhook). Delivery is
//! best-effort and at-most-once: failures are logged and dropped.

use crate::communication::{AgentFramework, Communication};
use crate::error::{MedlensError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Payload describing a completed communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub event: String,
    pub communication_id: String,
    pub agent_name: String,
    pub framework: AgentFramework,
    pub duration_seconds: f64,
    pub total_tokens: u64,
    pub cost_estimate: f64,
    pub patient_id: Option<String>,
    pub scenario_type: String,
}

impl CompletionEvent {
    pub const EVENT_NAME: &'static str = "communication_completed";

    pub fn from_communication(comm: &Communication) -> Self {
        Self {
            event: Self::EVENT_NAME.to_string(),
            communication_id: comm.id.clone(),
            agent_name: comm.agent_name.clone(),
            framework: comm.framework,
            duration_seconds: comm.duration_seconds(),
            total_tokens: comm.total_tokens,
            cost_estimate: comm.cost_estimate,
            patient_id: comm.patient_id.clone(),
            scenario_type: comm.scenario_type.clone(),
        }
    }
}

/// Receiver of completion events.
///
/// Implementations live outside the core (see `medlens-interaction` for the
/// HTTP webhook); the core only depends on this trait.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, event: &CompletionEvent) -> Result<()>;
}

/// Bounded worker pool that delivers completion events off the caller's path.
pub struct NotificationDispatcher {
    sender: Mutex<Option<mpsc::Sender<CompletionEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl NotificationDispatcher {
    /// Spawns `workers` delivery tasks on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a config error when called outside a tokio runtime.
    pub fn spawn(
        notifier: Arc<dyn CompletionNotifier>,
        workers: usize,
        queue_capacity: usize,
    ) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            MedlensError::config("notification dispatcher requires a running tokio runtime")
        })?;

        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let notifier = Arc::clone(&notifier);
                handle.spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(event) = next else {
                            break;
                        };
                        match notifier.notify(&event).await {
                            Ok(()) => tracing::debug!(
                                worker,
                                communication_id = %event.communication_id,
                                "Completion notification delivered"
                            ),
                            Err(err) => tracing::warn!(
                                worker,
                                communication_id = %event.communication_id,
                                "Completion notification failed: {}",
                                err
                            ),
                        }
                    }
                })
            })
            .collect();

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
        })
    }

    /// Queues an event without blocking. Drops the event when the queue is full
    /// or the dispatcher has been shut down.
    pub fn submit(&self, event: CompletionEvent) {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            tracing::debug!(
                communication_id = %event.communication_id,
                "Notification dispatcher closed, dropping event"
            );
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => tracing::warn!(
                communication_id = %event.communication_id,
                "Notification queue full, dropping event"
            ),
            Err(TrySendError::Closed(event)) => tracing::warn!(
                communication_id = %event.communication_id,
                "Notification workers stopped, dropping event"
            ),
        }
    }

    /// Closes the queue and waits until every queued event has been handled.
    pub async fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!("Notification worker panicked: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        delivered: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CompletionNotifier for CountingNotifier {
        async fn notify(&self, _event: &CompletionEvent) -> Result<()> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MedlensError::notification("receiver unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn event(id: &str) -> CompletionEvent {
        CompletionEvent {
            event: CompletionEvent::EVENT_NAME.to_string(),
            communication_id: id.to_string(),
            agent_name: "Cardiologist".to_string(),
            framework: AgentFramework::Autogen,
            duration_seconds: 1.5,
            total_tokens: 80,
            cost_estimate: 0.0033,
            patient_id: Some("p1".to_string()),
            scenario_type: "assessment".to_string(),
        }
    }

    #[test]
    fn test_spawn_requires_runtime() {
        let notifier = Arc::new(CountingNotifier {
            delivered: AtomicUsize::new(0),
            fail: false,
        });
        let result = NotificationDispatcher::spawn(notifier, 2, 8);
        assert!(matches!(result, Err(MedlensError::Config(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_drains_queue() {
        let notifier = Arc::new(CountingNotifier {
            delivered: AtomicUsize::new(0),
            fail: false,
        });
        let dispatcher = NotificationDispatcher::spawn(notifier.clone(), 3, 16).unwrap();

        for i in 0..10 {
            dispatcher.submit(event(&format!("comm_{i}")));
        }
        dispatcher.shutdown().await;

        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let notifier = Arc::new(CountingNotifier {
            delivered: AtomicUsize::new(0),
            fail: true,
        });
        let dispatcher = NotificationDispatcher::spawn(notifier.clone(), 1, 4).unwrap();

        dispatcher.submit(event("comm_a"));
        dispatcher.submit(event("comm_b"));
        dispatcher.shutdown().await;

        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 2);
        // Submitting after shutdown is a silent drop.
        dispatcher.submit(event("comm_c"));
    }

    #[test]
    fn test_payload_field_names() {
        let json = serde_json::to_value(event("comm_x")).unwrap();
        assert_eq!(json["event"], "communication_completed");
        assert_eq!(json["framework"], "autogen");
        assert_eq!(json["patient_id"], "p1");
    }
}
