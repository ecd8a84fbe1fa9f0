//! Session lifecycle management for tracked LLM communications.
//!
//! # Module Structure
//!
//! - `store`: Record store and active-session index (`CommunicationStore`)
//! - `request`: Start and completion requests (`SessionStart`, `Completion`)
//!
//! # Usage
//!
//! ```
//! use medlens_core::communication::{AgentFramework, LlmProvider, MessageDraft};
//! use medlens_core::tracker::{CommunicationTracker, Completion, SessionStart};
//!
//! let tracker = CommunicationTracker::new();
//! let comm_id = tracker.start(
//!     SessionStart::new(
//!         "a1",
//!         "Dr. X",
//!         "cardiology",
//!         AgentFramework::Autogen,
//!         LlmProvider::OpenAi,
//!         "gpt-4",
//!     )
//!     .patient_id("p1"),
//! );
//! tracker.add_message(&comm_id, MessageDraft::user("assess patient").tokens(50));
//! tracker.add_message(&comm_id, MessageDraft::assistant("recommend follow-up").tokens(30));
//! tracker.complete(&comm_id, Completion::success("recommend follow-up", 1200));
//!
//! let comm = tracker.get_communication(&comm_id).unwrap();
//! assert_eq!(comm.total_tokens, 80);
//! assert!(tracker.active_session("a1").is_none());
//! ```

mod request;
mod store;

pub use request::{Completion, SessionStart};
pub use store::CommunicationStore;

use crate::communication::{Communication, MessageDraft, generate_id};
use crate::error::{MedlensError, Result};
use crate::export::{ExportFormat, export_store};
use crate::notify::{CompletionEvent, NotificationDispatcher};
use crate::pricing::PricingTable;
use crate::stats::{
    CommunicationStats, QuotaReport, TrackerHealth, compute_health, compute_quota_report,
    compute_stats,
};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Concurrency-safe tracker of LLM communications.
///
/// A single mutex guards the record store and the active-session index, so
/// every mutation and every statistics read sees a consistent state. Webhook
/// notifications are handed to the dispatcher only after the lock is released.
///
/// The tracker is constructed explicitly and shared via `Arc`; there is no
/// global instance.
pub struct CommunicationTracker {
    store: Mutex<CommunicationStore>,
    pricing: PricingTable,
    dispatcher: Option<NotificationDispatcher>,
}

impl CommunicationTracker {
    /// Creates a tracker with the built-in pricing table and no notifications.
    pub fn new() -> Self {
        Self::with_pricing(PricingTable::default())
    }

    pub fn with_pricing(pricing: PricingTable) -> Self {
        Self {
            store: Mutex::new(CommunicationStore::new()),
            pricing,
            dispatcher: None,
        }
    }

    /// Attaches a dispatcher that receives an event for every non-empty completion.
    pub fn with_dispatcher(mut self, dispatcher: NotificationDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    fn store(&self) -> MutexGuard<'_, CommunicationStore> {
        // Every critical section leaves the store consistent, so a poisoned lock is still usable.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts tracking a new session and returns its communication id.
    ///
    /// The session becomes the agent's active session, replacing any earlier one.
    pub fn start(&self, request: SessionStart) -> String {
        let comm_id = generate_id("comm", 8);
        let comm = request.into_communication(comm_id.clone());
        let agent_name = comm.agent_name.clone();

        self.store().insert(comm);

        tracing::info!(
            communication_id = %comm_id,
            agent_name = %agent_name,
            "Started LLM communication tracking"
        );
        comm_id
    }

    /// Appends a message to a session and returns the new message id.
    ///
    /// Unknown ids are ignored (the session may already have been discarded),
    /// but an id is still returned.
    pub fn add_message(&self, comm_id: &str, draft: MessageDraft) -> String {
        let message_id = generate_id("msg", 6);
        let role = draft.role;
        let message = draft.into_message(message_id.clone(), Utc::now());

        let recorded = match self.store().get_mut(comm_id) {
            Some(comm) => {
                comm.record_message(message);
                true
            }
            None => false,
        };

        if recorded {
            tracing::debug!(
                communication_id = %comm_id,
                message_id = %message_id,
                %role,
                "Recorded message"
            );
        } else {
            tracing::debug!(
                communication_id = %comm_id,
                "Ignoring message for unknown communication"
            );
        }
        message_id
    }

    /// Finalizes a session.
    ///
    /// Unknown or already completed ids are a no-op. A session without any
    /// messages is discarded entirely, with no cost and no notification.
    /// Otherwise the outcome is recorded and the cost computed, the agent's
    /// active entry is released if it still points here, and a completion
    /// notification is queued.
    pub fn complete(&self, comm_id: &str, completion: Completion) {
        let event = {
            let mut store = self.store();
            let Some(comm) = store.get_mut(comm_id) else {
                return;
            };

            if comm.is_completed() {
                tracing::debug!(communication_id = %comm_id, "Communication already completed");
                return;
            }

            if comm.messages.is_empty() {
                store.remove(comm_id);
                drop(store);
                tracing::info!(
                    communication_id = %comm_id,
                    "Deleted empty LLM communication record"
                );
                return;
            }

            comm.session_end = Some(Utc::now());
            comm.final_response = Some(completion.final_response);
            comm.response_time_ms = completion.response_time_ms;
            comm.confidence_score = completion.confidence_score;
            comm.error_message = completion.error_message;
            comm.error_type = completion.error_type;
            comm.error_code = completion.error_code;
            comm.retry_count = completion.retry_count;
            comm.cost_estimate = self.pricing.calculate_cost(
                comm.provider,
                &comm.model,
                comm.total_input_tokens,
                comm.total_output_tokens,
            );

            let agent_id = comm.agent_id.clone();
            let event = self
                .dispatcher
                .as_ref()
                .map(|_| CompletionEvent::from_communication(comm));
            store.release_agent(&agent_id, comm_id);
            event
        };

        tracing::info!(communication_id = %comm_id, "Completed LLM communication");

        if let (Some(dispatcher), Some(event)) = (&self.dispatcher, event) {
            dispatcher.submit(event);
        }
    }

    pub fn get_communication(&self, comm_id: &str) -> Option<Communication> {
        self.store().get(comm_id).cloned()
    }

    /// Looks up a communication for callers that report a missing record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and for sessions discarded as empty.
    pub fn communication(&self, comm_id: &str) -> Result<Communication> {
        self.get_communication(comm_id)
            .ok_or_else(|| MedlensError::not_found("communication", comm_id))
    }

    /// Snapshot of every stored communication in insertion order.
    pub fn communications(&self) -> Vec<Communication> {
        self.store().iter().cloned().collect()
    }

    pub fn agent_communications(&self, agent_id: &str) -> Vec<Communication> {
        self.store()
            .iter()
            .filter(|c| c.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub fn patient_communications(&self, patient_id: &str) -> Vec<Communication> {
        self.store()
            .iter()
            .filter(|c| c.patient_id.as_deref() == Some(patient_id))
            .cloned()
            .collect()
    }

    /// The `limit` most recently started communications, newest first.
    ///
    /// Equal start times resolve to the later-inserted record, as in the stats.
    pub fn recent_communications(&self, limit: usize) -> Vec<Communication> {
        let mut comms: Vec<Communication> = self.store().iter().rev().cloned().collect();
        comms.sort_by(|a, b| b.session_start.cmp(&a.session_start));
        comms.truncate(limit);
        comms
    }

    /// Id of the agent's currently open session, if any.
    pub fn active_session(&self, agent_id: &str) -> Option<String> {
        self.store().active_session(agent_id).map(str::to_string)
    }

    pub fn health(&self) -> TrackerHealth {
        compute_health(&self.store())
    }

    pub fn stats(&self) -> CommunicationStats {
        compute_stats(&self.store())
    }

    pub fn quota_exceeded_details(&self) -> QuotaReport {
        compute_quota_report(&self.store())
    }

    /// Exports all communications.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedExportFormat` for anything other than `"json"`.
    pub fn export(&self, format: &str) -> Result<String> {
        let format: ExportFormat = format.parse()?;
        export_store(&self.store(), format)
    }

    /// Clears every record and the active-session index in one step.
    pub fn reset(&self) {
        *self.store() = CommunicationStore::new();
        tracing::info!("Reset LLM communication tracker");
    }

    /// Stops the notification workers after delivering queued events.
    pub async fn shutdown_notifications(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.shutdown().await;
        }
    }
}

impl Default for CommunicationTracker {
    fn default() -> Self {
        Self::new()
    }
}
