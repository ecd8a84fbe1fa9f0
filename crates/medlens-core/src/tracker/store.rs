//! In-memory communication record store.

use crate::communication::Communication;
use std::collections::HashMap;

/// Communication records plus the index of currently open sessions per agent.
///
/// The store keeps insertion order so exports and "latest" lookups are
/// deterministic. It is not synchronized on its own; the tracker guards it with
/// a single mutex so records and the active-session index always change
/// together.
#[derive(Debug, Default)]
pub struct CommunicationStore {
    communications: HashMap<String, Communication>,
    order: Vec<String>,
    /// agent_id -> open communication id
    active_sessions: HashMap<String, String>,
}

impl CommunicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new communication and points its agent's active entry at it.
    ///
    /// An existing active entry for the same agent is overwritten; the earlier
    /// record stays in the store and can still be completed by id.
    pub(crate) fn insert(&mut self, comm: Communication) {
        self.active_sessions
            .insert(comm.agent_id.clone(), comm.id.clone());
        self.order.push(comm.id.clone());
        self.communications.insert(comm.id.clone(), comm);
    }

    pub(crate) fn get_mut(&mut self, comm_id: &str) -> Option<&mut Communication> {
        self.communications.get_mut(comm_id)
    }

    pub(crate) fn remove(&mut self, comm_id: &str) -> Option<Communication> {
        let removed = self.communications.remove(comm_id)?;
        self.order.retain(|id| id != comm_id);
        Some(removed)
    }

    /// Drops the agent's active entry, but only while it still refers to `comm_id`.
    pub(crate) fn release_agent(&mut self, agent_id: &str, comm_id: &str) -> bool {
        if self.active_sessions.get(agent_id).map(String::as_str) == Some(comm_id) {
            self.active_sessions.remove(agent_id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, comm_id: &str) -> Option<&Communication> {
        self.communications.get(comm_id)
    }

    pub fn contains(&self, comm_id: &str) -> bool {
        self.communications.contains_key(comm_id)
    }

    pub fn active_session(&self, agent_id: &str) -> Option<&str> {
        self.active_sessions.get(agent_id).map(String::as_str)
    }

    pub fn active_count(&self) -> usize {
        self.active_sessions.len()
    }

    pub fn len(&self) -> usize {
        self.communications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communications.is_empty()
    }

    /// Iterates records in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Communication> {
        self.order
            .iter()
            .filter_map(|id| self.communications.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{AgentFramework, LlmProvider};
    use crate::tracker::SessionStart;

    fn comm(id: &str, agent_id: &str) -> Communication {
        SessionStart::new(
            agent_id,
            "Agent",
            "general",
            AgentFramework::Custom,
            LlmProvider::OpenAi,
            "gpt-4",
        )
        .into_communication(id.to_string())
    }

    #[test]
    fn test_insert_overwrites_agent_index() {
        let mut store = CommunicationStore::new();
        store.insert(comm("c1", "a1"));
        store.insert(comm("c2", "a1"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.active_session("a1"), Some("c2"));
    }

    #[test]
    fn test_release_only_matching_entry() {
        let mut store = CommunicationStore::new();
        store.insert(comm("c1", "a1"));
        store.insert(comm("c2", "a1"));

        assert!(!store.release_agent("a1", "c1"));
        assert_eq!(store.active_session("a1"), Some("c2"));
        assert!(store.release_agent("a1", "c2"));
        assert_eq!(store.active_session("a1"), None);
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut store = CommunicationStore::new();
        for id in ["c3", "c1", "c2"] {
            store.insert(comm(id, id));
        }
        store.remove("c1");

        let ids: Vec<&str> = store.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2"]);
        assert!(!store.contains("c1"));
    }
}
