//! Pending lazy-load registry
//!
//! A lazy node that is expanded before its children are known gets exactly one
//! outstanding request, identified by a ticket. Resolutions are matched by
//! ticket, so a resolution for a cancelled request (its node was removed) is
//! recognised as stale and dropped.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;
use uuid::Uuid;

/// Identifies one outstanding child fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(Uuid);

impl LoadTicket {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handed to the caller, who fetches the children and reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub node_id: String,
    pub ticket: LoadTicket,
}

#[derive(Debug, Default)]
pub struct PendingLoads {
    by_ticket: HashMap<LoadTicket, String>,
    by_node: HashMap<String, LoadTicket>,
}

impl PendingLoads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetch for `node_id`; `None` if one is already in flight.
    pub fn begin(&mut self, node_id: &str) -> Option<LoadRequest> {
        if self.by_node.contains_key(node_id) {
            trace!("load for {} already pending, coalescing", node_id);
            return None;
        }
        let ticket = LoadTicket::new();
        self.by_ticket.insert(ticket, node_id.to_string());
        self.by_node.insert(node_id.to_string(), ticket);
        Some(LoadRequest {
            node_id: node_id.to_string(),
            ticket,
        })
    }

    pub fn is_pending(&self, node_id: &str) -> bool {
        self.by_node.contains_key(node_id)
    }

    /// Node the ticket was issued for, if still outstanding.
    pub fn node_for(&self, ticket: LoadTicket) -> Option<&str> {
        self.by_ticket.get(&ticket).map(String::as_str)
    }

    /// Retire a ticket, returning its node id if it was outstanding.
    pub fn finish(&mut self, ticket: LoadTicket) -> Option<String> {
        let node_id = self.by_ticket.remove(&ticket)?;
        self.by_node.remove(&node_id);
        Some(node_id)
    }

    /// Cancel outstanding fetches for any of `node_ids`.
    pub fn cancel<'a>(&mut self, node_ids: impl IntoIterator<Item = &'a String>) -> usize {
        let mut cancelled = 0;
        for id in node_ids {
            if let Some(ticket) = self.by_node.remove(id) {
                self.by_ticket.remove(&ticket);
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn len(&self) -> usize {
        self.by_ticket.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticket.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_pending_node_when_begin_again_then_coalesced() {
        let mut pending = PendingLoads::new();
        let first = pending.begin("x").unwrap();
        assert!(pending.begin("x").is_none());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.node_for(first.ticket), Some("x"));
    }

    #[test]
    fn given_cancelled_node_when_finishing_ticket_then_stale() {
        let mut pending = PendingLoads::new();
        let request = pending.begin("x").unwrap();
        assert_eq!(pending.cancel([&"x".to_string()]), 1);
        assert!(pending.finish(request.ticket).is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn given_finished_ticket_when_begin_then_new_ticket() {
        let mut pending = PendingLoads::new();
        let first = pending.begin("x").unwrap();
        assert_eq!(pending.finish(first.ticket).as_deref(), Some("x"));
        let second = pending.begin("x").unwrap();
        assert_ne!(first.ticket, second.ticket);
    }
}
