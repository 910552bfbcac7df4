//! Per-status lead counters shown above the lead list.

use serde::Serialize;

use crate::domain::auth::Role;
use crate::domain::lead::Lead;
use crate::domain::status::{LeadStatus, canonical_label, is_hidden_for};
use crate::store::events::LeadEvent;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub label: String,
    pub hex_color: String,
    pub count: usize,
}

/// Counters for the active statuses, in pipeline order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCounters {
    entries: Vec<StatusCount>,
}

impl StatusCounters {
    /// Builds empty counters for the statuses the role may see.
    pub fn new(statuses: &[LeadStatus], role: Role) -> Self {
        let mut statuses: Vec<&LeadStatus> = statuses
            .iter()
            .filter(|status| status.is_active && !is_hidden_for(role, &status.label))
            .collect();
        statuses.sort_by_key(|status| status.order_index);

        let entries = statuses
            .into_iter()
            .map(|status| StatusCount {
                label: canonical_label(&status.label),
                hex_color: status.hex_color.to_string(),
                count: 0,
            })
            .collect();
        Self { entries }
    }

    /// Counts every lead; statuses without a definition are ignored.
    pub fn from_leads(statuses: &[LeadStatus], role: Role, leads: &[Lead]) -> Self {
        let mut counters = Self::new(statuses, role);
        for lead in leads {
            counters.increment(&lead.status);
        }
        counters
    }

    /// Replaces the counts with server-side aggregates.
    pub fn resync<'a>(&mut self, counts: impl IntoIterator<Item = (&'a str, usize)>) {
        for entry in &mut self.entries {
            entry.count = 0;
        }
        for (label, count) in counts {
            if let Some(entry) = self.entry_mut(label) {
                entry.count += count;
            }
        }
    }

    pub fn entries(&self) -> &[StatusCount] {
        &self.entries
    }

    pub fn count(&self, label: &str) -> usize {
        let label = canonical_label(label);
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map_or(0, |entry| entry.count)
    }

    /// Applies a broadcast lead mutation without a round trip.
    pub fn apply(&mut self, event: &LeadEvent) {
        match event {
            LeadEvent::StatusChanged { old, new, .. } => {
                self.decrement(old);
                self.increment(new);
            }
            LeadEvent::Removed { status, .. } => self.decrement(status),
            LeadEvent::Added { lead } | LeadEvent::Restored { lead } => {
                self.increment(&lead.status)
            }
            LeadEvent::AgentChanged { .. } | LeadEvent::Toast { .. } => {}
        }
    }

    fn entry_mut(&mut self, label: &str) -> Option<&mut StatusCount> {
        let label = canonical_label(label);
        self.entries.iter_mut().find(|entry| entry.label == label)
    }

    fn increment(&mut self, label: &str) {
        if let Some(entry) = self.entry_mut(label) {
            entry.count += 1;
        }
    }

    fn decrement(&mut self, label: &str) {
        if let Some(entry) = self.entry_mut(label) {
            entry.count = entry.count.saturating_sub(1);
        }
    }
}
