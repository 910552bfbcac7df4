//! Client-side lead list with optimistic mutations.
//!
//! Every mutation is applied locally first and announced on the event bus. The
//! caller then performs the server request and hands its result back through
//! [`LeadListStore::settle`], which either confirms the change or restores the
//! exact rows captured before it.

use std::sync::mpsc::Receiver;

use crate::domain::change::RowChange;
use crate::domain::lead::Lead;
use crate::domain::lead_filter::LeadFilter;
use crate::domain::types::{LeadId, StatusLabel, UserId};
use crate::pagination::last_page;
use crate::store::events::{EventBus, LeadEvent, ToastLevel};

/// Identifies one list request; responses to superseded requests are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Clone, Debug, PartialEq)]
enum MutationKind {
    Status(StatusLabel),
    Agent(Option<UserId>),
    Remove,
}

/// Optimistic change waiting for the server's answer.
#[derive(Debug)]
#[must_use = "settle the mutation once the server responds"]
pub struct PendingMutation {
    kind: MutationKind,
    before: Vec<Lead>,
}

impl PendingMutation {
    pub fn lead_ids(&self) -> Vec<LeadId> {
        self.before.iter().map(|lead| lead.id).collect()
    }
}

pub struct LeadListStore {
    filter: LeadFilter,
    rows: Vec<Lead>,
    total: usize,
    generation: u64,
    bus: EventBus<LeadEvent>,
}

fn sort_rows(rows: &mut [Lead]) {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl LeadListStore {
    pub fn new(filter: LeadFilter) -> Self {
        Self {
            filter,
            rows: Vec::new(),
            total: 0,
            generation: 0,
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<LeadEvent> {
        self.bus.subscribe()
    }

    pub fn rows(&self) -> &[Lead] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn filter(&self) -> &LeadFilter {
        &self.filter
    }

    pub fn last_page(&self) -> usize {
        last_page(self.total, self.filter.effective_limit())
    }

    pub fn get(&self, lead_id: LeadId) -> Option<&Lead> {
        self.rows.iter().find(|lead| lead.id == lead_id)
    }

    /// Starts a new request, invalidating any request still in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket(self.generation)
    }

    pub fn set_filter(&mut self, filter: LeadFilter) -> FetchTicket {
        self.filter = filter;
        self.begin_fetch()
    }

    /// Replaces the rows with a server page unless a newer fetch was started.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, total: usize, leads: Vec<Lead>) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.rows = leads;
        sort_rows(&mut self.rows);
        self.total = total;
        true
    }

    pub fn change_status(&mut self, lead_id: LeadId, label: StatusLabel) -> Option<PendingMutation> {
        self.bulk_change_status(&[lead_id], label)
    }

    pub fn bulk_change_status(
        &mut self,
        lead_ids: &[LeadId],
        label: StatusLabel,
    ) -> Option<PendingMutation> {
        let mut before = Vec::new();
        for lead in self
            .rows
            .iter_mut()
            .filter(|lead| lead_ids.contains(&lead.id) && lead.status != label)
        {
            before.push(lead.clone());
            lead.status = label.clone();
        }
        if before.is_empty() {
            return None;
        }
        for lead in &before {
            self.bus.publish(LeadEvent::StatusChanged {
                lead_id: lead.id,
                old: lead.status.clone(),
                new: label.clone(),
            });
        }
        Some(PendingMutation {
            kind: MutationKind::Status(label),
            before,
        })
    }

    pub fn assign_agent(&mut self, lead_id: LeadId, agent: Option<UserId>) -> Option<PendingMutation> {
        self.bulk_assign(&[lead_id], agent)
    }

    pub fn bulk_assign(
        &mut self,
        lead_ids: &[LeadId],
        agent: Option<UserId>,
    ) -> Option<PendingMutation> {
        let mut before = Vec::new();
        for lead in self
            .rows
            .iter_mut()
            .filter(|lead| lead_ids.contains(&lead.id) && lead.assigned_to != agent)
        {
            before.push(lead.clone());
            lead.assigned_to = agent;
        }
        if before.is_empty() {
            return None;
        }
        for lead in &before {
            self.bus.publish(LeadEvent::AgentChanged {
                lead_id: lead.id,
                old: lead.assigned_to,
                new: agent,
            });
        }
        Some(PendingMutation {
            kind: MutationKind::Agent(agent),
            before,
        })
    }

    pub fn remove(&mut self, lead_ids: &[LeadId]) -> Option<PendingMutation> {
        let (before, kept): (Vec<Lead>, Vec<Lead>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|lead| lead_ids.contains(&lead.id));
        self.rows = kept;
        if before.is_empty() {
            return None;
        }
        self.total = self.total.saturating_sub(before.len());
        for lead in &before {
            self.bus.publish(LeadEvent::Removed {
                lead_id: lead.id,
                status: lead.status.clone(),
            });
        }
        Some(PendingMutation {
            kind: MutationKind::Remove,
            before,
        })
    }

    /// Confirms or reverts a pending mutation.
    pub fn settle(&mut self, pending: PendingMutation, result: Result<(), String>) {
        let count = pending.before.len();
        match result {
            Ok(()) => {
                let message = match (&pending.kind, count) {
                    (MutationKind::Status(_), _) => "Status updated".to_string(),
                    (MutationKind::Agent(Some(_)), _) => "Agent assigned".to_string(),
                    (MutationKind::Agent(None), _) => "Agent removed".to_string(),
                    (MutationKind::Remove, 1) => "Lead deleted".to_string(),
                    (MutationKind::Remove, n) => format!("{n} leads deleted"),
                };
                self.bus.publish(LeadEvent::Toast {
                    message,
                    level: ToastLevel::Success,
                });
            }
            Err(err) => {
                self.rollback(&pending);
                let action = match pending.kind {
                    MutationKind::Status(_) => "update status",
                    MutationKind::Agent(_) => "assign agent",
                    MutationKind::Remove => "delete",
                };
                self.bus.publish(LeadEvent::Toast {
                    message: format!("Failed to {action}: {err}"),
                    level: ToastLevel::Error,
                });
            }
        }
    }

    fn rollback(&mut self, pending: &PendingMutation) {
        for original in &pending.before {
            match &pending.kind {
                MutationKind::Status(applied) => {
                    if let Some(row) = self.rows.iter_mut().find(|row| row.id == original.id) {
                        row.status = original.status.clone();
                        self.bus.publish(LeadEvent::StatusChanged {
                            lead_id: original.id,
                            old: applied.clone(),
                            new: original.status.clone(),
                        });
                    }
                }
                MutationKind::Agent(applied) => {
                    if let Some(row) = self.rows.iter_mut().find(|row| row.id == original.id) {
                        row.assigned_to = original.assigned_to;
                        self.bus.publish(LeadEvent::AgentChanged {
                            lead_id: original.id,
                            old: *applied,
                            new: original.assigned_to,
                        });
                    }
                }
                MutationKind::Remove => {
                    if self.get(original.id).is_none() {
                        self.rows.push(original.clone());
                        self.total += 1;
                        self.bus.publish(LeadEvent::Restored {
                            lead: original.clone(),
                        });
                    }
                }
            }
        }
        sort_rows(&mut self.rows);
    }

    /// Merges a realtime row change into the visible list.
    pub fn apply_change(&mut self, change: RowChange<Lead>) {
        match change {
            RowChange::Inserted(lead) => {
                if self.get(lead.id).is_some() {
                    // Already visible; treat as an update so deltas still flow.
                    self.apply_change(RowChange::Updated(lead));
                    return;
                }
                self.rows.push(lead.clone());
                self.total += 1;
                self.bus.publish(LeadEvent::Added { lead });
                sort_rows(&mut self.rows);
            }
            RowChange::Updated(lead) => {
                let Some(row) = self.rows.iter_mut().find(|row| row.id == lead.id) else {
                    return;
                };
                let old_status = row.status.clone();
                let old_agent = row.assigned_to;
                *row = lead.clone();
                if old_status != lead.status {
                    self.bus.publish(LeadEvent::StatusChanged {
                        lead_id: lead.id,
                        old: old_status,
                        new: lead.status.clone(),
                    });
                }
                if old_agent != lead.assigned_to {
                    self.bus.publish(LeadEvent::AgentChanged {
                        lead_id: lead.id,
                        old: old_agent,
                        new: lead.assigned_to,
                    });
                }
                sort_rows(&mut self.rows);
            }
            RowChange::Deleted(lead) => {
                let before = self.rows.len();
                self.rows.retain(|row| row.id != lead.id);
                if self.rows.len() < before {
                    self.total = self.total.saturating_sub(1);
                    self.bus.publish(LeadEvent::Removed {
                        lead_id: lead.id,
                        status: lead.status,
                    });
                }
            }
        }
    }

    /// Patches the note counter after a note is added or removed elsewhere.
    pub fn update_local(&mut self, lead_id: LeadId, note_count: i32) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.id == lead_id) {
            row.note_count = note_count.max(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::domain::lead::KycStatus;
    use crate::domain::types::PersonName;

    fn label(value: &str) -> StatusLabel {
        StatusLabel::new(value).unwrap()
    }

    fn lead(id: i32, minutes: i64, status: &str) -> Lead {
        let base = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Lead {
            id: LeadId::new(id).unwrap(),
            name: PersonName::new(format!("Lead {id}")).unwrap(),
            surname: None,
            email: None,
            phone: None,
            country: None,
            status: label(status),
            kyc_status: KycStatus::Pending,
            source_file: None,
            assigned_to: None,
            trading_account_id: None,
            note_count: 0,
            created_at: base + Duration::minutes(minutes),
            updated_at: base,
        }
    }

    fn loaded_store(leads: Vec<Lead>) -> LeadListStore {
        let mut store = LeadListStore::new(LeadFilter::default());
        let ticket = store.begin_fetch();
        let total = leads.len();
        assert!(store.finish_fetch(ticket, total, leads));
        store
    }

    fn drain(receiver: &Receiver<LeadEvent>) -> Vec<LeadEvent> {
        receiver.try_iter().collect()
    }

    #[test]
    fn rows_are_ordered_newest_first_with_id_tiebreak() {
        let store = loaded_store(vec![lead(1, 0, "New"), lead(3, 5, "New"), lead(2, 5, "New")]);
        let ids: Vec<i32> = store.rows().iter().map(|lead| lead.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut store = LeadListStore::new(LeadFilter::default());
        let first = store.begin_fetch();
        let second = store.set_filter(LeadFilter {
            search: "ann".to_string(),
            ..LeadFilter::default()
        });

        assert!(store.finish_fetch(second, 1, vec![lead(2, 0, "New")]));
        assert!(!store.finish_fetch(first, 1, vec![lead(1, 0, "New")]));
        assert_eq!(store.rows()[0].id.get(), 2);
    }

    #[test]
    fn status_change_broadcasts_delta_and_confirms() {
        let mut store = loaded_store(vec![lead(1, 0, "New")]);
        let events = store.subscribe();

        let pending = store
            .change_status(LeadId::new(1).unwrap(), label("Interested"))
            .expect("status differs");
        assert_eq!(store.rows()[0].status, label("Interested"));
        store.settle(pending, Ok(()));

        assert_eq!(
            drain(&events),
            vec![
                LeadEvent::StatusChanged {
                    lead_id: LeadId::new(1).unwrap(),
                    old: label("New"),
                    new: label("Interested"),
                },
                LeadEvent::Toast {
                    message: "Status updated".to_string(),
                    level: ToastLevel::Success,
                },
            ]
        );
    }

    #[test]
    fn unchanged_status_is_a_no_op() {
        let mut store = loaded_store(vec![lead(1, 0, "New")]);
        let events = store.subscribe();
        assert!(
            store
                .change_status(LeadId::new(1).unwrap(), label("New"))
                .is_none()
        );
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn failed_status_change_restores_row_and_emits_inverse() {
        let mut store = loaded_store(vec![lead(1, 0, "New"), lead(2, 1, "Call Back")]);
        let before = store.rows().to_vec();
        let events = store.subscribe();

        let pending = store
            .bulk_change_status(
                &[LeadId::new(1).unwrap(), LeadId::new(2).unwrap()],
                label("Interested"),
            )
            .unwrap();
        store.settle(pending, Err("network".to_string()));

        assert_eq!(store.rows(), before.as_slice());
        let events = drain(&events);
        assert_eq!(events.len(), 5);
        assert!(events.contains(&LeadEvent::StatusChanged {
            lead_id: LeadId::new(2).unwrap(),
            old: label("Interested"),
            new: label("Call Back"),
        }));
        assert!(matches!(
            events.last(),
            Some(LeadEvent::Toast {
                level: ToastLevel::Error,
                ..
            })
        ));
    }

    #[test]
    fn failed_assignment_rolls_back() {
        let mut store = loaded_store(vec![lead(1, 0, "New")]);
        let agent = UserId::new(7).unwrap();

        let pending = store
            .assign_agent(LeadId::new(1).unwrap(), Some(agent))
            .unwrap();
        assert_eq!(store.rows()[0].assigned_to, Some(agent));
        store.settle(pending, Err("denied".to_string()));
        assert_eq!(store.rows()[0].assigned_to, None);
    }

    #[test]
    fn failed_delete_restores_rows_and_total() {
        let mut store = loaded_store(vec![lead(1, 0, "New"), lead(2, 1, "New")]);
        let before = store.rows().to_vec();

        let pending = store.remove(&[LeadId::new(2).unwrap()]).unwrap();
        assert_eq!(store.total(), 1);
        assert_eq!(store.rows().len(), 1);

        store.settle(pending, Err("boom".to_string()));
        assert_eq!(store.total(), 2);
        assert_eq!(store.rows(), before.as_slice());
    }

    #[test]
    fn realtime_changes_merge_into_list() {
        let mut store = loaded_store(vec![lead(1, 0, "New")]);
        let events = store.subscribe();

        store.apply_change(RowChange::Inserted(lead(2, 10, "New")));
        store.apply_change(RowChange::Inserted(lead(2, 10, "New")));
        assert_eq!(store.total(), 2);
        assert_eq!(store.rows()[0].id.get(), 2);

        store.apply_change(RowChange::Updated(lead(1, 0, "Call Back")));
        assert_eq!(store.rows()[1].status, label("Call Back"));

        store.apply_change(RowChange::Deleted(lead(2, 10, "New")));
        assert_eq!(store.total(), 1);
        assert_eq!(store.rows().len(), 1);

        let events = drain(&events);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], LeadEvent::Added { .. }));
        assert!(matches!(events[1], LeadEvent::StatusChanged { .. }));
        assert!(matches!(events[2], LeadEvent::Removed { .. }));
    }

    #[test]
    fn repeated_insert_with_new_status_emits_delta() {
        let mut store = loaded_store(vec![lead(1, 0, "New"), lead(2, 1, "New")]);
        let events = store.subscribe();

        store.apply_change(RowChange::Inserted(lead(1, 0, "Call Back")));

        assert_eq!(store.total(), 2);
        assert_eq!(store.rows().len(), 2);
        assert_eq!(store.rows()[1].status, label("Call Back"));
        assert_eq!(
            drain(&events),
            vec![LeadEvent::StatusChanged {
                lead_id: LeadId::new(1).unwrap(),
                old: label("New"),
                new: label("Call Back"),
            }]
        );
    }

    #[test]
    fn update_local_sets_note_count() {
        let mut store = loaded_store(vec![lead(1, 0, "New")]);
        store.update_local(LeadId::new(1).unwrap(), 4);
        assert_eq!(store.rows()[0].note_count, 4);
    }

    #[test]
    fn last_page_uses_filter_limit() {
        let mut store = LeadListStore::new(LeadFilter {
            limit: 20,
            ..LeadFilter::default()
        });
        let ticket = store.begin_fetch();
        store.finish_fetch(ticket, 41, vec![]);
        assert_eq!(store.last_page(), 3);
    }
}
