//! Append-only maintenance ticket log.
//!
//! Tickets are never removed and their status only moves forward
//! (Queue/Assigned -> Scheduled -> Completed).

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::models::{ticket_id, ticket_seq, Ticket, TicketKind, TicketStatus};

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TicketLog {
    tickets: Vec<Ticket>,
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, mo, d)?.and_hms_opt(h, mi, 0)
}

impl TicketLog {
    pub fn empty() -> Self {
        Self {
            tickets: Vec::new(),
        }
    }

    /// Log with the three tickets every new session starts from.
    pub fn seeded() -> Self {
        // ---
        let seed = [
            (
                "Mixer-01",
                TicketKind::Predictive,
                "Bearing wear",
                at(2025, 6, 3, 11, 10),
                at(2025, 6, 3, 14, 0),
                "Ali",
                TicketStatus::Queue,
            ),
            (
                "Conveyor-02",
                TicketKind::Preventive,
                "Motor check",
                at(2025, 6, 3, 10, 50),
                at(2025, 6, 4, 9, 0),
                "Maria",
                TicketStatus::Assigned,
            ),
            (
                "Pump-03",
                TicketKind::Corrective,
                "Sensor fault",
                at(2025, 6, 2, 15, 15),
                at(2025, 6, 3, 11, 0),
                "Sohail",
                TicketStatus::Completed,
            ),
        ];

        let mut log = Self::empty();
        for (machine, kind, reason, created, due, assignee, status) in seed {
            // The seed dates are fixed literals and always valid.
            let Some(created) = created else { continue };
            let id = log.next_id();
            log.tickets.push(Ticket {
                id,
                machine: machine.to_string(),
                kind,
                reason: reason.to_string(),
                created,
                due,
                assignee: Some(assignee.to_string()),
                status,
            });
        }
        log
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// An id no existing ticket uses.
    pub fn next_id(&self) -> String {
        // ---
        let last = self
            .tickets
            .iter()
            .filter_map(|t| ticket_seq(&t.id))
            .max()
            .unwrap_or(0);
        ticket_id(last + 1)
    }

    /// Ids of the machine's open (Queue or Assigned) tickets.
    pub fn open_for(&self, machine: &str) -> Vec<String> {
        // ---
        self.tickets
            .iter()
            .filter(|t| t.machine == machine && t.status.is_open())
            .map(|t| t.id.clone())
            .collect()
    }

    /// Append a Reactive ticket in Scheduled state and return its id.
    /// `created` is kept to the minute, like the seed tickets.
    pub fn open_scheduled(&mut self, machine: &str, reason: &str, created: NaiveDateTime) -> String {
        // ---
        let created = created
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(created);
        let id = self.next_id();
        self.tickets.push(Ticket {
            id: id.clone(),
            machine: machine.to_string(),
            kind: TicketKind::Reactive,
            reason: reason.to_string(),
            created,
            due: None,
            assignee: None,
            status: TicketStatus::Scheduled,
        });
        id
    }

    /// Move every open ticket of the machine to Scheduled; returns their ids.
    pub fn schedule_open(&mut self, machine: &str) -> Vec<String> {
        // ---
        let mut moved = Vec::new();
        for t in self
            .tickets
            .iter_mut()
            .filter(|t| t.machine == machine && t.status.is_open())
        {
            t.status = TicketStatus::Scheduled;
            moved.push(t.id.clone());
        }
        moved
    }

    /// Move every non-Completed ticket of the machine to Completed; returns
    /// their ids.
    pub fn complete_all(&mut self, machine: &str) -> Vec<String> {
        // ---
        let mut closed = Vec::new();
        for t in self
            .tickets
            .iter_mut()
            .filter(|t| t.machine == machine && t.status != TicketStatus::Completed)
        {
            t.status = TicketStatus::Completed;
            closed.push(t.id.clone());
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn now() -> NaiveDateTime {
        at(2025, 6, 3, 12, 30).unwrap()
    }

    #[test]
    fn test_seed_tickets() {
        // ---
        let log = TicketLog::seeded();
        assert_eq!(log.len(), 3);

        let ids: Vec<_> = log.tickets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["MT-001", "MT-002", "MT-003"]);

        let mt3 = log.get("MT-003").unwrap();
        assert_eq!(mt3.machine, "Pump-03");
        assert_eq!(mt3.status, TicketStatus::Completed);
        assert_eq!(log.get("MT-001").unwrap().status, TicketStatus::Queue);
        assert_eq!(log.get("MT-002").unwrap().assignee.as_deref(), Some("Maria"));
    }

    #[test]
    fn test_next_id_is_fresh() {
        // ---
        let mut log = TicketLog::seeded();
        assert_eq!(log.next_id(), "MT-004");

        let id = log.open_scheduled("Dryer-04", "Bearing temp high", now());
        assert_eq!(id, "MT-004");
        assert_eq!(log.next_id(), "MT-005");
        assert_eq!(TicketLog::empty().next_id(), "MT-001");
    }

    #[test]
    fn test_open_scheduled_ticket_fields() {
        // ---
        let mut log = TicketLog::empty();
        let id = log.open_scheduled("Pump-03", "Vibration above normal", now());

        let t = log.get(&id).unwrap();
        assert_eq!(t.kind, TicketKind::Reactive);
        assert_eq!(t.reason, "Vibration above normal");
        assert_eq!(t.status, TicketStatus::Scheduled);
        assert_eq!(t.created, now());
        assert!(t.due.is_none());
        assert!(t.assignee.is_none());
    }

    #[test]
    fn test_open_scheduled_truncates_to_minute() {
        // ---
        let precise = NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_nano_opt(12, 30, 22, 194_355_682)
            .unwrap();
        let mut log = TicketLog::empty();
        let id = log.open_scheduled("Pump-03", "Bearing temp high", precise);

        assert_eq!(log.get(&id).unwrap().created, now());
        let json = serde_json::to_value(log.get(&id).unwrap()).unwrap();
        assert_eq!(json["created"], "2025-06-03T12:30:00");
    }

    #[test]
    fn test_open_for_excludes_scheduled_and_completed() {
        // ---
        let mut log = TicketLog::seeded();
        assert_eq!(log.open_for("Mixer-01"), ["MT-001"]);
        assert_eq!(log.open_for("Conveyor-02"), ["MT-002"]);
        assert!(log.open_for("Pump-03").is_empty());

        log.open_scheduled("Dryer-04", "Bearing temp high", now());
        assert!(log.open_for("Dryer-04").is_empty());
    }

    #[test]
    fn test_schedule_open() {
        // ---
        let mut log = TicketLog::seeded();
        assert_eq!(log.schedule_open("Conveyor-02"), ["MT-002"]);
        assert_eq!(log.get("MT-002").unwrap().status, TicketStatus::Scheduled);
        assert!(log.schedule_open("Conveyor-02").is_empty());
        assert!(log.schedule_open("Pump-03").is_empty());
    }

    #[test]
    fn test_complete_all_is_idempotent() {
        // ---
        let mut log = TicketLog::seeded();
        log.open_scheduled("Mixer-01", "Bearing temp high", now());

        let mut closed = log.complete_all("Mixer-01");
        closed.sort();
        assert_eq!(closed, ["MT-001", "MT-004"]);
        assert!(log
            .tickets()
            .iter()
            .filter(|t| t.machine == "Mixer-01")
            .all(|t| t.status == TicketStatus::Completed));

        let before = log.clone();
        assert!(log.complete_all("Mixer-01").is_empty());
        assert_eq!(log, before);
    }

    #[test]
    fn test_transitions_never_shrink_log() {
        // ---
        let mut log = TicketLog::seeded();
        log.schedule_open("Mixer-01");
        log.complete_all("Mixer-01");
        log.complete_all("Pump-03");
        assert_eq!(log.len(), 3);
    }
}
