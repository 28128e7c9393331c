//! Simple data models for the maintenance dashboard.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Every machine the plant knows about, in display order. The dashboard
/// monitors a prefix of this list.
pub const MACHINE_CATALOG: [&str; 10] = [
    "Mixer-01",
    "Conveyor-02",
    "Pump-03",
    "Dryer-04",
    "Chiller-05",
    "Press-06",
    "Blender-07",
    "Boiler-08",
    "Filter-09",
    "Separator-10",
];

/// Catalog position of the machine that always degrades towards failure.
pub const DEGRADING_HIGH_INDEX: usize = 2;

/// Catalog position of the machine that drifts into the medium band.
pub const DEGRADING_MEDIUM_INDEX: usize = 1;

/// Statistical profile used to simulate a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    Nominal,
    DegradingMedium,
    DegradingHigh,
    Repaired,
}

impl Profile {
    /// Profile for the catalog entry at `index`, unless the machine has been
    /// repaired, which always wins.
    pub fn select(index: usize, repaired: bool) -> Self {
        // ---
        if repaired {
            return Profile::Repaired;
        }
        match index {
            DEGRADING_HIGH_INDEX => Profile::DegradingHigh,
            DEGRADING_MEDIUM_INDEX => Profile::DegradingMedium,
            _ => Profile::Nominal,
        }
    }
}

/// Coarse per-sample risk category assigned at simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
        };
        f.write_str(s)
    }
}

/// One synthetic sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    // ---
    pub timestamp: DateTime<Utc>,
    pub temperature_f: f64,
    pub vibration_g: f64,
    pub risk: RiskLabel,
}

/// Alert severity. Low risk never produces an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

/// Derived alert for one machine, regenerated on every render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    // ---
    pub machine: String,
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
}

/// Dashboard persona.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Operator,
    Maintenance,
    Supervisor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Operator => "Operator",
            Role::Maintenance => "Maintenance",
            Role::Supervisor => "Supervisor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketKind {
    Predictive,
    Preventive,
    Corrective,
    Reactive,
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketKind::Predictive => "Predictive",
            TicketKind::Preventive => "Preventive",
            TicketKind::Corrective => "Corrective",
            TicketKind::Reactive => "Reactive",
        };
        f.write_str(s)
    }
}

/// Ticket lifecycle. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Queue,
    Assigned,
    Scheduled,
    Completed,
}

impl TicketStatus {
    /// An open ticket is one nobody has scheduled or closed yet.
    pub fn is_open(self) -> bool {
        matches!(self, TicketStatus::Queue | TicketStatus::Assigned)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketStatus::Queue => "Queue",
            TicketStatus::Assigned => "Assigned",
            TicketStatus::Scheduled => "Scheduled",
            TicketStatus::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// Maintenance ticket as shown in the ticket table and CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    // ---
    pub id: String,
    pub machine: String,
    pub kind: TicketKind,
    pub reason: String,
    pub created: NaiveDateTime,
    pub due: Option<NaiveDateTime>,
    pub assignee: Option<String>,
    pub status: TicketStatus,
}

/// Format used for ticket timestamps everywhere they are displayed.
pub const TICKET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Ticket id for a sequence number, e.g. `MT-004`.
pub fn ticket_id(seq: u32) -> String {
    format!("MT-{seq:03}")
}

/// Sequence number of a ticket id produced by [`ticket_id`].
pub fn ticket_seq(id: &str) -> Option<u32> {
    id.strip_prefix("MT-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_profile_selection() {
        // ---
        assert_eq!(Profile::select(0, false), Profile::Nominal);
        assert_eq!(Profile::select(1, false), Profile::DegradingMedium);
        assert_eq!(Profile::select(2, false), Profile::DegradingHigh);
        assert_eq!(Profile::select(3, false), Profile::Nominal);
    }

    #[test]
    fn test_repaired_overrides_catalog_profile() {
        // ---
        for index in 0..MACHINE_CATALOG.len() {
            assert_eq!(Profile::select(index, true), Profile::Repaired);
        }
    }

    #[test]
    fn test_open_statuses() {
        // ---
        assert!(TicketStatus::Queue.is_open());
        assert!(TicketStatus::Assigned.is_open());
        assert!(!TicketStatus::Scheduled.is_open());
        assert!(!TicketStatus::Completed.is_open());
    }

    #[test]
    fn test_ticket_ids() {
        // ---
        assert_eq!(ticket_id(4), "MT-004");
        assert_eq!(ticket_id(1234), "MT-1234");
        assert_eq!(ticket_seq("MT-012"), Some(12));
        assert_eq!(ticket_seq("XX-012"), None);
        assert_eq!(ticket_seq("MT-abc"), None);
    }

    #[test]
    fn test_role_serde_names() {
        // ---
        let role: Role = serde_json::from_str("\"Maintenance\"").unwrap();
        assert_eq!(role, Role::Maintenance);
        assert_eq!(serde_json::to_string(&Role::Supervisor).unwrap(), "\"Supervisor\"");
        assert_eq!(Role::default(), Role::Operator);
    }
}
