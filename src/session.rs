//! Per-session dashboard state and the actions that mutate it.
//!
//! A [`SessionState`] is an immutable snapshot. [`SessionState::apply`]
//! never mutates in place: it returns the next snapshot together with an
//! [`Outcome`] describing what happened. Informational no-ops (approving an
//! approved ticket, acknowledging twice) are outcomes, not errors.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Alert, Role, TicketStatus};
use crate::risk::PredictiveCard;
use crate::tickets::TicketLog;

// ---

/// Session-lifetime flags plus the ticket log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    // ---
    /// Machine -> role that acknowledged its alert.
    pub acknowledged: BTreeMap<String, Role>,
    pub repaired: BTreeSet<String>,
    pub scheduled: BTreeSet<String>,
    pub approved: BTreeSet<String>,
    /// Machines an operator flagged for maintenance attention.
    pub attention: BTreeSet<String>,
    pub tickets: TicketLog,
}

/// A user action, tagged by `action` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Acknowledge {
        machine: String,
        #[serde(default)]
        role: Role,
    },
    NotifyMaintenance { machine: String },
    ScheduleRepair { machine: String },
    MarkRepaired { machine: String },
    ClearAttention { machine: String },
    Approve { ticket: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        // ---
        match self {
            Action::Acknowledge { .. } => "acknowledge",
            Action::NotifyMaintenance { .. } => "notify_maintenance",
            Action::ScheduleRepair { .. } => "schedule_repair",
            Action::MarkRepaired { .. } => "mark_repaired",
            Action::ClearAttention { .. } => "clear_attention",
            Action::Approve { .. } => "approve",
        }
    }

    /// Machine the action targets, if any.
    pub fn machine(&self) -> Option<&str> {
        // ---
        match self {
            Action::Acknowledge { machine, .. }
            | Action::NotifyMaintenance { machine }
            | Action::ScheduleRepair { machine }
            | Action::MarkRepaired { machine }
            | Action::ClearAttention { machine } => Some(machine.as_str()),
            Action::Approve { .. } => None,
        }
    }
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Acknowledged { machine: String, by: Role },
    AlreadyAcknowledged { machine: String, by: Role },
    MaintenanceNotified { machine: String },
    /// `created` is set when a new ticket was opened, otherwise `tickets`
    /// lists the open tickets moved to Scheduled.
    RepairScheduled {
        machine: String,
        created: Option<String>,
        tickets: Vec<String>,
    },
    AlreadyScheduled { machine: String },
    MarkedRepaired { machine: String, completed: Vec<String> },
    AlreadyRepaired { machine: String },
    AttentionCleared { machine: String },
    NotFlagged { machine: String },
    Approved { ticket: String },
    AlreadyApproved { ticket: String },
}

impl Outcome {
    /// Whether the action changed the session state.
    pub fn changed(&self) -> bool {
        // ---
        matches!(
            self,
            Outcome::Acknowledged { .. }
                | Outcome::MaintenanceNotified { .. }
                | Outcome::RepairScheduled { .. }
                | Outcome::MarkedRepaired { .. }
                | Outcome::AttentionCleared { .. }
                | Outcome::Approved { .. }
        )
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        // ---
        match self {
            Outcome::Acknowledged { machine, by } => format!("{machine} acknowledged by {by}"),
            Outcome::AlreadyAcknowledged { machine, by } => {
                format!("{machine} already acknowledged by {by}")
            }
            Outcome::MaintenanceNotified { machine } => {
                format!("Maintenance notified for {machine}")
            }
            Outcome::RepairScheduled { machine, .. } => format!("Repair scheduled for {machine}"),
            Outcome::AlreadyScheduled { machine } => {
                format!("Repair already scheduled for {machine}")
            }
            Outcome::MarkedRepaired { machine, .. } => format!("{machine} marked as repaired"),
            Outcome::AlreadyRepaired { machine } => format!("{machine} is already repaired"),
            Outcome::AttentionCleared { machine } => format!("Attention cleared for {machine}"),
            Outcome::NotFlagged { machine } => format!("{machine} was not flagged for attention"),
            Outcome::Approved { ticket } => format!("{ticket} approved"),
            Outcome::AlreadyApproved { ticket } => format!("{ticket} already approved"),
        }
    }
}

/// Requests the dashboard cannot serve: actions that cannot be applied, or
/// a render asking for something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("Unknown machine: {0}")]
    UnknownMachine(String),

    #[error("Unknown ticket: {0}")]
    UnknownTicket(String),

    #[error("No active alert for {0}")]
    NoActiveAlert(String),

    #[error("No predicted failure for {0}")]
    NoPredictedFailure(String),

    #[error("Ticket {ticket} is {status} and cannot be approved")]
    NotApprovable {
        ticket: String,
        status: TicketStatus,
    },
}

/// Everything an action may consult besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Monitored machine names.
    pub machines: &'a [&'a str],
    /// Alerts of the render that triggered the action.
    pub alerts: &'a [Alert],
    /// Predictive cards of the same render.
    pub predictive: &'a [PredictiveCard],
    pub now: NaiveDateTime,
}

impl SessionState {
    /// Fresh state: no flags set, seed tickets loaded.
    pub fn new() -> Self {
        // ---
        Self {
            acknowledged: BTreeMap::new(),
            repaired: BTreeSet::new(),
            scheduled: BTreeSet::new(),
            approved: BTreeSet::new(),
            attention: BTreeSet::new(),
            tickets: TicketLog::seeded(),
        }
    }

    pub fn is_repaired(&self, machine: &str) -> bool {
        self.repaired.contains(machine)
    }

    /// Apply one action, returning the next state and what happened.
    pub fn apply(
        &self,
        action: &Action,
        ctx: &ActionContext<'_>,
    ) -> Result<(SessionState, Outcome), DashboardError> {
        // ---
        if let Some(machine) = action.machine() {
            if !ctx.machines.iter().any(|m| *m == machine) {
                return Err(DashboardError::UnknownMachine(machine.to_string()));
            }
        }

        let mut next = self.clone();
        let outcome = match action {
            Action::Acknowledge { machine, role } => next.acknowledge(machine, *role, ctx)?,
            Action::NotifyMaintenance { machine } => {
                if !ctx.predictive.iter().any(|c| &c.machine == machine) {
                    return Err(DashboardError::NoPredictedFailure(machine.clone()));
                }
                next.attention.insert(machine.clone());
                Outcome::MaintenanceNotified {
                    machine: machine.clone(),
                }
            }
            Action::ScheduleRepair { machine } => next.schedule_repair(machine, ctx)?,
            Action::MarkRepaired { machine } => next.mark_repaired(machine),
            Action::ClearAttention { machine } => {
                if next.attention.remove(machine) {
                    Outcome::AttentionCleared {
                        machine: machine.clone(),
                    }
                } else {
                    Outcome::NotFlagged {
                        machine: machine.clone(),
                    }
                }
            }
            Action::Approve { ticket } => next.approve(ticket)?,
        };

        tracing::debug!("{} -> {:?}", action.name(), outcome);
        Ok((next, outcome))
    }

    fn acknowledge(
        &mut self,
        machine: &str,
        role: Role,
        ctx: &ActionContext<'_>,
    ) -> Result<Outcome, DashboardError> {
        // ---
        if let Some(by) = self.acknowledged.get(machine) {
            return Ok(Outcome::AlreadyAcknowledged {
                machine: machine.to_string(),
                by: *by,
            });
        }
        if !ctx.alerts.iter().any(|a| a.machine == machine) {
            return Err(DashboardError::NoActiveAlert(machine.to_string()));
        }

        self.acknowledged.insert(machine.to_string(), role);
        self.attention.insert(machine.to_string());
        Ok(Outcome::Acknowledged {
            machine: machine.to_string(),
            by: role,
        })
    }

    fn schedule_repair(
        &mut self,
        machine: &str,
        ctx: &ActionContext<'_>,
    ) -> Result<Outcome, DashboardError> {
        // ---
        if self.scheduled.contains(machine) {
            return Ok(Outcome::AlreadyScheduled {
                machine: machine.to_string(),
            });
        }
        let alert = ctx
            .alerts
            .iter()
            .find(|a| a.machine == machine)
            .ok_or_else(|| DashboardError::NoActiveAlert(machine.to_string()))?;

        self.scheduled.insert(machine.to_string());
        let outcome = if self.tickets.open_for(machine).is_empty() {
            let id = self.tickets.open_scheduled(machine, &alert.message, ctx.now);
            Outcome::RepairScheduled {
                machine: machine.to_string(),
                created: Some(id.clone()),
                tickets: vec![id],
            }
        } else {
            Outcome::RepairScheduled {
                machine: machine.to_string(),
                created: None,
                tickets: self.tickets.schedule_open(machine),
            }
        };
        Ok(outcome)
    }

    fn mark_repaired(&mut self, machine: &str) -> Outcome {
        // ---
        let completed = self.tickets.complete_all(machine);
        let newly_repaired = self.repaired.insert(machine.to_string());
        let cleared = self.attention.remove(machine);

        if !newly_repaired && completed.is_empty() && !cleared {
            Outcome::AlreadyRepaired {
                machine: machine.to_string(),
            }
        } else {
            Outcome::MarkedRepaired {
                machine: machine.to_string(),
                completed,
            }
        }
    }

    fn approve(&mut self, ticket: &str) -> Result<Outcome, DashboardError> {
        // ---
        if self.approved.contains(ticket) {
            return Ok(Outcome::AlreadyApproved {
                ticket: ticket.to_string(),
            });
        }
        let t = self
            .tickets
            .get(ticket)
            .ok_or_else(|| DashboardError::UnknownTicket(ticket.to_string()))?;
        if t.status != TicketStatus::Queue {
            return Err(DashboardError::NotApprovable {
                ticket: ticket.to_string(),
                status: t.status,
            });
        }

        self.approved.insert(ticket.to_string());
        Ok(Outcome::Approved {
            ticket: ticket.to_string(),
        })
    }

    /// Queue tickets a supervisor can still approve.
    pub fn approvable(&self) -> Vec<String> {
        // ---
        self.tickets
            .tickets()
            .iter()
            .filter(|t| t.status == TicketStatus::Queue && !self.approved.contains(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// One live session: its state snapshot and its own random stream.
#[derive(Debug)]
pub struct Session {
    pub state: SessionState,
    pub rng: StdRng,
    last_seen: Instant,
}

/// All live sessions, shared across request handlers.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    sessions: HashMap<Uuid, Session>,
    seeder: StdRng,
    idle_ttl: Duration,
}

impl SessionStore {
    /// Store whose sessions draw from `seed` when given, else from entropy.
    /// Sessions untouched for `idle_ttl` are dropped when a new one starts.
    pub fn new(seed: Option<u64>, idle_ttl: Duration) -> Self {
        // ---
        let seeder = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                sessions: HashMap::new(),
                seeder,
                idle_ttl,
            })),
        }
    }

    /// Start a session with fresh flags and seed tickets.
    pub fn create(&self) -> Uuid {
        // ---
        let mut inner = self.inner.lock();

        let ttl = inner.idle_ttl;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.last_seen.elapsed() < ttl);
        let expired = before - inner.sessions.len();
        if expired > 0 {
            tracing::info!("Expired {} idle sessions", expired);
        }

        let id = Uuid::new_v4();
        let rng = StdRng::seed_from_u64(inner.seeder.next_u64());
        inner.sessions.insert(
            id,
            Session {
                state: SessionState::new(),
                rng,
                last_seen: Instant::now(),
            },
        );
        tracing::info!("Session {} started ({} live)", id, inner.sessions.len());
        id
    }

    /// End a session; returns whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        // ---
        let mut inner = self.inner.lock();
        let existed = inner.sessions.remove(id).is_some();
        if existed {
            tracing::info!("Session {} ended ({} live)", id, inner.sessions.len());
        }
        existed
    }

    /// Run `f` with exclusive access to the session, if it exists.
    ///
    /// The store lock is held for the whole call, so one render or action
    /// per store runs at a time. Counts as activity for idle expiry.
    pub fn with_session<T>(&self, id: &Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        // ---
        let mut inner = self.inner.lock();
        let session = inner.sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(f(session))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
