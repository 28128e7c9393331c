//! One render pass: simulate every machine, derive risk and alerts, and
//! assemble the view a role sees.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::{Alert, Profile, RiskLabel, Role, Severity, TelemetrySample, Ticket};
use crate::risk::{derive_alerts, predictive_card, series_risk, PredictiveCard};
use crate::session::{ActionContext, DashboardError, SessionState};
use crate::simulator::{Environment, MachineSeries, Simulator};
use crate::Config;

// ---

/// Samples shown in each machine's mini chart.
pub const CHART_SAMPLES: usize = 30;

/// Format of the alert time shown next to each alert.
pub const ALERT_TIME_FORMAT: &str = "%H:%M";

/// Everything recomputed on a render. Never stored between requests.
#[derive(Debug, Clone)]
pub struct Snapshot {
    // ---
    pub rendered_at: DateTime<Utc>,
    pub machines: Vec<MachineSeries>,
    /// Risk score per machine, parallel to `machines`.
    pub risk_scores: Vec<u8>,
    pub alerts: Vec<Alert>,
    /// Cards for machines whose score predicts a failure.
    pub predictive: Vec<PredictiveCard>,
    pub environment: Environment,
}

/// Per-machine row of the summary report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    // ---
    pub machine: String,
    pub avg_temperature_f: f64,
    pub avg_vibration_g: f64,
    pub risk: RiskLabel,
    pub risk_score: u8,
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else {
        values.sum::<f64>() / n as f64
    }
}

impl Snapshot {
    /// Simulate all monitored machines for `state` at `now`.
    pub fn simulate<R: Rng + ?Sized>(
        cfg: &Config,
        state: &SessionState,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        // ---
        let simulator = Simulator::new(cfg.num_samples, now);
        let machines: Vec<MachineSeries> = cfg
            .machines()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let profile = Profile::select(i, state.is_repaired(name));
                simulator.simulate(rng, name, profile)
            })
            .collect();

        let risk_scores: Vec<u8> = machines.iter().map(series_risk).collect();
        let predictive = machines
            .iter()
            .zip(&risk_scores)
            .filter_map(|(m, &score)| predictive_card(m, score))
            .collect();
        let alerts = derive_alerts(&machines, now);
        let environment = Environment::simulate(rng);

        tracing::debug!(
            "Simulated {} machines, {} alerts",
            machines.len(),
            alerts.len()
        );

        Snapshot {
            rendered_at: now,
            machines,
            risk_scores,
            alerts,
            predictive,
            environment,
        }
    }

    /// Context for an action handled by this render. Tickets are stamped
    /// with the same instant (UTC) the alerts were raised at.
    pub fn action_context<'a>(&'a self, machines: &'a [&'a str]) -> ActionContext<'a> {
        // ---
        ActionContext {
            machines,
            alerts: &self.alerts,
            predictive: &self.predictive,
            now: self.rendered_at.naive_utc(),
        }
    }

    pub fn series(&self, machine: &str) -> Option<&MachineSeries> {
        self.machines.iter().find(|m| m.machine == machine)
    }

    /// Averages over the whole series and the latest label, per machine.
    pub fn summary(&self) -> Vec<SummaryRow> {
        // ---
        self.machines
            .iter()
            .zip(&self.risk_scores)
            .map(|(m, &risk_score)| SummaryRow {
                machine: m.machine.clone(),
                avg_temperature_f: mean(m.samples.iter().map(|s| s.temperature_f)),
                avg_vibration_g: mean(m.samples.iter().map(|s| s.vibration_g)),
                risk: m.latest_label(),
                risk_score,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub machines_monitored: usize,
    pub active_alerts: usize,
    pub high_risk_machines: usize,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineView {
    // ---
    pub machine: String,
    pub profile: Profile,
    pub risk: RiskLabel,
    pub risk_score: u8,
    pub temperature_f: Option<f64>,
    pub vibration_g: Option<f64>,
    pub chart: Vec<TelemetrySample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: Alert,
    pub time: String,
    pub acknowledged_by: Option<Role>,
    pub repair_scheduled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub approved: bool,
}

/// The full dashboard for one role.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    // ---
    pub rendered_at: DateTime<Utc>,
    /// Seconds until the client should render again; `None` outside demo mode.
    pub auto_refresh_secs: Option<u64>,
    /// Set when any High alert is active.
    pub critical: bool,
    pub kpis: Kpis,
    pub machines: Vec<MachineView>,
    /// Full series of the machine selected for detail, if any.
    pub detail: Option<MachineSeries>,
    pub alerts: Vec<AlertView>,
    pub predictive: Vec<PredictiveCard>,
    pub environment: Environment,
    pub attention: Vec<String>,
    /// High-label machines not yet repaired.
    pub high_risk: Vec<String>,
    /// Repaired machines, now simulated on the nominal profile.
    pub working_normally: Vec<String>,
    pub tickets: Vec<TicketView>,
    pub approvable: Vec<String>,
}

impl Dashboard {
    /// Assemble the view of `snapshot` for `role`, optionally with one
    /// machine's full series.
    pub fn build(
        cfg: &Config,
        snapshot: &Snapshot,
        state: &SessionState,
        role: Role,
        detail: Option<&str>,
    ) -> Result<Self, DashboardError> {
        // ---
        let detail = detail
            .map(|name| {
                snapshot
                    .series(name)
                    .cloned()
                    .ok_or_else(|| DashboardError::UnknownMachine(name.to_string()))
            })
            .transpose()?;

        let machines: Vec<MachineView> = snapshot
            .machines
            .iter()
            .zip(&snapshot.risk_scores)
            .map(|(m, &risk_score)| MachineView {
                machine: m.machine.clone(),
                profile: m.profile,
                risk: m.latest_label(),
                risk_score,
                temperature_f: m.latest().map(|s| s.temperature_f),
                vibration_g: m.latest().map(|s| s.vibration_g),
                chart: m.tail(CHART_SAMPLES).to_vec(),
            })
            .collect();

        let alerts: Vec<AlertView> = snapshot
            .alerts
            .iter()
            .map(|a| AlertView {
                alert: a.clone(),
                time: a.raised_at.format(ALERT_TIME_FORMAT).to_string(),
                acknowledged_by: state.acknowledged.get(&a.machine).copied(),
                repair_scheduled: state.scheduled.contains(&a.machine),
            })
            .collect();

        let high_risk = machines
            .iter()
            .filter(|m| m.risk == RiskLabel::High && !state.is_repaired(&m.machine))
            .map(|m| m.machine.clone())
            .collect();
        let working_normally = machines
            .iter()
            .filter(|m| state.is_repaired(&m.machine))
            .map(|m| m.machine.clone())
            .collect();

        let kpis = Kpis {
            machines_monitored: machines.len(),
            active_alerts: alerts
                .iter()
                .filter(|a| matches!(a.alert.severity, Severity::High | Severity::Medium))
                .count(),
            high_risk_machines: machines.iter().filter(|m| m.risk == RiskLabel::High).count(),
            role,
        };

        let tickets = state
            .tickets
            .tickets()
            .iter()
            .map(|t| TicketView {
                ticket: t.clone(),
                approved: state.approved.contains(&t.id),
            })
            .collect();

        Ok(Dashboard {
            rendered_at: snapshot.rendered_at,
            auto_refresh_secs: cfg.demo_mode.then_some(cfg.refresh_interval_secs),
            critical: snapshot.alerts.iter().any(|a| a.severity == Severity::High),
            kpis,
            machines,
            detail,
            alerts,
            predictive: snapshot.predictive.clone(),
            environment: snapshot.environment.clone(),
            attention: state.attention.iter().cloned().collect(),
            high_risk,
            working_normally,
            tickets,
            approvable: state.approvable(),
        })
    }
}
