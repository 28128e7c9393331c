//! Failure-risk scoring and alert derivation.
//!
//! Two derivations coexist. The numeric score is a linear blend of the
//! recent sensor means. The alert severity comes from the label assigned to
//! the final sample at simulation time. Neither feeds the other.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Alert, RiskLabel, Severity, DEGRADING_HIGH_INDEX};
use crate::simulator::{MachineSeries, MEDIUM_TEMP_THRESHOLD};

// ---

/// Number of trailing samples the score averages over.
pub const RISK_WINDOW: usize = 10;

/// Final temperature above which a High alert blames the bearing.
pub const BEARING_TEMP_THRESHOLD: f64 = 85.0;

/// Score above which a machine gets a predictive card.
pub const PREDICTIVE_CARD_THRESHOLD: u8 = 60;

fn recent_mean(values: &[f64]) -> Option<f64> {
    // ---
    let start = values.len().saturating_sub(RISK_WINDOW);
    let window = &values[start..];
    if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// Failure risk in `[0, 100]` from the last ten temperature (°F) and
/// vibration (g) samples.
///
/// Temperature contributes 60% between 70°F and 100°F, vibration 40%
/// between 1g and 3g. Empty input scores 0.
pub fn failure_risk(temperatures: &[f64], vibrations: &[f64]) -> u8 {
    // ---
    let (Some(temp), Some(vib)) = (recent_mean(temperatures), recent_mean(vibrations)) else {
        return 0;
    };
    let temp_risk = ((temp - 70.0) / 30.0).clamp(0.0, 1.0);
    let vib_risk = ((vib - 1.0) / 2.0).clamp(0.0, 1.0);
    let score = (100.0 * (0.6 * temp_risk + 0.4 * vib_risk)).round();

    // NaN input collapses to 0 through the saturating cast
    score as u8
}

/// Risk score of a simulated series.
pub fn series_risk(series: &MachineSeries) -> u8 {
    failure_risk(&series.temperatures(), &series.vibrations())
}

/// Alert for one machine from its final sample, if its label warrants one.
pub fn alert_for(series: &MachineSeries, now: DateTime<Utc>) -> Option<Alert> {
    // ---
    let last = series.latest()?;
    let (severity, message) = match last.risk {
        RiskLabel::High if last.temperature_f > BEARING_TEMP_THRESHOLD => {
            (Severity::High, "Bearing temp high")
        }
        RiskLabel::High => (Severity::High, "Vibration above normal"),
        RiskLabel::Medium if last.temperature_f > MEDIUM_TEMP_THRESHOLD => {
            (Severity::Medium, "Temperature rising")
        }
        RiskLabel::Medium => (Severity::Medium, "Vibration above normal"),
        RiskLabel::Low => return None,
    };

    Some(Alert {
        machine: series.machine.clone(),
        message: message.to_string(),
        severity,
        raised_at: now,
    })
}

/// Alerts for all machines, in machine order.
///
/// The dashboard never shows an empty alert list: when no machine alerts, a
/// High "Bearing temp high" alert is injected for the third catalog machine.
pub fn derive_alerts(machines: &[MachineSeries], now: DateTime<Utc>) -> Vec<Alert> {
    // ---
    let mut alerts: Vec<Alert> = machines.iter().filter_map(|m| alert_for(m, now)).collect();

    if alerts.is_empty() {
        if let Some(fallback) = machines.get(DEGRADING_HIGH_INDEX) {
            tracing::debug!("No machine alerting, injecting fallback for {}", fallback.machine);
            alerts.push(Alert {
                machine: fallback.machine.clone(),
                message: "Bearing temp high".to_string(),
                severity: Severity::High,
                raised_at: now,
            });
        }
    }
    alerts
}

/// Card shown to operators for machines the score flags as likely to fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictiveCard {
    // ---
    pub machine: String,
    pub risk_score: u8,
    pub kind: &'static str,
    pub advice: &'static str,
    pub status: &'static str,
}

/// Predictive card for a machine, if its score exceeds the card threshold.
pub fn predictive_card(series: &MachineSeries, risk_score: u8) -> Option<PredictiveCard> {
    // ---
    if risk_score <= PREDICTIVE_CARD_THRESHOLD {
        return None;
    }
    let high = series.latest_label() == RiskLabel::High;
    Some(PredictiveCard {
        machine: series.machine.clone(),
        risk_score,
        kind: if high { "Predicted failure" } else { "Caution" },
        advice: if high {
            "Schedule inspection immediately"
        } else {
            "Monitor closely"
        },
        status: if high { "Queue" } else { "Pending" },
    })
}
