//! CSV downloads: the maintenance-ticket log and the per-machine summary.
//!
//! Both are UTF-8, comma-separated, with a header row. Fields containing a
//! comma, quote or newline are quoted with inner quotes doubled.

use crate::dashboard::SummaryRow;
use crate::models::TICKET_TIME_FORMAT;
use crate::tickets::TicketLog;

// ---

pub const TICKETS_HEADER: &str = "Ticket #,Machine,Type,Reason,Created,Due,Assigned To,Status";
pub const SUMMARY_HEADER: &str = "Machine,Avg Temp,Avg Vib,Risk,Risk Score";

/// Placeholder for unset ticket fields.
const UNSET: &str = "-";

fn csv_field(s: &str) -> String {
    // ---
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn push_row(out: &mut String, fields: &[String]) {
    let cells: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&cells.join(","));
    out.push('\n');
}

/// The ticket log as CSV.
pub fn tickets_csv(log: &TicketLog) -> String {
    // ---
    let mut out = String::from(TICKETS_HEADER);
    out.push('\n');

    for t in log.tickets() {
        push_row(
            &mut out,
            &[
                t.id.clone(),
                t.machine.clone(),
                t.kind.to_string(),
                t.reason.clone(),
                t.created.format(TICKET_TIME_FORMAT).to_string(),
                t.due
                    .map_or_else(|| UNSET.to_string(), |d| d.format(TICKET_TIME_FORMAT).to_string()),
                t.assignee.clone().unwrap_or_else(|| UNSET.to_string()),
                t.status.to_string(),
            ],
        );
    }
    out
}

/// The summary report as CSV.
pub fn summary_csv(rows: &[SummaryRow]) -> String {
    // ---
    let mut out = String::from(SUMMARY_HEADER);
    out.push('\n');

    for r in rows {
        push_row(
            &mut out,
            &[
                r.machine.clone(),
                r.avg_temperature_f.to_string(),
                r.avg_vibration_g.to_string(),
                r.risk.to_string(),
                r.risk_score.to_string(),
            ],
        );
    }
    out
}
