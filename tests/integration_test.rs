use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_test::assert_ok;

use maintenance_dashboard::{routes, Config, SessionStore};

#[derive(Debug, Deserialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct MachineView {
    machine: String,
    risk: String,
    risk_score: u8,
    chart: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct AlertView {
    machine: String,
    severity: String,
    acknowledged_by: Option<String>,
    repair_scheduled: bool,
}

#[derive(Debug, Deserialize)]
struct TicketView {
    id: String,
    machine: String,
    status: String,
    approved: bool,
}

#[derive(Debug, Deserialize)]
struct Dashboard {
    auto_refresh_secs: Option<u64>,
    critical: bool,
    machines: Vec<MachineView>,
    alerts: Vec<AlertView>,
    attention: Vec<String>,
    working_normally: Vec<String>,
    tickets: Vec<TicketView>,
    approvable: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    changed: bool,
    message: String,
    outcome: Value,
}

/// Serve the real router on an ephemeral port and return its base URL.
async fn spawn_app() -> Result<String> {
    // ---
    let cfg = Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        sim_seed: Some(2025),
        ..Config::default()
    };
    let app = routes::router(
        SessionStore::new(cfg.sim_seed, Duration::from_secs(cfg.session_ttl_secs)),
        cfg.clone(),
    );

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{addr}"))
}

async fn new_session(client: &Client, base: &str) -> Result<String> {
    let created: SessionCreated = client
        .post(format!("{base}/sessions"))
        .send()
        .await?
        .json()
        .await?;
    Ok(created.session_id)
}

async fn dashboard(client: &Client, base: &str, id: &str) -> Result<Dashboard> {
    Ok(client
        .get(format!("{base}/sessions/{id}/dashboard"))
        .send()
        .await?
        .json()
        .await?)
}

async fn act(client: &Client, base: &str, id: &str, body: Value) -> Result<(StatusCode, Value)> {
    let resp = client
        .post(format!("{base}/sessions/{id}/actions"))
        .json(&body)
        .send()
        .await?;
    let status = resp.status();
    Ok((status, resp.json().await?))
}

#[tokio::test]
async fn health_is_ok() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let body: Value = Client::new()
        .get(format!("{base}/health"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn dashboard_renders_simulated_machines() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let id = new_session(&client, &base).await?;

    let dash = dashboard(&client, &base, &id).await?;

    assert_eq!(dash.machines.len(), 4);
    assert_eq!(dash.auto_refresh_secs, Some(10));
    assert!(dash.critical);
    for m in &dash.machines {
        assert!(m.risk_score <= 100, "{} scored {}", m.machine, m.risk_score);
        assert_eq!(m.chart.len(), 30);
    }

    // The third catalog machine always degrades to High.
    let pump = dash.machines.iter().find(|m| m.machine == "Pump-03").unwrap();
    assert_eq!(pump.risk, "High");
    assert!(dash
        .alerts
        .iter()
        .any(|a| a.machine == "Pump-03" && a.severity == "High"));

    let mt3 = dash.tickets.iter().find(|t| t.id == "MT-003").unwrap();
    assert_eq!(mt3.machine, "Pump-03");
    assert_eq!(mt3.status, "Completed");
    Ok(())
}

#[tokio::test]
async fn maintenance_workflow() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let id = new_session(&client, &base).await?;

    // Operator acknowledges, which flags the machine for maintenance.
    let (status, body) = act(
        &client,
        &base,
        &id,
        json!({ "action": "acknowledge", "machine": "Pump-03", "role": "Operator" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let ack: ActionResponse = serde_json::from_value(body)?;
    assert!(ack.changed);

    let dash = dashboard(&client, &base, &id).await?;
    assert_eq!(dash.attention, ["Pump-03"]);
    let pump_alert = dash.alerts.iter().find(|a| a.machine == "Pump-03").unwrap();
    assert_eq!(pump_alert.acknowledged_by.as_deref(), Some("Operator"));

    // Scheduling creates exactly one new ticket.
    let (status, body) = act(
        &client,
        &base,
        &id,
        json!({ "action": "schedule_repair", "machine": "Pump-03" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let scheduled: ActionResponse = serde_json::from_value(body)?;
    assert_eq!(scheduled.outcome["created"], "MT-004");

    let (_, body) = act(
        &client,
        &base,
        &id,
        json!({ "action": "schedule_repair", "machine": "Pump-03" }),
    )
    .await?;
    let again: ActionResponse = serde_json::from_value(body)?;
    assert!(!again.changed);
    assert_eq!(again.message, "Repair already scheduled for Pump-03");

    let dash = dashboard(&client, &base, &id).await?;
    assert_eq!(dash.tickets.len(), 4);
    let pump_alert = dash.alerts.iter().find(|a| a.machine == "Pump-03").unwrap();
    assert!(pump_alert.repair_scheduled);

    // Repair closes every ticket and clears the attention flag.
    let (status, _) = act(
        &client,
        &base,
        &id,
        json!({ "action": "mark_repaired", "machine": "Pump-03" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let dash = dashboard(&client, &base, &id).await?;
    assert_eq!(dash.working_normally, ["Pump-03"]);
    assert!(dash.attention.is_empty());
    assert!(dash
        .tickets
        .iter()
        .filter(|t| t.machine == "Pump-03")
        .all(|t| t.status == "Completed"));
    let pump = dash.machines.iter().find(|m| m.machine == "Pump-03").unwrap();
    assert_eq!(pump.risk, "Low");
    Ok(())
}

#[tokio::test]
async fn approval_is_idempotent() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let id = new_session(&client, &base).await?;

    let (status, body) = act(&client, &base, &id, json!({ "action": "approve", "ticket": "MT-001" })).await?;
    assert_eq!(status, StatusCode::OK);
    let first: ActionResponse = serde_json::from_value(body)?;
    assert!(first.changed);

    let (status, body) = act(&client, &base, &id, json!({ "action": "approve", "ticket": "MT-001" })).await?;
    assert_eq!(status, StatusCode::OK);
    let second: ActionResponse = serde_json::from_value(body)?;
    assert!(!second.changed);
    assert_eq!(second.outcome["outcome"], "already_approved");

    let dash = dashboard(&client, &base, &id).await?;
    assert!(dash.approvable.is_empty());
    assert!(dash.tickets.iter().find(|t| t.id == "MT-001").unwrap().approved);

    // Assigned tickets are not in the approval queue.
    let (status, _) = act(&client, &base, &id, json!({ "action": "approve", "ticket": "MT-002" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn rejects_unknown_targets() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let id = new_session(&client, &base).await?;

    let (status, _) = act(&client, &base, &id, json!({ "action": "mark_repaired", "machine": "Boiler-08" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = act(&client, &base, &id, json!({ "action": "approve", "ticket": "MT-404" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = "00000000-0000-0000-0000-000000000000";
    let resp = client.get(format!("{base}/sessions/{missing}/dashboard")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn sessions_are_isolated_and_deletable() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let a = new_session(&client, &base).await?;
    let b = new_session(&client, &base).await?;

    let (status, _) = act(&client, &base, &a, json!({ "action": "approve", "ticket": "MT-001" })).await?;
    assert_eq!(status, StatusCode::OK);

    let dash_b = dashboard(&client, &base, &b).await?;
    assert_eq!(dash_b.approvable, ["MT-001"]);

    let resp = client.delete(format!("{base}/sessions/{a}")).send().await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = client.get(format!("{base}/sessions/{a}/dashboard")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn csv_exports() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let id = new_session(&client, &base).await?;

    let resp = assert_ok!(
        client
            .get(format!("{base}/sessions/{id}/export/tickets.csv"))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[reqwest::header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let tickets = resp.text().await?;
    let lines: Vec<&str> = tickets.lines().collect();
    assert_eq!(lines[0], "Ticket #,Machine,Type,Reason,Created,Due,Assigned To,Status");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("MT-003,Pump-03,Corrective"));

    let summary = client
        .get(format!("{base}/sessions/{id}/export/summary.csv"))
        .send()
        .await?
        .text()
        .await?;
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0], "Machine,Avg Temp,Avg Vib,Risk,Risk Score");
    assert_eq!(lines.len(), 5);
    assert!(lines[3].starts_with("Pump-03,"));
    assert!(lines[3].contains(",High,"));
    Ok(())
}
