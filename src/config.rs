//! Configuration loader for the `maintenance-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, bail, Result};

use crate::models::{DEGRADING_HIGH_INDEX, MACHINE_CATALOG};

/// Parse an optional environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref().map(str::trim) {
            None | Some("") => $default,
            Some("1") | Some("true") | Some("yes") | Some("on") => true,
            Some("0") | Some("false") | Some("no") | Some("off") => false,
            Some(other) => bail!("Invalid {}: expected a boolean, got '{}'", $var_name, other),
        }
    };
}

/// Fewest samples a series may have; the risk score averages the last ten.
pub const MIN_SAMPLES: usize = 10;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Demo mode: the dashboard advertises an auto-refresh cadence.
    pub demo_mode: bool,

    /// Auto-refresh cadence in demo mode.
    pub refresh_interval_secs: u64,

    /// How many catalog machines are monitored.
    pub num_machines: usize,

    /// Samples per simulated series (one per minute).
    pub num_samples: usize,

    /// Seed for reproducible simulations; entropy when unset.
    pub sim_seed: Option<u64>,

    /// Sessions idle for longer than this are dropped when a new one opens.
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        // ---
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            demo_mode: true,
            refresh_interval_secs: 10,
            num_machines: 4,
            num_samples: 120,
            sim_seed: None,
            session_ttl_secs: 3600,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: 0.0.0.0:8080)
/// - `DEMO_MODE` – advertise auto-refresh (default: true)
/// - `REFRESH_INTERVAL_SECS` – auto-refresh cadence (default: 10)
/// - `NUM_MACHINES` – monitored catalog prefix, 3 to 10 (default: 4)
/// - `NUM_SAMPLES` – samples per series, at least 10 (default: 120)
/// - `SIM_SEED` – seed for reproducible telemetry (default: unset)
/// - `SESSION_TTL_SECS` – idle lifetime of a session (default: 3600)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let bind_addr = parse_env!("BIND_ADDR", SocketAddr, defaults.bind_addr);
    let demo_mode = parse_env_bool!("DEMO_MODE", defaults.demo_mode);
    let refresh_interval_secs =
        parse_env!("REFRESH_INTERVAL_SECS", u64, defaults.refresh_interval_secs);
    let num_machines = parse_env!("NUM_MACHINES", usize, defaults.num_machines);
    let num_samples = parse_env!("NUM_SAMPLES", usize, defaults.num_samples);
    let sim_seed = env::var("SIM_SEED")
        .ok()
        .map(|v| v.trim().parse::<u64>())
        .transpose()
        .map_err(|e| anyhow!("Invalid SIM_SEED: {}", e))?;
    let session_ttl_secs = parse_env!("SESSION_TTL_SECS", u64, defaults.session_ttl_secs);

    let cfg = Config {
        bind_addr,
        demo_mode,
        refresh_interval_secs,
        num_machines,
        num_samples,
        sim_seed,
        session_ttl_secs,
    };
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    /// Reject values the simulation cannot honour.
    pub fn validate(&self) -> Result<()> {
        // ---
        if self.num_machines <= DEGRADING_HIGH_INDEX || self.num_machines > MACHINE_CATALOG.len() {
            bail!(
                "NUM_MACHINES must be between {} and {}, got {}",
                DEGRADING_HIGH_INDEX + 1,
                MACHINE_CATALOG.len(),
                self.num_machines
            );
        }
        if self.num_samples < MIN_SAMPLES {
            bail!(
                "NUM_SAMPLES must be at least {}, got {}",
                MIN_SAMPLES,
                self.num_samples
            );
        }
        if self.demo_mode && self.refresh_interval_secs == 0 {
            bail!("REFRESH_INTERVAL_SECS must be positive in demo mode");
        }
        if self.session_ttl_secs == 0 {
            bail!("SESSION_TTL_SECS must be positive");
        }
        Ok(())
    }

    /// Names of the monitored machines, in catalog order.
    pub fn machines(&self) -> Vec<&'static str> {
        MACHINE_CATALOG[..self.num_machines.min(MACHINE_CATALOG.len())].to_vec()
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR             : {}", self.bind_addr);
        tracing::info!("  DEMO_MODE             : {}", self.demo_mode);
        tracing::info!("  REFRESH_INTERVAL_SECS : {}", self.refresh_interval_secs);
        tracing::info!("  NUM_MACHINES          : {}", self.num_machines);
        tracing::info!("  NUM_SAMPLES           : {}", self.num_samples);
        match self.sim_seed {
            Some(seed) => tracing::info!("  SIM_SEED              : {}", seed),
            None => tracing::info!("  SIM_SEED              : (entropy)"),
        }
        tracing::info!("  SESSION_TTL_SECS      : {}", self.session_ttl_secs);
    }
}
