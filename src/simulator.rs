//! Synthetic telemetry generator.
//!
//! Every render re-simulates the full series of every monitored machine.
//! Nothing here is persisted: the only input carried between renders is the
//! set of repaired machines, which forces the nominal "repaired" profile.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::models::{Profile, RiskLabel, TelemetrySample};

// ---

/// Temperature above which the degrading-medium machine is labelled Medium.
pub const MEDIUM_TEMP_THRESHOLD: f64 = 77.0;

/// Simulation parameters for one profile.
struct Params {
    temp_base: f64,
    temp_ramp: f64,
    temp_sd: f64,
    vib_base: f64,
    vib_ramp: f64,
    vib_sd: f64,
}

impl Params {
    fn for_profile(profile: Profile) -> Self {
        // ---
        match profile {
            Profile::Nominal => Params {
                temp_base: 68.0,
                temp_ramp: 0.0,
                temp_sd: 1.0,
                vib_base: 1.0,
                vib_ramp: 0.0,
                vib_sd: 0.09,
            },
            Profile::DegradingMedium => Params {
                temp_base: 72.0,
                temp_ramp: 6.0,
                temp_sd: 1.1,
                vib_base: 1.1,
                vib_ramp: 0.0,
                vib_sd: 0.14,
            },
            Profile::DegradingHigh => Params {
                temp_base: 75.0,
                temp_ramp: 20.0,
                temp_sd: 2.0,
                vib_base: 1.4,
                vib_ramp: 2.0,
                vib_sd: 0.18,
            },
            Profile::Repaired => Params {
                temp_base: 68.0,
                temp_ramp: 0.0,
                temp_sd: 0.7,
                vib_base: 1.0,
                vib_ramp: 0.0,
                vib_sd: 0.1,
            },
        }
    }
}

/// Label a sample at simulation time. Deliberately independent of the
/// numeric risk score.
fn label_for(profile: Profile, temperature_f: f64) -> RiskLabel {
    // ---
    match profile {
        Profile::DegradingHigh => RiskLabel::High,
        Profile::DegradingMedium if temperature_f > MEDIUM_TEMP_THRESHOLD => RiskLabel::Medium,
        _ => RiskLabel::Low,
    }
}

/// `i`-th point of an evenly spaced ramp from 0 to `span` over `n` points.
fn ramp(i: usize, n: usize, span: f64) -> f64 {
    // ---
    if n < 2 {
        0.0
    } else {
        span * i as f64 / (n - 1) as f64
    }
}

fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + sd * z
}

/// Full simulated series for one machine.
#[derive(Debug, Clone, Serialize)]
pub struct MachineSeries {
    // ---
    pub machine: String,
    pub profile: Profile,
    pub samples: Vec<TelemetrySample>,
}

impl MachineSeries {
    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.last()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temperature_f).collect()
    }

    pub fn vibrations(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.vibration_g).collect()
    }

    /// Label of the final sample; an empty series counts as Low.
    pub fn latest_label(&self) -> RiskLabel {
        self.latest().map_or(RiskLabel::Low, |s| s.risk)
    }

    /// The last `n` samples (or all of them when shorter), oldest first.
    pub fn tail(&self, n: usize) -> &[TelemetrySample] {
        let start = self.samples.len().saturating_sub(n);
        &self.samples[start..]
    }
}

/// Generates fixed-length, one-minute-spaced series ending at `end`.
#[derive(Debug, Clone)]
pub struct Simulator {
    num_samples: usize,
    end: DateTime<Utc>,
}

impl Simulator {
    pub fn new(num_samples: usize, end: DateTime<Utc>) -> Self {
        Self { num_samples, end }
    }

    /// Simulate `machine` with the given profile.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        machine: &str,
        profile: Profile,
    ) -> MachineSeries {
        // ---
        let p = Params::for_profile(profile);
        let n = self.num_samples;

        let samples = (0..n)
            .map(|i| {
                let temperature_f =
                    p.temp_base + ramp(i, n, p.temp_ramp) + gaussian(rng, 0.0, p.temp_sd);
                let vibration_g =
                    p.vib_base + ramp(i, n, p.vib_ramp) + gaussian(rng, 0.0, p.vib_sd);
                TelemetrySample {
                    timestamp: self.end - Duration::minutes((n - 1 - i) as i64),
                    temperature_f,
                    vibration_g,
                    risk: label_for(profile, temperature_f),
                }
            })
            .collect();

        MachineSeries {
            machine: machine.to_string(),
            profile,
            samples,
        }
    }
}

/// Plant-floor environment readings shown next to the machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    // ---
    pub temperature_f: i64,
    pub humidity_pct: i64,
    pub co2_ppm: i64,
    pub air_quality: AirQuality,
    pub out_of_range: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQuality {
    Good,
    Alert,
}

impl Environment {
    pub fn from_readings(temperature_f: i64, humidity_pct: i64, co2_ppm: i64) -> Self {
        // ---
        Environment {
            temperature_f,
            humidity_pct,
            co2_ppm,
            air_quality: if co2_ppm < 600 {
                AirQuality::Good
            } else {
                AirQuality::Alert
            },
            out_of_range: temperature_f > 80 || co2_ppm > 600,
        }
    }

    /// Draw one set of environment readings.
    pub fn simulate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // ---
        let temperature_f = gaussian(rng, 70.0, 2.0).clamp(66.0, 85.0) as i64;
        let humidity_pct = gaussian(rng, 47.0, 4.0).clamp(40.0, 65.0) as i64;
        let co2_ppm = gaussian(rng, 500.0, 60.0).clamp(400.0, 900.0) as i64;
        Self::from_readings(temperature_f, humidity_pct, co2_ppm)
    }
}
