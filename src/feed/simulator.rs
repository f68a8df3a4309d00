//! Simulated Bioharness source
//!
//! Produces the same streams a Bioharness chest strap delivers: waveform
//! streams at their native sample rates plus the once-per-tick summary
//! values. Waveforms are synthetic and deterministic in elapsed time.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::time::Duration;

use crate::websocket::SensorFrame;

/// Waveform streams and their sample rates (Hz)
const WAVEFORMS: [(&str, f64); 6] = [
    ("ecg", 250.0),
    ("breathing", 25.0),
    ("rr", 18.0),
    ("acceleration_x", 100.0),
    ("acceleration_y", 100.0),
    ("acceleration_z", 100.0),
];

/// Summary values emitted once per tick as one-sample batches
pub const SUMMARY_SERIES: [&str; 3] = ["heart_rate", "respiration_rate", "ecg_confidence"];

#[derive(Debug, Clone)]
struct Stream {
    name: &'static str,
    rate_hz: f64,
    emitted: u64,
}

/// Deterministic Bioharness frame generator
#[derive(Debug, Clone)]
pub struct BioharnessSimulator {
    streams: Vec<Stream>,
    elapsed: Duration,
}

impl BioharnessSimulator {
    pub fn new() -> Self {
        Self {
            streams: WAVEFORMS
                .iter()
                .map(|&(name, rate_hz)| Stream {
                    name,
                    rate_hz,
                    emitted: 0,
                })
                .collect(),
            elapsed: Duration::ZERO,
        }
    }

    /// Names of every series the simulator emits
    pub fn series_names() -> impl Iterator<Item = &'static str> {
        WAVEFORMS
            .iter()
            .map(|&(name, _)| name)
            .chain(SUMMARY_SERIES.iter().copied())
    }

    /// Advance by `tick` and return every sample produced in that span.
    ///
    /// Sample counts follow each stream's rate exactly over time, so a
    /// 1-second tick yields 250 ECG samples and a 100 ms tick yields 25.
    pub fn advance(&mut self, tick: Duration) -> BTreeMap<String, Vec<f64>> {
        self.elapsed += tick;
        let now = self.elapsed.as_secs_f64();

        let mut batches = BTreeMap::new();
        for stream in &mut self.streams {
            let due = (stream.rate_hz * now).floor() as u64;
            let batch: Vec<f64> = (stream.emitted..due)
                .map(|i| waveform(stream.name, i as f64 / stream.rate_hz))
                .collect();
            stream.emitted = due;
            batches.insert(stream.name.to_string(), batch);
        }

        batches.insert("heart_rate".to_string(), vec![round1(heart_rate(now))]);
        batches.insert(
            "respiration_rate".to_string(),
            vec![round1(respiration_rate(now))],
        );
        batches.insert("ecg_confidence".to_string(), vec![100.0]);

        batches
    }

    /// Advance and wrap the samples in a bioharness frame
    pub fn next_frame(&mut self, tick: Duration, timestamp_ms: i64) -> SensorFrame {
        SensorFrame::bioharness(timestamp_ms, self.advance(tick))
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for BioharnessSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Heart rate drifting slowly around 70 bpm
fn heart_rate(t: f64) -> f64 {
    70.0 + 6.0 * (TAU * t / 90.0).sin()
}

/// Respiration rate around 15 breaths per minute
fn respiration_rate(t: f64) -> f64 {
    15.0 + 2.0 * (TAU * t / 120.0).sin()
}

fn waveform(name: &str, t: f64) -> f64 {
    match name {
        "ecg" => ecg(t),
        "breathing" => 500.0 + 200.0 * (TAU * respiration_rate(t) / 60.0 * t).sin(),
        // R-R interval in seconds
        "rr" => 60.0 / heart_rate(t),
        "acceleration_x" => 1.0 + 0.05 * (TAU * 1.7 * t).sin(),
        "acceleration_y" => 0.03 * (TAU * 0.9 * t).cos(),
        "acceleration_z" => 0.02 * (TAU * 2.3 * t).sin(),
        _ => 0.0,
    }
}

/// Crude ECG trace: a narrow R peak once per beat over a small baseline wave
fn ecg(t: f64) -> f64 {
    let beat = 60.0 / heart_rate(t);
    let phase = (t % beat) / beat;
    let r_peak = (-((phase - 0.3) / 0.015).powi(2)).exp();
    let t_wave = 0.25 * (-((phase - 0.6) / 0.06).powi(2)).exp();
    512.0 + 400.0 * r_peak + 100.0 * t_wave
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
