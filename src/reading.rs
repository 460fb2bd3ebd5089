//! Cumulative energy readings per device.
//!
//! The accumulator only depends on [`ReadingSource`], so a real meter poller
//! can replace [`SimulatedMeter`] without touching the accumulation logic.

use std::{collections::HashMap, sync::Mutex};

use rand::Rng;

use crate::models::Device;

// ---

/// Produces the current cumulative energy counter (kWh) of a device.
pub trait ReadingSource: Send + Sync {
    fn read(&self, device: &Device) -> f64;
}

/// Starting counter value of every simulated device, in hundredths of kWh.
const INITIAL_COUNTER_CENTI: u64 = 100_000;

/// In-memory meter whose counters grow by a random step on every read.
///
/// Counters are held in hundredths of a kWh so each read is exactly
/// representable with two decimals and strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct SimulatedMeter {
    counters: Mutex<HashMap<&'static str, u64>>,
}

impl SimulatedMeter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadingSource for SimulatedMeter {
    fn read(&self, device: &Device) -> f64 {
        // ---
        let step: u64 = rand::thread_rng().gen_range(1..200);
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = counters.entry(device.id).or_insert(INITIAL_COUNTER_CENTI);
        *counter += step;
        *counter as f64 / 100.0
    }
}
