//! Daily accumulator background task.
//!
//! Every poll interval, samples each device's cumulative counter and folds it
//! into that device's record for the current (UTC) day.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::{sync::watch, time::interval};

use crate::{
    error::AppResult,
    models::{DailyConsumption, Device},
    reading::ReadingSource,
    store::ConsumptionStore,
};

// ---

/// What one tick did, per device outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Readings below the day's starting counter, left unrecorded.
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Inserted,
    Updated,
    Skipped,
}

/// Run one accumulation pass for `day` over every device.
///
/// Store failures are logged and counted; the next tick retries the same
/// overwrite, so nothing is propagated.
pub async fn tick(
    store: &ConsumptionStore,
    source: &dyn ReadingSource,
    devices: &[Device],
    day: NaiveDate,
) -> TickSummary {
    // ---
    let mut summary = TickSummary::default();

    for device in devices {
        let reading = source.read(device);

        match accumulate(store, device, day, reading).await {
            Ok(Outcome::Inserted) => summary.inserted += 1,
            Ok(Outcome::Updated) => summary.updated += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                tracing::error!("Failed to accumulate {} for {}: {}", device.id, day, e);
                summary.failed += 1;
            }
        }
    }

    tracing::debug!(
        "Tick {}: {} inserted, {} updated, {} skipped, {} failed",
        day,
        summary.inserted,
        summary.updated,
        summary.skipped,
        summary.failed
    );
    summary
}

async fn accumulate(
    store: &ConsumptionStore,
    device: &Device,
    day: NaiveDate,
    reading: f64,
) -> AppResult<Outcome> {
    // ---
    let Some(mut record) = store.get(device.id, day).await? else {
        store
            .insert(&DailyConsumption::first_observation(device.id, day, reading))
            .await?;
        return Ok(Outcome::Inserted);
    };

    if reading < record.energy_start {
        tracing::warn!(
            "Counter dip on {} for {}: reading {:.2} below day start {:.2}, not recorded",
            device.id,
            day,
            reading,
            record.energy_start
        );
        return Ok(Outcome::Skipped);
    }

    record.observe(reading);
    store.update(&record).await?;
    Ok(Outcome::Updated)
}

/// Accumulator loop: ticks every `period` until `shutdown` flips to `true`.
pub async fn run(
    store: ConsumptionStore,
    source: Box<dyn ReadingSource>,
    devices: &'static [Device],
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // ---
    tracing::info!("Daily accumulator started (interval: {}s)", period.as_secs());

    let mut interval = interval(period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let today = Utc::now().date_naive();
                tick(&store, source.as_ref(), devices, today).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Daily accumulator stopped");
}

#[cfg(test)]
mod tests {
    // ---
    use std::{collections::HashMap, sync::Mutex};

    use super::*;
    use crate::{models::DEVICES, schema::test_support::memory_pool};

    /// Replays a scripted sequence of readings per device.
    struct ScriptedSource {
        readings: Mutex<HashMap<&'static str, Vec<f64>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<(&'static str, Vec<f64>)>) -> Self {
            // ---
            let readings = script
                .into_iter()
                .map(|(id, mut values)| {
                    values.reverse();
                    (id, values)
                })
                .collect();
            Self {
                readings: Mutex::new(readings),
            }
        }
    }

    impl ReadingSource for ScriptedSource {
        fn read(&self, device: &Device) -> f64 {
            self.readings
                .lock()
                .unwrap()
                .get_mut(device.id)
                .and_then(|v| v.pop())
                .expect("scripted reading")
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_first_tick_inserts_then_updates() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let source = ScriptedSource::new(vec![("PAC_01", vec![1000.0, 1004.25, 1010.5])]);
        let devices = &DEVICES[..1];
        let d = day("2026-01-05");

        let first = tick(&store, &source, devices, d).await;
        assert_eq!(first, TickSummary { inserted: 1, ..Default::default() });
        let rec = store.get("PAC_01", d).await.unwrap().unwrap();
        assert_eq!((rec.energy_start, rec.energy_end, rec.consumption), (1000.0, 1000.0, 0.0));

        tick(&store, &source, devices, d).await;
        let second = tick(&store, &source, devices, d).await;
        assert_eq!(second, TickSummary { updated: 1, ..Default::default() });

        let rec = store.get("PAC_01", d).await.unwrap().unwrap();
        assert_eq!(rec.energy_start, 1000.0);
        assert_eq!(rec.energy_end, 1010.5);
        assert_eq!(rec.consumption, rec.energy_end - rec.energy_start);
        assert_eq!(store.list_for_device("PAC_01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_day_starts_new_record() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let source = ScriptedSource::new(vec![("PAC_01", vec![1000.0, 1020.0, 1021.0])]);
        let devices = &DEVICES[..1];

        tick(&store, &source, devices, day("2026-01-05")).await;
        tick(&store, &source, devices, day("2026-01-05")).await;
        tick(&store, &source, devices, day("2026-01-06")).await;

        let records = store.list_for_device("PAC_01").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].consumption, 20.0);
        assert_eq!(records[1].energy_start, 1021.0);
        assert_eq!(records[1].consumption, 0.0);
    }

    #[tokio::test]
    async fn test_restart_keeps_day_baseline() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let d = day("2026-01-05");
        tick(&store, &ScriptedSource::new(vec![("PAC_01", vec![1000.0])]), &DEVICES[..1], d).await;

        // A fresh source stands in for a restarted process.
        let restarted = ScriptedSource::new(vec![("PAC_01", vec![1030.0])]);
        let summary = tick(&store, &restarted, &DEVICES[..1], d).await;

        assert_eq!(summary.updated, 1);
        let rec = store.get("PAC_01", d).await.unwrap().unwrap();
        assert_eq!(rec.energy_start, 1000.0);
        assert_eq!(rec.consumption, 30.0);
    }

    #[tokio::test]
    async fn test_counter_dip_is_skipped() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let source = ScriptedSource::new(vec![("PAC_01", vec![1000.0, 1005.0, 3.0])]);
        let devices = &DEVICES[..1];
        let d = day("2026-01-05");

        tick(&store, &source, devices, d).await;
        tick(&store, &source, devices, d).await;
        let summary = tick(&store, &source, devices, d).await;

        assert_eq!(summary, TickSummary { skipped: 1, ..Default::default() });
        let rec = store.get("PAC_01", d).await.unwrap().unwrap();
        assert_eq!((rec.energy_end, rec.consumption), (1005.0, 5.0));
    }

    #[tokio::test]
    async fn test_store_failure_is_counted_not_raised() {
        // ---
        let pool = memory_pool().await;
        sqlx::query("DROP TABLE daily_consumption")
            .execute(&pool)
            .await
            .unwrap();
        let store = ConsumptionStore::new(pool);
        let source = ScriptedSource::new(vec![("PAC_01", vec![1000.0]), ("PAC_02", vec![2000.0])]);

        let summary = tick(&store, &source, &DEVICES[..2], day("2026-01-05")).await;
        assert_eq!(summary, TickSummary { failed: 2, ..Default::default() });
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(
            store.clone(),
            Box::new(crate::reading::SimulatedMeter::new()),
            DEVICES,
            Duration::from_millis(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("accumulator should stop")
            .unwrap();

        let today = Utc::now().date_naive();
        for device in DEVICES {
            assert!(store.get(device.id, today).await.unwrap().is_some());
        }
    }
}
