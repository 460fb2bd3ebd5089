//! Durable per-device, per-day consumption records.
//!
//! The accumulator is the only writer; rankings and reports only read.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::models::{DailyConsumption, MonthToken};

// ---

/// Sum of a device's consumption over one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthTotal {
    pub total: f64,
    /// Number of day records found; zero means the month has no data.
    pub days: i64,
}

#[derive(Debug, Clone)]
pub struct ConsumptionStore {
    pool: SqlitePool,
}

impl ConsumptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, device_id: &str, day: NaiveDate) -> AppResult<Option<DailyConsumption>> {
        // ---
        let record = sqlx::query_as::<_, DailyConsumption>(
            r#"
            SELECT device_id, day, energy_start, energy_end, consumption
            FROM daily_consumption
            WHERE device_id = ? AND day = ?
            "#,
        )
        .bind(device_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn insert(&self, record: &DailyConsumption) -> AppResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO daily_consumption (device_id, day, energy_start, energy_end, consumption)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.device_id)
        .bind(record.day)
        .bind(record.energy_start)
        .bind(record.energy_end)
        .bind(record.consumption)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite the end of the window; `energy_start` is never touched.
    pub async fn update(&self, record: &DailyConsumption) -> AppResult<()> {
        // ---
        sqlx::query(
            r#"
            UPDATE daily_consumption
            SET energy_end = ?, consumption = ?
            WHERE device_id = ? AND day = ?
            "#,
        )
        .bind(record.energy_end)
        .bind(record.consumption)
        .bind(&record.device_id)
        .bind(record.day)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All records of a device, oldest day first.
    pub async fn list_for_device(&self, device_id: &str) -> AppResult<Vec<DailyConsumption>> {
        // ---
        let records = sqlx::query_as::<_, DailyConsumption>(
            r#"
            SELECT device_id, day, energy_start, energy_end, consumption
            FROM daily_consumption
            WHERE device_id = ?
            ORDER BY day ASC
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Per-device sums for one month, largest first, ties by device id.
    ///
    /// Devices without records in the month are absent from the result.
    pub async fn monthly_totals(&self, month: &MonthToken) -> AppResult<Vec<(String, f64)>> {
        // ---
        let totals = sqlx::query_as::<_, (String, f64)>(
            r#"
            SELECT device_id, SUM(consumption) AS total
            FROM daily_consumption
            WHERE substr(day, 1, 7) = ?
            GROUP BY device_id
            ORDER BY total DESC, device_id ASC
            "#,
        )
        .bind(month.prefix())
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn device_month_total(&self, device_id: &str, month: &MonthToken) -> AppResult<MonthTotal> {
        // ---
        let (total, days) = sqlx::query_as::<_, (f64, i64)>(
            r#"
            SELECT COALESCE(SUM(consumption), 0.0) AS total, COUNT(*) AS days
            FROM daily_consumption
            WHERE device_id = ? AND substr(day, 1, 7) = ?
            "#,
        )
        .bind(device_id)
        .bind(month.prefix())
        .fetch_one(&self.pool)
        .await?;

        Ok(MonthTotal { total, days })
    }
}


#[cfg(test)]
mod tests {
    // ---
    use super::test_support::seed_day;
    use super::*;
    use crate::schema::test_support::memory_pool;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_update() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        let d = day("2026-01-05");
        assert!(store.get("PAC_01", d).await.unwrap().is_none());

        let mut record = DailyConsumption::first_observation("PAC_01", d, 1000.0);
        store.insert(&record).await.unwrap();
        assert_eq!(store.get("PAC_01", d).await.unwrap(), Some(record.clone()));

        record.observe(1012.5);
        store.update(&record).await.unwrap();
        let stored = store.get("PAC_01", d).await.unwrap().unwrap();
        assert_eq!(stored.energy_start, 1000.0);
        assert_eq!(stored.energy_end, 1012.5);
        assert_eq!(stored.consumption, 12.5);
    }

    #[tokio::test]
    async fn test_list_for_device_is_ordered_by_day() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        seed_day(&store, "PAC_01", "2026-01-03", 1.0).await;
        seed_day(&store, "PAC_01", "2026-01-01", 2.0).await;
        seed_day(&store, "PAC_02", "2026-01-02", 3.0).await;
        seed_day(&store, "PAC_01", "2026-01-02", 4.0).await;

        let days: Vec<String> = store
            .list_for_device("PAC_01")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.day.to_string())
            .collect();
        assert_eq!(days, ["2026-01-01", "2026-01-02", "2026-01-03"]);
    }

    #[tokio::test]
    async fn test_monthly_totals_match_prefix_only() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        seed_day(&store, "PAC_01", "2026-01-01", 10.0).await;
        seed_day(&store, "PAC_01", "2026-01-31", 5.5).await;
        seed_day(&store, "PAC_01", "2026-02-01", 99.0).await;
        seed_day(&store, "PAC_02", "2026-01-15", 20.0).await;

        let month = MonthToken::parse("2026-01").unwrap();
        let totals = store.monthly_totals(&month).await.unwrap();
        assert_eq!(
            totals,
            vec![("PAC_02".to_string(), 20.0), ("PAC_01".to_string(), 15.5)]
        );
    }

    #[tokio::test]
    async fn test_device_month_total_without_data() {
        // ---
        let store = ConsumptionStore::new(memory_pool().await);
        seed_day(&store, "PAC_01", "2026-01-01", 10.0).await;

        let feb = MonthToken::parse("2026-02").unwrap();
        let total = store.device_month_total("PAC_01", &feb).await.unwrap();
        assert_eq!(total, MonthTotal { total: 0.0, days: 0 });
    }
}
