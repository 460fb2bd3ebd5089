//! Monthly aggregation: device rankings and two-month comparisons.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    error::AppResult,
    models::{device_name, round2, Device, MonthToken, Trend},
    store::{ConsumptionStore, MonthTotal},
};

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based rank.
    pub position: usize,
    #[serde(skip)]
    pub device_id: String,
    pub name: String,
    #[serde(rename = "consumption")]
    pub total: f64,
}

/// Ranking of the devices that recorded consumption in `month`.
///
/// Devices without records are omitted; see [`ranking_for_report`] for the
/// variant covering every device.
pub async fn rank_monthly(store: &ConsumptionStore, month: &MonthToken) -> AppResult<Vec<RankingEntry>> {
    // ---
    let totals = store.monthly_totals(month).await?;

    Ok(totals
        .into_iter()
        .enumerate()
        .map(|(i, (device_id, total))| RankingEntry {
            position: i + 1,
            name: device_name(&device_id).to_string(),
            device_id,
            total: round2(total),
        })
        .collect())
}

/// Ranking over the full device list, absent devices counting as zero.
///
/// Sorted by total descending, ties by device id.
pub fn ranking_for_report(devices: &[Device], totals: &[(String, f64)]) -> Vec<RankingEntry> {
    // ---
    let by_device: HashMap<&str, f64> = totals.iter().map(|(id, t)| (id.as_str(), *t)).collect();

    let mut rows: Vec<(&Device, f64)> = devices
        .iter()
        .map(|d| (d, by_device.get(d.id).copied().unwrap_or(0.0)))
        .collect();
    rows.sort_by(|(a, ta), (b, tb)| tb.total_cmp(ta).then_with(|| a.id.cmp(b.id)));

    rows.into_iter()
        .enumerate()
        .map(|(i, (device, total))| RankingEntry {
            position: i + 1,
            device_id: device.id.to_string(),
            name: device.name.to_string(),
            total,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub total_a: f64,
    pub total_b: f64,
    /// `total_b - total_a`.
    pub difference: f64,
    pub trend: Trend,
    pub missing_a: bool,
    pub missing_b: bool,
}

impl Comparison {
    /// Totals are rounded to two decimals first; the difference is taken
    /// from the rounded values so it matches what the report prints.
    pub fn from_totals(a: MonthTotal, b: MonthTotal) -> Self {
        // ---
        let (total_a, total_b) = (round2(a.total), round2(b.total));
        let difference = round2(total_b - total_a);
        Self {
            total_a,
            total_b,
            difference,
            trend: Trend::from_difference(difference),
            missing_a: a.days == 0,
            missing_b: b.days == 0,
        }
    }
}

/// Compare one device's totals for two months; both reads run concurrently.
pub async fn compare_months(
    store: &ConsumptionStore,
    device_id: &str,
    month_a: &MonthToken,
    month_b: &MonthToken,
) -> AppResult<Comparison> {
    // ---
    let (a, b) = tokio::try_join!(
        store.device_month_total(device_id, month_a),
        store.device_month_total(device_id, month_b),
    )?;

    Ok(Comparison::from_totals(a, b))
}
