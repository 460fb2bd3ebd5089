//! Consumption reports: monthly ranking and two-month comparison.
//!
//! A report is laid out once into a [`ReportDocument`], rendered once to PDF
//! bytes, and those bytes feed both the HTTP response and the archive copy
//! written by [`archive`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Local};

use crate::{
    error::{AppError, AppResult},
    models::{Device, MonthToken},
    ranking::{Comparison, RankingEntry},
};

mod layout;
mod pdf;

pub use layout::ReportDocument;
use layout::{Page, Tone, FOOTER_Y, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
pub use pdf::render;

// ---

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const LOGO_TOP: f32 = PAGE_HEIGHT - 40.0;
const LOGO_WIDTH: f32 = 80.0;
/// Header text starts here when a logo sits at the left margin.
const BESIDE_LOGO_X: f32 = 150.0;

/// What every report carries besides its body.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub company_name: String,
    pub generated_at: DateTime<Local>,
    pub requested_by: String,
    /// PNG bytes drawn at the top-left of the first page.
    pub logo: Option<Arc<Vec<u8>>>,
}

impl ReportContext {
    fn timestamp(&self) -> String {
        self.generated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Document with the footer hook installed and the brand header written.
    fn document(&self, title: &str) -> ReportDocument {
        // ---
        let stamp = self.timestamp();
        let footer = Box::new(move |page: &mut Page| {
            page.text(
                MARGIN,
                FOOTER_Y,
                9.0,
                Tone::Muted,
                format!("Confidential - internal use | Generated at {stamp}"),
            );
            page.text(
                PAGE_WIDTH - MARGIN - 45.0,
                FOOTER_Y,
                9.0,
                Tone::Muted,
                format!("Page {}", page.number),
            );
        });

        let mut doc = ReportDocument::new(title, footer);
        let x = match &self.logo {
            Some(png) => {
                doc.image(MARGIN, LOGO_TOP, LOGO_WIDTH, png.clone());
                BESIDE_LOGO_X
            }
            None => MARGIN,
        };
        doc.line_at(x, 16.0, Tone::Normal, self.company_name.as_str());
        doc.line_at(x, 14.0, Tone::Normal, title);
        doc.line_at(x, 10.0, Tone::Muted, format!("Generated at: {}", self.timestamp()));
        doc.line_at(x, 10.0, Tone::Muted, format!("Requested by: {}", self.requested_by));
        if self.logo.is_some() {
            doc.skip_below(LOGO_TOP - LOGO_WIDTH);
        }
        doc.rule();
        doc.gap(2.0);
        doc
    }
}

fn kwh(value: f64) -> String {
    format!("{value:.2} kWh")
}

/// Monthly ranking over every device, largest consumer first.
///
/// `ranking` is expected in report order (see `ranking::ranking_for_report`);
/// the grand total is the sum of its entries.
pub fn monthly_ranking_report(ctx: &ReportContext, month: &MonthToken, ranking: &[RankingEntry]) -> ReportDocument {
    // ---
    let mut doc = ctx.document("Monthly Energy Consumption Report");

    doc.text(format!("Month: {}", month.label()));
    doc.gap(1.0);

    for entry in ranking {
        doc.text(format!("{}. {} - {}", entry.position, entry.name, kwh(entry.total)));
    }

    let grand_total: f64 = ranking.iter().map(|e| e.total).sum();
    doc.gap(1.0);
    doc.text(format!("Grand total: {}", kwh(grand_total)));

    doc
}

/// Side-by-side totals of one device for two months.
pub fn comparison_report(
    ctx: &ReportContext,
    device: &Device,
    month_a: &MonthToken,
    month_b: &MonthToken,
    comparison: &Comparison,
) -> ReportDocument {
    // ---
    let mut doc = ctx.document("Comparative Energy Consumption Report");

    doc.text(format!("Device: {} ({})", device.name, device.id));
    doc.gap(1.0);

    doc.text(format!("{}: {}", month_a.label(), kwh(comparison.total_a)));
    doc.text(format!("{}: {}", month_b.label(), kwh(comparison.total_b)));
    doc.gap(1.0);

    doc.text(format!(
        "Difference: {} ({})",
        kwh(comparison.difference),
        comparison.trend.phrase()
    ));
    doc.gap(1.0);

    if comparison.missing_a {
        doc.warning(format!("No data for {}", month_a.label()));
    }
    if comparison.missing_b {
        doc.warning(format!("No data for {}", month_b.label()));
    }

    doc
}

/// Write the archived copy of a report as `<stem>_<unix millis>.pdf`.
pub async fn archive(dir: &Path, stem: &str, generated_at: DateTime<Local>, bytes: &[u8]) -> AppResult<PathBuf> {
    // ---
    let path = dir.join(format!("{}_{}.pdf", stem, generated_at.timestamp_millis()));

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Report(format!("create {}: {}", dir.display(), e)))?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Report(format!("write {}: {}", path.display(), e)))?;

    tracing::info!("Archived report {}", path.display());
    Ok(path)
}
