//! Approved credit line increases by evaluation month.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipResultRow {
    pub clip_month: String,
    pub exposure: f64,
    pub num_clip: i64,
    pub avg_clip_amt: f64,
    pub avg_pcl: f64,
    /// `None` when no approval that month carried a score.
    pub avg_fico: Option<f64>,
}

impl ClipResultRow {
    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    clip_month: r.text("CLIP_MONTH")?,
                    exposure: r.f64("EXPOSURE")?,
                    num_clip: r.i64("NUM_CLIP")?,
                    avg_clip_amt: r.f64("AVG_CLIP_AMT")?,
                    avg_pcl: r.f64("AVG_PCL")?,
                    avg_fico: r.opt_f64("AVG_FICO")?,
                })
            })
            .collect()
    }
}

pub fn load_clip_results(
    store: &WarehouseStore,
    catalog: &QueryCatalog,
    params: &QueryParams,
) -> ReportResult<(ResultTable, Vec<ClipResultRow>)> {
    let sql = catalog.sql(QueryKind::ClipResults)?;
    log::info!(
        "running CLIP results query from {} ({} months)",
        params.cohort,
        params.lookback_months
    );
    let table = store.run_query(&sql, params)?;
    let rows = ClipResultRow::from_table(&table)?;
    Ok((table, rows))
}

/// Whole-range figures. Averages are the mean of the monthly averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClipResultTotals {
    pub exposure: f64,
    pub clips: i64,
    pub avg_clip_amt: Option<f64>,
    pub avg_pcl: Option<f64>,
    pub avg_fico: Option<f64>,
}

impl ClipResultTotals {
    pub fn from_rows(rows: &[ClipResultRow]) -> Self {
        Self {
            exposure: rows.iter().map(|r| r.exposure).sum(),
            clips: rows.iter().map(|r| r.num_clip).sum(),
            avg_clip_amt: mean(rows.iter().map(|r| r.avg_clip_amt)),
            avg_pcl: mean(rows.iter().map(|r| r.avg_pcl)),
            avg_fico: mean(rows.iter().filter_map(|r| r.avg_fico)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
