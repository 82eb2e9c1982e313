//! Whole-window summary per statement bucket, plus the derived insights
//! shown by the income-tracking and multi-statement reports.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
    types::StatementCode,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSummaryRow {
    pub stmt_month: String,
    pub statement_number: StatementCode,
    pub statement_label: String,
    pub total_population: i64,
    pub approved_outright_count: i64,
    pub approved_outright_rate_pct: f64,
    pub pie_total_count: i64,
    pub pie_income_collected_count: i64,
    pub pie_income_not_collected_count: i64,
    /// `None` when the bucket had no PIE accounts.
    pub pie_income_collection_rate_pct: Option<f64>,
    pub pie_income_miss_rate_pct: Option<f64>,
    pub success_count: i64,
    pub success_rate_pct: f64,
}

impl StatementSummaryRow {
    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    stmt_month: r.text("STMT_MONTH")?,
                    statement_number: r.i64("STATEMENT_NUMBER")?,
                    statement_label: r.text("STATEMENT_LABEL")?,
                    total_population: r.i64("TOTAL_POPULATION")?,
                    approved_outright_count: r.i64("APPROVED_OUTRIGHT_COUNT")?,
                    approved_outright_rate_pct: r.f64("APPROVED_OUTRIGHT_RATE_PCT")?,
                    pie_total_count: r.i64("PIE_TOTAL_COUNT")?,
                    pie_income_collected_count: r.i64("PIE_INCOME_COLLECTED_COUNT")?,
                    pie_income_not_collected_count: r.i64("PIE_INCOME_NOT_COLLECTED_COUNT")?,
                    pie_income_collection_rate_pct: r.opt_f64("PIE_INCOME_COLLECTION_RATE_PCT")?,
                    pie_income_miss_rate_pct: r.opt_f64("PIE_INCOME_MISS_RATE_PCT")?,
                    success_count: r.i64("SUCCESS_COUNT")?,
                    success_rate_pct: r.f64("SUCCESS_RATE_PCT")?,
                })
            })
            .collect()
    }

    pub fn pie_pct_of_population(&self) -> f64 {
        if self.total_population == 0 {
            0.0
        } else {
            100.0 * self.pie_total_count as f64 / self.total_population as f64
        }
    }

    pub fn collection_tier(&self) -> Option<CollectionTier> {
        self.pie_income_collection_rate_pct.map(CollectionTier::classify)
    }
}

pub fn load_summary(
    store: &WarehouseStore,
    catalog: &QueryCatalog,
    params: &QueryParams,
) -> ReportResult<(ResultTable, Vec<StatementSummaryRow>)> {
    let sql = catalog.sql(QueryKind::StatementSummary)?;
    log::info!("running statement summary for cohort {}", params.cohort);
    let table = store.run_query(&sql, params)?;
    let rows = StatementSummaryRow::from_table(&table)?;
    Ok((table, rows))
}

/// Interpretation of a PIE income collection rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionTier {
    Strong,
    Moderate,
    Low,
}

impl CollectionTier {
    pub fn classify(rate_pct: f64) -> Self {
        if rate_pct >= 80.0 {
            Self::Strong
        } else if rate_pct >= 50.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Ranges and extremes across statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryInsights {
    pub success_rate_range: (f64, f64),
    pub collection_rate_range: Option<(f64, f64)>,
    pub best_success: (StatementCode, f64),
    pub worst_success: (StatementCode, f64),
    pub best_collection: Option<(StatementCode, f64)>,
    pub worst_collection: Option<(StatementCode, f64)>,
}

impl SummaryInsights {
    /// `None` for an empty summary. Ties keep the first statement.
    pub fn from_rows(rows: &[StatementSummaryRow]) -> Option<Self> {
        let first = rows.first()?;
        let mut best = (first.statement_number, first.success_rate_pct);
        let mut worst = best;
        for r in rows {
            if r.success_rate_pct > best.1 {
                best = (r.statement_number, r.success_rate_pct);
            }
            if r.success_rate_pct < worst.1 {
                worst = (r.statement_number, r.success_rate_pct);
            }
        }

        let mut best_collection: Option<(StatementCode, f64)> = None;
        let mut worst_collection: Option<(StatementCode, f64)> = None;
        for r in rows {
            let Some(rate) = r.pie_income_collection_rate_pct else {
                continue;
            };
            if best_collection.map_or(true, |(_, b)| rate > b) {
                best_collection = Some((r.statement_number, rate));
            }
            if worst_collection.map_or(true, |(_, w)| rate < w) {
                worst_collection = Some((r.statement_number, rate));
            }
        }

        Some(Self {
            success_rate_range: (worst.1, best.1),
            collection_rate_range: worst_collection.zip(best_collection).map(|(w, b)| (w.1, b.1)),
            best_success: best,
            worst_success: worst,
            best_collection,
            worst_collection,
        })
    }
}
