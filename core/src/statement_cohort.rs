//! PIE collection by statement cohort and months since the first PIE.
//!
//! Fixed categorization throughout: an account that was ever PIE in the
//! bucket counts toward `pre_eval_approved`, never `approved_initial`.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
    types::StatementCode,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementCohortRow {
    pub statement_cohort: String,
    pub statement_number: StatementCode,
    /// One-based: 1 covers days 0-30.
    pub months_since_pie: i64,
    pub total_pop: i64,
    pub pre_eval_approved: i64,
    pub approved_initial: i64,
    /// PIE accounts with income collected by this month.
    pub running_approval_count: i64,
    pub pie_collection_rate_pct: Option<f64>,
    pub collection_rate_pct: f64,
}

impl StatementCohortRow {
    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    statement_cohort: r.text("STATEMENT_COHORT")?,
                    statement_number: r.i64("STATEMENT_NUMBER")?,
                    months_since_pie: r.i64("MONTHS_SINCE_PIE")?,
                    total_pop: r.i64("TOTAL_POP")?,
                    pre_eval_approved: r.i64("PRE_EVAL_APPROVED")?,
                    approved_initial: r.i64("APPROVED_INITIAL")?,
                    running_approval_count: r.i64("RUNNING_APPROVAL_COUNT")?,
                    pie_collection_rate_pct: r.opt_f64("PIE_COLLECTION_RATE_PCT")?,
                    collection_rate_pct: r.f64("COLLECTION_RATE_PCT")?,
                })
            })
            .collect()
    }
}

/// End-of-window figures for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementCohortSummary {
    pub statement_cohort: String,
    pub statement_number: StatementCode,
    pub total_pop: i64,
    pub pre_eval_approved: i64,
    pub approved_initial: i64,
    pub pie_collected: i64,
    pub pie_collection_rate_pct: Option<f64>,
    pub collection_rate_pct: f64,
}

#[derive(Debug, Clone)]
pub struct StatementCohortSet {
    pub table: ResultTable,
    pub rows: Vec<StatementCohortRow>,
}

impl StatementCohortSet {
    pub fn load(
        store: &WarehouseStore,
        catalog: &QueryCatalog,
        params: &QueryParams,
    ) -> ReportResult<Self> {
        let sql = catalog.sql(QueryKind::CollectionByCohort)?;
        log::info!("running collection-by-cohort query for {}", params.cohort);
        let table = store.run_query(&sql, params)?;
        let rows = StatementCohortRow::from_table(&table)?;
        Ok(Self { table, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cohort codes in query order.
    pub fn codes(&self) -> Vec<StatementCode> {
        let mut codes: Vec<StatementCode> = Vec::new();
        for r in &self.rows {
            if !codes.contains(&r.statement_number) {
                codes.push(r.statement_number);
            }
        }
        codes
    }

    pub fn series(&self, code: StatementCode) -> Vec<&StatementCohortRow> {
        self.rows.iter().filter(|r| r.statement_number == code).collect()
    }

    /// One line per cohort: population from the first month, collection
    /// at its peak (cumulative counts never fall, so that is the last month).
    pub fn summaries(&self) -> Vec<StatementCohortSummary> {
        self.codes()
            .into_iter()
            .filter_map(|code| {
                let series = self.series(code);
                let first = series.first()?;
                Some(StatementCohortSummary {
                    statement_cohort: first.statement_cohort.clone(),
                    statement_number: code,
                    total_pop: first.total_pop,
                    pre_eval_approved: first.pre_eval_approved,
                    approved_initial: first.approved_initial,
                    pie_collected: series.iter().map(|r| r.running_approval_count).max()?,
                    pie_collection_rate_pct: series
                        .iter()
                        .filter_map(|r| r.pie_collection_rate_pct)
                        .reduce(f64::max),
                    collection_rate_pct: series
                        .iter()
                        .map(|r| r.collection_rate_pct)
                        .fold(f64::MIN, f64::max),
                })
            })
            .collect()
    }
}
