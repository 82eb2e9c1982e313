//! SQL catalog: the report queries and the parameters they bind.
//!
//! Every query ships built in. A configured `sql_dir` replaces the
//! built-in text file by file, so an analyst can edit a query without
//! rebuilding; a missing override file is an error, never a silent
//! fallback.

use crate::{
    config::ReportConfig,
    error::{ReportError, ReportResult},
    window::CohortMonth,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Success rate per (bucket, month), approved outright = ever approved.
    SuccessRateOld,
    /// Success rate per (bucket, month), approved outright = never PIE.
    SuccessRateFixed,
    /// Whole-window summary per bucket.
    StatementSummary,
    /// PIE-only income collection per (bucket, month).
    AccountLevelCollection,
    /// Monthly blocked-by-income opportunity.
    IncomeOpportunity,
    /// Monthly approved CLIP exposure and averages.
    ClipResults,
    /// Fixed-logic collection per bucket by months since PIE.
    CollectionByCohort,
}

impl QueryKind {
    pub const ALL: [QueryKind; 7] = [
        QueryKind::SuccessRateOld,
        QueryKind::SuccessRateFixed,
        QueryKind::StatementSummary,
        QueryKind::AccountLevelCollection,
        QueryKind::IncomeOpportunity,
        QueryKind::ClipResults,
        QueryKind::CollectionByCohort,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::SuccessRateOld => "pie_success_rate_over_time.sql",
            Self::SuccessRateFixed => "pie_success_rate_over_time_fixed.sql",
            Self::StatementSummary => "pie_statement_summary.sql",
            Self::AccountLevelCollection => "pie_income_collection_account_level.sql",
            Self::IncomeOpportunity => "income_opportunity.sql",
            Self::ClipResults => "clip_results.sql",
            Self::CollectionByCohort => "pie_collection_by_cohort.sql",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            Self::SuccessRateOld => include_str!("../../sql/pie_success_rate_over_time.sql"),
            Self::SuccessRateFixed => include_str!("../../sql/pie_success_rate_over_time_fixed.sql"),
            Self::StatementSummary => include_str!("../../sql/pie_statement_summary.sql"),
            Self::AccountLevelCollection => {
                include_str!("../../sql/pie_income_collection_account_level.sql")
            }
            Self::IncomeOpportunity => include_str!("../../sql/income_opportunity.sql"),
            Self::ClipResults => include_str!("../../sql/clip_results.sql"),
            Self::CollectionByCohort => include_str!("../../sql/pie_collection_by_cohort.sql"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    sql_dir: Option<PathBuf>,
}

impl QueryCatalog {
    pub fn builtin() -> Self {
        Self { sql_dir: None }
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            sql_dir: Some(dir.into()),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        match &config.sql_dir {
            Some(dir) => Self::with_dir(dir),
            None => Self::builtin(),
        }
    }

    pub fn sql(&self, kind: QueryKind) -> ReportResult<String> {
        let Some(dir) = &self.sql_dir else {
            return Ok(kind.builtin().to_string());
        };
        let path = dir.join(kind.file_name());
        if !path.is_file() {
            return Err(ReportError::MissingQuery {
                path: path.display().to_string(),
            });
        }
        log::debug!("reading query override {}", path.display());
        Ok(std::fs::read_to_string(&path)?)
    }
}

/// Named parameters available to every query. A query binds only the
/// ones it mentions.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub cohort: CohortMonth,
    pub window_months: i64,
    pub min_statement: i64,
    /// Months of evaluations covered by the opportunity report, from
    /// the cohort month onward.
    pub lookback_months: i64,
}

impl QueryParams {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            cohort: config.cohort,
            window_months: config.window_months,
            min_statement: config.min_statement,
            lookback_months: config.lookback_months,
        }
    }

    /// Same parameters, another cohort month.
    pub fn for_cohort(&self, cohort: CohortMonth) -> Self {
        Self {
            cohort,
            ..self.clone()
        }
    }

    pub(crate) fn bindings(&self) -> Vec<(&'static str, rusqlite::types::Value)> {
        use rusqlite::types::Value;
        let mut range_end = self.cohort;
        for _ in 0..self.lookback_months {
            range_end = range_end.next();
        }
        vec![
            (":cohort_start", Value::Text(self.cohort.start())),
            (":cohort_end", Value::Text(self.cohort.end())),
            (":range_end", Value::Text(range_end.start())),
            (":window_months", Value::Integer(self.window_months)),
            (":seconds_per_month", Value::Integer(crate::types::SECONDS_PER_MONTH)),
            (":min_statement", Value::Integer(self.min_statement)),
        ]
    }
}
