//! Success rate over time: one row per (statement bucket, month offset).
//!
//! Success = Approved Outright OR PIE with income collected by the end
//! of the month. Two categorization rules exist for "approved outright";
//! both are kept and selectable, see `Categorization`.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
    types::{MonthOffset, StatementCode},
    window::MonthWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Categorization {
    /// Approved outright = ever approved at any statement in the bucket.
    /// Accounts with both outcomes fall in both categories.
    Old,
    /// Approved outright = never PIE at any statement in the bucket.
    Fixed,
}

impl Categorization {
    pub fn query(&self) -> QueryKind {
        match self {
            Self::Old => QueryKind::SuccessRateOld,
            Self::Fixed => QueryKind::SuccessRateFixed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::Fixed => "fixed",
        }
    }
}

impl std::str::FromStr for Categorization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "old" => Ok(Self::Old),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("unknown categorization '{other}' (expected old|fixed)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRateRow {
    pub statement_number: StatementCode,
    pub statement_label: String,
    pub month_offset: MonthOffset,
    pub total_population: i64,
    pub approved_outright_count: i64,
    pub pie_total_count: i64,
    pub pie_income_collected_by_month: i64,
    pub success_count: i64,
    pub success_rate_pct: f64,
}

impl SuccessRateRow {
    pub fn window(&self) -> MonthWindow {
        MonthWindow::new(self.month_offset)
    }

    pub fn pct_of_population(&self, count: i64) -> f64 {
        if self.total_population == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total_population as f64
        }
    }

    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    statement_number: r.i64("STATEMENT_NUMBER")?,
                    statement_label: r.text("STATEMENT_LABEL")?,
                    month_offset: r.i64("MONTH_OFFSET")?,
                    total_population: r.i64("TOTAL_POPULATION")?,
                    approved_outright_count: r.i64("APPROVED_OUTRIGHT_COUNT")?,
                    pie_total_count: r.i64("PIE_TOTAL_COUNT")?,
                    pie_income_collected_by_month: r.i64("PIE_INCOME_COLLECTED_BY_MONTH")?,
                    success_count: r.i64("SUCCESS_COUNT")?,
                    success_rate_pct: r.f64("SUCCESS_RATE_PCT")?,
                })
            })
            .collect()
    }
}

/// Every row of one query run, indexed by bucket.
#[derive(Debug, Clone)]
pub struct SuccessRateSet {
    pub categorization: Categorization,
    pub table: ResultTable,
    pub rows: Vec<SuccessRateRow>,
}

impl SuccessRateSet {
    pub fn load(
        store: &WarehouseStore,
        catalog: &QueryCatalog,
        params: &QueryParams,
        categorization: Categorization,
    ) -> ReportResult<Self> {
        let sql = catalog.sql(categorization.query())?;
        log::info!(
            "running {} success-rate query for cohort {}",
            categorization.name(),
            params.cohort
        );
        let table = store.run_query(&sql, params)?;
        let rows = SuccessRateRow::from_table(&table)?;
        log::info!("loaded {} rows", rows.len());
        Ok(Self::from_rows(categorization, table, rows))
    }

    pub fn from_rows(
        categorization: Categorization,
        table: ResultTable,
        rows: Vec<SuccessRateRow>,
    ) -> Self {
        Self {
            categorization,
            table,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for one bucket, ordered by month offset.
    pub fn series(&self, code: StatementCode) -> Vec<&SuccessRateRow> {
        let mut rows: Vec<&SuccessRateRow> =
            self.rows.iter().filter(|r| r.statement_number == code).collect();
        rows.sort_by_key(|r| r.month_offset);
        rows
    }

    pub fn at(&self, code: StatementCode, month_offset: MonthOffset) -> Option<&SuccessRateRow> {
        self.rows
            .iter()
            .find(|r| r.statement_number == code && r.month_offset == month_offset)
    }

    /// Last month of a bucket's series.
    pub fn final_row(&self, code: StatementCode) -> Option<&SuccessRateRow> {
        self.series(code).into_iter().last()
    }

    /// Bucket codes in the order the query returned them.
    pub fn codes(&self) -> Vec<StatementCode> {
        let mut codes = Vec::new();
        for r in &self.rows {
            if !codes.contains(&r.statement_number) {
                codes.push(r.statement_number);
            }
        }
        codes
    }

    /// Month label -> (bucket code -> success rate). Source of the wide
    /// chart table.
    pub fn pivot_success_rate(&self) -> BTreeMap<i64, BTreeMap<StatementCode, f64>> {
        let mut pivot: BTreeMap<i64, BTreeMap<StatementCode, f64>> = BTreeMap::new();
        for r in &self.rows {
            pivot
                .entry(r.window().label())
                .or_default()
                .insert(r.statement_number, r.success_rate_pct);
        }
        pivot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: i64, offset: i64, rate: f64) -> SuccessRateRow {
        SuccessRateRow {
            statement_number: code,
            statement_label: format!("Stmt {code}"),
            month_offset: offset,
            total_population: 100,
            approved_outright_count: 80,
            pie_total_count: 20,
            pie_income_collected_by_month: 5,
            success_count: 85,
            success_rate_pct: rate,
        }
    }

    #[test]
    fn series_is_sorted_and_final_row_is_last_month() {
        let set = SuccessRateSet::from_rows(
            Categorization::Fixed,
            ResultTable::default(),
            vec![row(18, 1, 86.0), row(26, 0, 70.0), row(18, 0, 85.0)],
        );
        let s: Vec<i64> = set.series(18).iter().map(|r| r.month_offset).collect();
        assert_eq!(s, vec![0, 1]);
        assert_eq!(set.final_row(18).unwrap().success_rate_pct, 86.0);
        assert_eq!(set.codes(), vec![18, 26]);
        assert!(set.at(26, 1).is_none());
    }

    #[test]
    fn pivot_uses_one_based_month_labels() {
        let set = SuccessRateSet::from_rows(
            Categorization::Fixed,
            ResultTable::default(),
            vec![row(18, 0, 85.0), row(26, 0, 70.0)],
        );
        let pivot = set.pivot_success_rate();
        assert_eq!(pivot[&1][&26], 70.0);
        assert!(!pivot.contains_key(&0));
    }

    #[test]
    fn categorization_parses_case_insensitively() {
        assert_eq!("FIXED".parse::<Categorization>().unwrap(), Categorization::Fixed);
        assert!("new".parse::<Categorization>().is_err());
    }
}
