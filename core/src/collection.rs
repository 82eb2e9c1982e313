//! PIE-only income collection by month, each account counted once per bucket.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
    types::{MonthOffset, StatementCode},
    window::MonthWindow,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionRow {
    pub statement_number: StatementCode,
    pub statement_label: String,
    pub month_offset: MonthOffset,
    pub pie_total_count: i64,
    pub pie_income_collected_by_month: i64,
    pub pie_income_collection_rate_pct: f64,
    pub new_income_collections_this_month: i64,
}

impl CollectionRow {
    pub fn window(&self) -> MonthWindow {
        MonthWindow::new(self.month_offset)
    }

    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    statement_number: r.i64("STATEMENT_NUMBER")?,
                    statement_label: r.text("STATEMENT_LABEL")?,
                    month_offset: r.i64("MONTH_OFFSET")?,
                    pie_total_count: r.i64("PIE_TOTAL_COUNT")?,
                    pie_income_collected_by_month: r.i64("PIE_INCOME_COLLECTED_BY_MONTH")?,
                    pie_income_collection_rate_pct: r.f64("PIE_INCOME_COLLECTION_RATE_PCT")?,
                    new_income_collections_this_month: r
                        .i64("NEW_INCOME_COLLECTIONS_THIS_MONTH")?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CollectionSet {
    pub table: ResultTable,
    pub rows: Vec<CollectionRow>,
}

impl CollectionSet {
    pub fn load(
        store: &WarehouseStore,
        catalog: &QueryCatalog,
        params: &QueryParams,
    ) -> ReportResult<Self> {
        let sql = catalog.sql(QueryKind::AccountLevelCollection)?;
        log::info!("running account-level collection query for cohort {}", params.cohort);
        let table = store.run_query(&sql, params)?;
        let rows = CollectionRow::from_table(&table)?;
        Ok(Self { table, rows })
    }

    pub fn series(&self, code: StatementCode) -> Vec<&CollectionRow> {
        let mut rows: Vec<&CollectionRow> =
            self.rows.iter().filter(|r| r.statement_number == code).collect();
        rows.sort_by_key(|r| r.month_offset);
        rows
    }

    /// Rows for one month across all buckets, in query order.
    pub fn month(&self, month_offset: MonthOffset) -> Vec<&CollectionRow> {
        self.rows.iter().filter(|r| r.month_offset == month_offset).collect()
    }

    /// New collections summed over the window equal the final cumulative count.
    pub fn new_collections_reconcile(&self, code: StatementCode) -> bool {
        let series = self.series(code);
        let Some(last) = series.last() else {
            return true;
        };
        let summed: i64 = series.iter().map(|r| r.new_income_collections_this_month).sum();
        summed == last.pie_income_collected_by_month
    }
}
