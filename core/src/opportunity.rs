//! Credit line increase opportunity blocked by the income requirement.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryKind, QueryParams},
    store::WarehouseStore,
    table::ResultTable,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityRow {
    pub clip_month: String,
    pub total_evaluations: i64,
    pub approved_count: i64,
    pub blocked_by_income_count: i64,
    pub declined_other_count: i64,
    pub actual_exposure: f64,
    pub opportunity_exposure: f64,
    pub pct_blocked_by_income: f64,
    pub avg_opportunity_clip: Option<f64>,
    pub avg_pcl_blocked: Option<f64>,
    pub avg_fico_blocked: Option<f64>,
}

impl OpportunityRow {
    pub fn from_table(table: &ResultTable) -> ReportResult<Vec<Self>> {
        table
            .iter()
            .map(|r| {
                Ok(Self {
                    clip_month: r.text("CLIP_MONTH")?,
                    total_evaluations: r.i64("TOTAL_EVALUATIONS")?,
                    approved_count: r.i64("APPROVED_COUNT")?,
                    blocked_by_income_count: r.i64("BLOCKED_BY_INCOME_COUNT")?,
                    declined_other_count: r.i64("DECLINED_OTHER_COUNT")?,
                    actual_exposure: r.f64("ACTUAL_EXPOSURE")?,
                    opportunity_exposure: r.f64("OPPORTUNITY_EXPOSURE")?,
                    pct_blocked_by_income: r.f64("PCT_BLOCKED_BY_INCOME")?,
                    avg_opportunity_clip: r.opt_f64("AVG_OPPORTUNITY_CLIP")?,
                    avg_pcl_blocked: r.opt_f64("AVG_PCL_BLOCKED")?,
                    avg_fico_blocked: r.opt_f64("AVG_FICO_BLOCKED")?,
                })
            })
            .collect()
    }
}

pub fn load_opportunity(
    store: &WarehouseStore,
    catalog: &QueryCatalog,
    params: &QueryParams,
) -> ReportResult<(ResultTable, Vec<OpportunityRow>)> {
    let sql = catalog.sql(QueryKind::IncomeOpportunity)?;
    log::info!(
        "running income opportunity query from {} ({} months)",
        params.cohort,
        params.lookback_months
    );
    let table = store.run_query(&sql, params)?;
    let rows = OpportunityRow::from_table(&table)?;
    Ok((table, rows))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpportunityTotals {
    pub actual_exposure: f64,
    pub opportunity_exposure: f64,
    pub approved: i64,
    pub blocked: i64,
}

impl OpportunityTotals {
    pub fn from_rows(rows: &[OpportunityRow]) -> Self {
        rows.iter().fold(Self::default(), |mut t, r| {
            t.actual_exposure += r.actual_exposure;
            t.opportunity_exposure += r.opportunity_exposure;
            t.approved += r.approved_count;
            t.blocked += r.blocked_by_income_count;
            t
        })
    }

    /// Opportunity exposure as a percentage of actual; 0 when nothing was approved.
    pub fn opportunity_pct_of_actual(&self) -> f64 {
        if self.actual_exposure > 0.0 {
            100.0 * self.opportunity_exposure / self.actual_exposure
        } else {
            0.0
        }
    }

    pub fn blocked_pct_of_approved(&self) -> f64 {
        if self.approved > 0 {
            100.0 * self.blocked as f64 / self.approved as f64
        } else {
            0.0
        }
    }
}
