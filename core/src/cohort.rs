//! Multi-cohort comparison: the same success-rate query run for several
//! evaluation months, lined up by month after evaluation.

use crate::{
    error::ReportResult,
    query::{QueryCatalog, QueryParams},
    store::WarehouseStore,
    success_rate::{Categorization, SuccessRateSet},
    types::StatementCode,
    window::CohortMonth,
};
use std::collections::BTreeMap;

pub struct CohortComparison {
    pub cohorts: Vec<(CohortMonth, SuccessRateSet)>,
}

impl CohortComparison {
    pub fn load(
        store: &WarehouseStore,
        catalog: &QueryCatalog,
        base: &QueryParams,
        cohorts: &[CohortMonth],
        categorization: Categorization,
    ) -> ReportResult<Self> {
        let mut loaded = Vec::with_capacity(cohorts.len());
        for cohort in cohorts {
            log::info!("loading cohort {}", cohort.display_name());
            let set = SuccessRateSet::load(store, catalog, &base.for_cohort(*cohort), categorization)?;
            if set.is_empty() {
                log::warn!("cohort {} returned no rows", cohort.display_name());
            }
            loaded.push((*cohort, set));
        }
        Ok(Self { cohorts: loaded })
    }

    pub fn names(&self) -> Vec<String> {
        self.cohorts.iter().map(|(c, _)| c.display_name()).collect()
    }

    /// Month label -> success rate per cohort (cohort order), for one bucket.
    /// A cohort with no row for that month yields `None`.
    pub fn pivot(&self, code: StatementCode) -> BTreeMap<i64, Vec<Option<f64>>> {
        let mut labels: Vec<i64> = self
            .cohorts
            .iter()
            .flat_map(|(_, set)| set.series(code).into_iter().map(|r| r.window().label()))
            .collect();
        labels.sort_unstable();
        labels.dedup();

        labels
            .into_iter()
            .map(|label| {
                let rates = self
                    .cohorts
                    .iter()
                    .map(|(_, set)| set.at(code, label - 1).map(|r| r.success_rate_pct))
                    .collect();
                (label, rates)
            })
            .collect()
    }

    /// Final-month success rate of one bucket per cohort.
    pub fn final_rates(&self, code: StatementCode) -> Vec<(String, Option<f64>)> {
        self.cohorts
            .iter()
            .map(|(c, set)| (c.display_name(), set.final_row(code).map(|r| r.success_rate_pct)))
            .collect()
    }
}
