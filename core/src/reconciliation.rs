//! Reconciliation checks over success-rate rows.
//!
//! Identities asserted on every (bucket, month) row:
//!   - Partition: approved_outright + pie_total == total_population
//!   - Success:   success_count == approved_outright + pie_collected
//!
//! And across a bucket's months:
//!   - pie_collected never decreases month over month
//!   - total_population is the same for every month
//!
//! Under the old categorization the partition identity fails for every
//! account that was approved at one statement and PIE at another. The
//! size of that failure must equal the old-minus-fixed approved count;
//! `compare` checks that.

use crate::{
    success_rate::{Categorization, SuccessRateRow, SuccessRateSet},
    types::{MonthOffset, StatementCode},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Partition,
    Success,
    CollectionMonotone,
    PopulationStable,
}

impl Identity {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Partition => "approved + pie_total = population",
            Self::Success => "success = approved + pie_collected",
            Self::CollectionMonotone => "pie_collected non-decreasing by month",
            Self::PopulationStable => "population constant across months",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub statement_number: StatementCode,
    pub statement_label: String,
    pub month_offset: MonthOffset,
    pub identity: Identity,
    /// Left-hand side as computed from the row.
    pub computed: i64,
    /// Right-hand side reported by the row.
    pub reported: i64,
}

impl Violation {
    pub fn delta(&self) -> i64 {
        self.computed - self.reported
    }
}

/// Row-level identities for one row.
pub fn check_row(row: &SuccessRateRow) -> Vec<Violation> {
    let mut out = Vec::new();
    let partition = row.approved_outright_count + row.pie_total_count;
    if partition != row.total_population {
        out.push(violation(row, Identity::Partition, partition, row.total_population));
    }
    let success = row.approved_outright_count + row.pie_income_collected_by_month;
    if success != row.success_count {
        out.push(violation(row, Identity::Success, success, row.success_count));
    }
    out
}

/// Cross-month identities for one bucket's series (any order).
pub fn check_series(rows: &[&SuccessRateRow]) -> Vec<Violation> {
    let mut sorted: Vec<&SuccessRateRow> = rows.to_vec();
    sorted.sort_by_key(|r| r.month_offset);

    let mut out = Vec::new();
    for pair in sorted.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if cur.pie_income_collected_by_month < prev.pie_income_collected_by_month {
            out.push(violation(
                cur,
                Identity::CollectionMonotone,
                cur.pie_income_collected_by_month,
                prev.pie_income_collected_by_month,
            ));
        }
        if cur.total_population != prev.total_population {
            out.push(violation(
                cur,
                Identity::PopulationStable,
                cur.total_population,
                prev.total_population,
            ));
        }
    }
    out
}

fn violation(row: &SuccessRateRow, identity: Identity, computed: i64, reported: i64) -> Violation {
    Violation {
        statement_number: row.statement_number,
        statement_label: row.statement_label.clone(),
        month_offset: row.month_offset,
        identity,
        computed,
        reported,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub categorization: Categorization,
    pub rows_checked: usize,
    pub violations: Vec<Violation>,
}

impl ReconciliationReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn of(&self, identity: Identity) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.identity == identity).collect()
    }
}

/// Run every identity over a result set.
pub fn reconcile(set: &SuccessRateSet) -> ReconciliationReport {
    let mut violations: Vec<Violation> = set.rows.iter().flat_map(check_row).collect();
    for code in set.codes() {
        violations.extend(check_series(&set.series(code)));
    }
    for v in &violations {
        log::warn!(
            "[{}] {} month {}: {} violated ({} vs {})",
            set.categorization.name(),
            v.statement_label,
            v.month_offset + 1,
            v.identity.describe(),
            v.computed,
            v.reported
        );
    }
    ReconciliationReport {
        categorization: set.categorization,
        rows_checked: set.rows.len(),
        violations,
    }
}

// ── Old vs fixed ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub old: SuccessRateRow,
    pub fixed: SuccessRateRow,
}

impl ComparisonRow {
    pub fn statement_number(&self) -> StatementCode {
        self.fixed.statement_number
    }

    pub fn month_offset(&self) -> MonthOffset {
        self.fixed.month_offset
    }

    pub fn population_diff(&self) -> i64 {
        self.fixed.total_population - self.old.total_population
    }

    pub fn approved_diff(&self) -> i64 {
        self.fixed.approved_outright_count - self.old.approved_outright_count
    }

    /// Accounts the old rule counted as approved outright despite a PIE.
    pub fn overcount(&self) -> i64 {
        self.old.approved_outright_count - self.fixed.approved_outright_count
    }

    pub fn success_diff(&self) -> i64 {
        self.fixed.success_count - self.old.success_count
    }

    pub fn rate_diff(&self) -> f64 {
        self.fixed.success_rate_pct - self.old.success_rate_pct
    }

    /// How far the old row misses `approved + pie_total = population`.
    pub fn old_partition_gap(&self) -> i64 {
        self.old.approved_outright_count + self.old.pie_total_count - self.old.total_population
    }

    /// The old rule only ever adds accounts to "approved outright", and
    /// exactly the ones it double counts.
    pub fn overcount_consistent(&self) -> bool {
        self.overcount() >= 0 && self.old_partition_gap() == self.overcount()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogicComparison {
    pub rows: Vec<ComparisonRow>,
    /// (bucket, month) present in only one of the two result sets.
    pub unmatched: Vec<(StatementCode, MonthOffset)>,
}

impl LogicComparison {
    pub fn at(&self, code: StatementCode, month_offset: MonthOffset) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|r| r.statement_number() == code && r.month_offset() == month_offset)
    }

    pub fn series(&self, code: StatementCode) -> Vec<&ComparisonRow> {
        let mut rows: Vec<&ComparisonRow> =
            self.rows.iter().filter(|r| r.statement_number() == code).collect();
        rows.sort_by_key(|r| r.month_offset());
        rows
    }

    pub fn inconsistent(&self) -> Vec<&ComparisonRow> {
        self.rows.iter().filter(|r| !r.overcount_consistent()).collect()
    }
}

/// Pair old and fixed rows by (bucket, month).
pub fn compare(old: &SuccessRateSet, fixed: &SuccessRateSet) -> LogicComparison {
    let mut old_by_key: BTreeMap<(StatementCode, MonthOffset), &SuccessRateRow> = old
        .rows
        .iter()
        .map(|r| ((r.statement_number, r.month_offset), r))
        .collect();

    let mut out = LogicComparison::default();
    for f in &fixed.rows {
        match old_by_key.remove(&(f.statement_number, f.month_offset)) {
            Some(o) => out.rows.push(ComparisonRow {
                old: o.clone(),
                fixed: f.clone(),
            }),
            None => out.unmatched.push((f.statement_number, f.month_offset)),
        }
    }
    out.unmatched.extend(old_by_key.into_keys());
    out.unmatched.sort();
    out
}

/// Outcome of running both categorizations through every check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub fixed: ReconciliationReport,
    pub old: ReconciliationReport,
    pub comparison: LogicComparison,
}

impl CheckSummary {
    pub fn build(old: &SuccessRateSet, fixed: &SuccessRateSet) -> Self {
        Self {
            fixed: reconcile(fixed),
            old: reconcile(old),
            comparison: compare(old, fixed),
        }
    }

    /// Old-rule violations other than the expected partition gap.
    pub fn unexpected_old_violations(&self) -> Vec<&Violation> {
        self.old
            .violations
            .iter()
            .filter(|v| v.identity != Identity::Partition)
            .collect()
    }

    pub fn passed(&self) -> bool {
        self.fixed.passed()
            && self.unexpected_old_violations().is_empty()
            && self.comparison.inconsistent().is_empty()
            && self.comparison.unmatched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ResultTable;

    fn row(code: i64, offset: i64, t: i64, a: i64, p: i64, c: i64) -> SuccessRateRow {
        SuccessRateRow {
            statement_number: code,
            statement_label: format!("Stmt {code}"),
            month_offset: offset,
            total_population: t,
            approved_outright_count: a,
            pie_total_count: p,
            pie_income_collected_by_month: c,
            success_count: a + c,
            success_rate_pct: 100.0 * (a + c) as f64 / t as f64,
        }
    }

    #[test]
    fn consistent_row_has_no_violations() {
        assert!(check_row(&row(18, 0, 100, 70, 30, 10)).is_empty());
    }

    #[test]
    fn double_counted_row_breaks_partition_only() {
        let v = check_row(&row(999, 0, 100, 75, 30, 10));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].identity, Identity::Partition);
        assert_eq!(v[0].delta(), 5);
    }

    #[test]
    fn wrong_success_count_is_flagged() {
        let mut r = row(18, 0, 100, 70, 30, 10);
        r.success_count = 79;
        let v = check_row(&r);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].identity, Identity::Success);
    }

    #[test]
    fn series_checks_catch_shrinking_collections() {
        let a = row(18, 0, 100, 70, 30, 12);
        let b = row(18, 1, 100, 70, 30, 11);
        let v = check_series(&[&b, &a]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].identity, Identity::CollectionMonotone);
        assert_eq!(v[0].month_offset, 1);
    }

    #[test]
    fn comparison_overcount_matches_old_partition_gap() {
        let old = SuccessRateSet::from_rows(
            Categorization::Old,
            ResultTable::default(),
            vec![row(999, 0, 100, 75, 30, 8)],
        );
        let fixed = SuccessRateSet::from_rows(
            Categorization::Fixed,
            ResultTable::default(),
            vec![row(999, 0, 100, 70, 30, 13)],
        );
        let summary = CheckSummary::build(&old, &fixed);
        let cmp = summary.comparison.at(999, 0).unwrap();
        assert_eq!(cmp.overcount(), 5);
        assert_eq!(cmp.old_partition_gap(), 5);
        assert!(cmp.overcount_consistent());
        assert_eq!(summary.old.of(Identity::Partition).len(), 1);
        assert!(summary.passed());
    }

    #[test]
    fn unmatched_rows_fail_the_check() {
        let old = SuccessRateSet::from_rows(Categorization::Old, ResultTable::default(), vec![]);
        let fixed = SuccessRateSet::from_rows(
            Categorization::Fixed,
            ResultTable::default(),
            vec![row(18, 0, 10, 7, 3, 1)],
        );
        let summary = CheckSummary::build(&old, &fixed);
        assert_eq!(summary.comparison.unmatched, vec![(18, 0)]);
        assert!(!summary.passed());
    }
}
