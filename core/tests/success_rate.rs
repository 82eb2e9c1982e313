//! Success rate over time, replayed against the hand-built warehouse in
//! `common`. Every expected number below is counted by hand from the
//! fixture table in `common/mod.rs`.

mod common;

use common::{approx, eval, fixture, income};
use pie_core::{
    config::ReportConfig,
    query::{QueryCatalog, QueryParams},
    reconciliation::{compare, reconcile, CheckSummary, Identity},
    store::WarehouseStore,
    success_rate::{Categorization, SuccessRateSet},
    types::{OVERALL_18_PLUS, STMT_42_PLUS},
};

fn load(logic: Categorization) -> SuccessRateSet {
    let f = fixture();
    SuccessRateSet::load(&f.store, &f.catalog, &f.params, logic).expect("query")
}

// ── Shape ──────────────────────────────────────────────────────

#[test]
fn one_row_per_bucket_and_month_in_config_order() {
    let set = load(Categorization::Fixed);
    // Stmt 34 has no population so it returns no rows.
    assert_eq!(set.codes(), vec![18, 26, STMT_42_PLUS, OVERALL_18_PLUS]);
    assert_eq!(set.rows.len(), 4 * 8);
    for code in set.codes() {
        let offsets: Vec<i64> = set.series(code).iter().map(|r| r.month_offset).collect();
        assert_eq!(offsets, (0..8).collect::<Vec<_>>());
    }
}

#[test]
fn statement_18_collects_by_day_window() {
    let set = load(Categorization::Fixed);
    let m1 = set.at(18, 0).unwrap();
    assert_eq!(m1.total_population, 6);
    assert_eq!(m1.approved_outright_count, 2);
    assert_eq!(m1.pie_total_count, 4);
    // A3 at day 18. A6's only income predates the PIE.
    assert_eq!(m1.pie_income_collected_by_month, 1);
    assert_eq!(m1.success_count, 3);
    approx(m1.success_rate_pct, 50.0);

    // A4 lands at day 52.
    let m2 = set.at(18, 1).unwrap();
    assert_eq!(m2.pie_income_collected_by_month, 2);
    approx(m2.success_rate_pct, 66.67);
    assert_eq!(set.final_row(18).unwrap().pie_income_collected_by_month, 2);
}

#[test]
fn same_day_income_counts_in_month_one() {
    let set = load(Categorization::Fixed);
    let r = set.at(26, 0).unwrap();
    assert_eq!(r.pie_income_collected_by_month, 1);
    approx(r.success_rate_pct, 100.0);
}

#[test]
fn statements_below_18_and_other_cohorts_are_excluded() {
    let set = load(Categorization::Fixed);
    let overall = set.at(OVERALL_18_PLUS, 0).unwrap();
    assert_eq!(overall.total_population, 11);
}

// ── Fixed vs old categorization ────────────────────────────────

#[test]
fn fixed_logic_counts_mixed_accounts_as_pie() {
    let set = load(Categorization::Fixed);
    let m1 = set.at(STMT_42_PLUS, 0).unwrap();
    assert_eq!(m1.total_population, 3);
    assert_eq!(m1.approved_outright_count, 1);
    assert_eq!(m1.pie_total_count, 2);
    assert_eq!(m1.pie_income_collected_by_month, 0);
    let m2 = set.at(STMT_42_PLUS, 1).unwrap();
    // C1 collects on day 36.
    assert_eq!(m2.pie_income_collected_by_month, 1);
    assert_eq!(m2.success_count, 2);
}

#[test]
fn old_logic_double_counts_mixed_accounts() {
    let set = load(Categorization::Old);
    let r = set.at(STMT_42_PLUS, 1).unwrap();
    assert_eq!(r.total_population, 3);
    assert_eq!(r.approved_outright_count, 3);
    assert_eq!(r.pie_total_count, 2);
    // C1 collected income but was also approved, so old logic drops it.
    assert_eq!(r.pie_income_collected_by_month, 0);
    assert_eq!(r.success_count, 3);

    let overall = set.at(OVERALL_18_PLUS, 1).unwrap();
    assert_eq!(overall.approved_outright_count, 6);
    assert_eq!(overall.pie_income_collected_by_month, 3);
}

#[test]
fn single_statement_buckets_agree_under_both_logics() {
    let old = load(Categorization::Old);
    let fixed = load(Categorization::Fixed);
    for code in [18, 26] {
        for (o, f) in old.series(code).iter().zip(fixed.series(code)) {
            assert_eq!(*o, f);
        }
    }
}

// ── Reconciliation identities ──────────────────────────────────

#[test]
fn fixed_logic_satisfies_every_identity() {
    let report = reconcile(&load(Categorization::Fixed));
    assert_eq!(report.rows_checked, 32);
    assert!(report.passed(), "{:?}", report.violations);
}

#[test]
fn old_logic_breaks_only_the_partition_of_mixed_buckets() {
    let report = reconcile(&load(Categorization::Old));
    assert!(report.of(Identity::Success).is_empty());
    assert!(report.of(Identity::CollectionMonotone).is_empty());
    assert!(report.of(Identity::PopulationStable).is_empty());

    let partition = report.of(Identity::Partition);
    // Every month of Stmt 42+ and Overall, each off by the two mixed accounts.
    assert_eq!(partition.len(), 16);
    assert!(partition
        .iter()
        .all(|v| matches!(v.statement_number, STMT_42_PLUS | OVERALL_18_PLUS)));
    assert!(partition.iter().all(|v| v.delta() == 2));
}

#[test]
fn overcount_is_never_negative_and_matches_the_partition_gap() {
    let old = load(Categorization::Old);
    let fixed = load(Categorization::Fixed);
    let cmp = compare(&old, &fixed);
    assert!(cmp.unmatched.is_empty());
    assert_eq!(cmp.rows.len(), 32);
    for row in &cmp.rows {
        assert!(row.overcount() >= 0);
        assert_eq!(row.overcount(), row.old_partition_gap());
        assert_eq!(row.population_diff(), 0);
    }
    assert_eq!(cmp.at(OVERALL_18_PLUS, 7).unwrap().overcount(), 2);
    assert_eq!(cmp.at(18, 7).unwrap().overcount(), 0);
}

#[test]
fn check_summary_passes_on_consistent_warehouse() {
    let summary = CheckSummary::build(&load(Categorization::Old), &load(Categorization::Fixed));
    assert!(summary.unexpected_old_violations().is_empty());
    assert!(summary.passed());
}

#[test]
fn empty_cohort_returns_no_rows() {
    let f = fixture();
    let params = f
        .params
        .for_cohort(pie_core::window::CohortMonth::parse("2024-01").unwrap());
    let set = SuccessRateSet::load(&f.store, &f.catalog, &params, Categorization::Fixed).unwrap();
    assert!(set.is_empty());
    assert!(reconcile(&set).passed());
}

// ── Rendered reports ───────────────────────────────────────────

#[test]
fn comparison_report_explains_the_overcount() {
    let cmp = compare(&load(Categorization::Old), &load(Categorization::Fixed));
    let text = pie_core::render::comparison_report(
        &cmp,
        &[18, 26, 34, STMT_42_PLUS, OVERALL_18_PLUS],
        OVERALL_18_PLUS,
        7,
        0.05,
        0.1,
    );
    assert!(text.contains("COMPARISON: MONTH 8 RESULTS (240 days)"));
    assert!(text.contains("Overcounted 'approved outright' by: 2 accounts"));
    assert!(text.contains("Material difference in reported success rate"));
}

#[test]
fn success_rate_report_verifies_each_bucket() {
    let text = pie_core::render::success_rate_report(&load(Categorization::Fixed), 7);
    assert_eq!(text.matches("VERIFICATION PASSED").count(), 4);
    assert!(text.contains("MONTH 8 SUMMARY - ALL STATEMENTS"));

    let old = pie_core::render::success_rate_report(&load(Categorization::Old), 7);
    assert_eq!(old.matches("VERIFICATION FAILED").count(), 2);
}

#[test]
fn check_report_marks_expected_old_violations() {
    let summary = CheckSummary::build(&load(Categorization::Old), &load(Categorization::Fixed));
    let text = pie_core::render::check_report(&summary);
    assert!(text.contains("(expected)"));
    assert!(text.ends_with("RESULT: PASSED\n"));
}

// ── Window edges ───────────────────────────────────────────────

#[test]
fn month_boundary_is_inclusive_to_the_second() {
    let config = ReportConfig::default();
    let store = WarehouseStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.install_buckets(&config.buckets).unwrap();
    store
        .insert_evaluations(&[
            eval("w1", "W1", 18, "2025-04-10 09:17:23", "PRE_EVAL_APPROVED", 1_000.0),
            eval("w2", "W2", 18, "2025-04-11 13:45:07", "PRE_EVAL_APPROVED", 1_000.0),
            eval("w3", "W3", 18, "2025-04-30 23:59:59", "APPROVED", 500.0),
            // First instant of May belongs to the next cohort.
            eval("w4", "W4", 18, "2025-05-01 00:00:00", "APPROVED", 500.0),
        ])
        .unwrap();
    store
        .insert_income_updates(&[
            // Exactly 30 days after the PIE.
            income("v1", "W1", "2025-05-10 09:17:23"),
            // 30 days and one second.
            income("v2", "W2", "2025-05-11 13:45:08"),
        ])
        .unwrap();

    let params = QueryParams::from_config(&config);
    let set = SuccessRateSet::load(&store, &QueryCatalog::builtin(), &params, Categorization::Fixed)
        .unwrap();
    let m1 = set.at(18, 0).unwrap();
    assert_eq!(m1.total_population, 3);
    assert_eq!(m1.approved_outright_count, 1);
    assert_eq!(m1.pie_income_collected_by_month, 1);
    let m2 = set.at(18, 1).unwrap();
    assert_eq!(m2.pie_income_collected_by_month, 2);

    let may = params.for_cohort(config.cohort.next());
    let set = SuccessRateSet::load(&store, &QueryCatalog::builtin(), &may, Categorization::Fixed)
        .unwrap();
    assert_eq!(set.at(18, 0).unwrap().total_population, 1);
}
