//! Statement summary, account-level collection, income opportunity, CLIP
//! results, collection by statement cohort and cohort comparison over the
//! hand-built warehouse in `common`.

mod common;

use common::{approx, fixture};
use pie_core::{
    clip_results::{load_clip_results, ClipResultTotals},
    cohort::CohortComparison,
    collection::CollectionSet,
    opportunity::{load_opportunity, OpportunityTotals},
    render,
    statement_cohort::StatementCohortSet,
    success_rate::{Categorization, SuccessRateSet},
    summary::{load_summary, CollectionTier, SummaryInsights},
    types::{OVERALL_18_PLUS, STMT_42_PLUS},
    window::CohortMonth,
};

// ── Statement summary ──────────────────────────────────────────

#[test]
fn summary_counts_whole_window_per_bucket() {
    let f = fixture();
    let (table, rows) = load_summary(&f.store, &f.catalog, &f.params).unwrap();
    assert_eq!(table.len(), 4);
    let codes: Vec<i64> = rows.iter().map(|r| r.statement_number).collect();
    assert_eq!(codes, vec![18, 26, STMT_42_PLUS, OVERALL_18_PLUS]);

    let s18 = &rows[0];
    assert_eq!(s18.stmt_month, "2025-04");
    assert_eq!(s18.statement_label, "Stmt 18");
    assert_eq!(
        (s18.total_population, s18.approved_outright_count, s18.pie_total_count),
        (6, 2, 4)
    );
    assert_eq!(s18.pie_income_collected_count, 2);
    assert_eq!(s18.pie_income_not_collected_count, 2);
    approx(s18.approved_outright_rate_pct, 33.33);
    approx(s18.pie_income_collection_rate_pct.unwrap(), 50.0);
    approx(s18.pie_income_miss_rate_pct.unwrap(), 50.0);
    assert_eq!(s18.success_count, 4);
    approx(s18.success_rate_pct, 66.67);
    assert_eq!(s18.collection_tier(), Some(CollectionTier::Moderate));

    let overall = &rows[3];
    assert_eq!(overall.total_population, 11);
    assert_eq!(
        overall.approved_outright_count + overall.pie_total_count,
        overall.total_population
    );
    assert_eq!(overall.pie_income_collected_count, 4);
    approx(overall.success_rate_pct, 72.73);
}

#[test]
fn summary_matches_final_month_of_success_rate() {
    let f = fixture();
    let (_, rows) = load_summary(&f.store, &f.catalog, &f.params).unwrap();
    let set = SuccessRateSet::load(&f.store, &f.catalog, &f.params, Categorization::Fixed).unwrap();
    for r in &rows {
        let last = set.final_row(r.statement_number).unwrap();
        assert_eq!(r.success_count, last.success_count);
        assert_eq!(r.pie_income_collected_count, last.pie_income_collected_by_month);
    }
}

#[test]
fn insights_pick_best_and_worst_statements() {
    let f = fixture();
    let (_, rows) = load_summary(&f.store, &f.catalog, &f.params).unwrap();
    let i = SummaryInsights::from_rows(&rows).unwrap();
    assert_eq!(i.best_success.0, 26);
    assert_eq!(i.worst_success.0, 18);
    assert_eq!(i.best_collection.unwrap().0, 26);
    assert_eq!(i.worst_collection.unwrap().0, 18);

    let text = render::multi_statement_report(&rows);
    assert!(text.contains("Best Overall Success: Stmt 26 (100.0%)"));
}

#[test]
fn income_tracking_text_carries_tier_and_counts() {
    let f = fixture();
    let (_, rows) = load_summary(&f.store, &f.catalog, &f.params).unwrap();
    let text = render::income_tracking_report(&rows[0], f.config.window_months);
    assert!(text.contains("Moderate PIE income collection (50.0%)"));
    assert!(text.contains("SUCCESS RATE:"));
    assert!(text.contains("66.7%"));
}

// ── Account-level collection ───────────────────────────────────

#[test]
fn account_level_counts_each_pie_account_once() {
    let f = fixture();
    let set = CollectionSet::load(&f.store, &f.catalog, &f.params).unwrap();

    let overall = set.series(OVERALL_18_PLUS);
    assert_eq!(overall.len(), 8);
    assert!(overall.iter().all(|r| r.pie_total_count == 7));
    let collected: Vec<i64> = overall.iter().map(|r| r.pie_income_collected_by_month).collect();
    assert_eq!(collected, vec![2, 4, 4, 4, 4, 4, 4, 4]);
    let new: Vec<i64> = overall
        .iter()
        .map(|r| r.new_income_collections_this_month)
        .collect();
    assert_eq!(new, vec![2, 2, 0, 0, 0, 0, 0, 0]);
    approx(overall[1].pie_income_collection_rate_pct, 57.14);

    let stmt42 = set.series(STMT_42_PLUS);
    assert_eq!(stmt42[0].pie_total_count, 2);
    assert_eq!(stmt42[0].pie_income_collected_by_month, 0);
    assert_eq!(stmt42[1].new_income_collections_this_month, 1);

    for code in [18, 26, STMT_42_PLUS, OVERALL_18_PLUS] {
        assert!(set.new_collections_reconcile(code), "bucket {code}");
    }
}

#[test]
fn account_level_report_lists_final_month() {
    let f = fixture();
    let set = CollectionSet::load(&f.store, &f.catalog, &f.params).unwrap();
    let text = render::account_level_report(
        &set,
        &[STMT_42_PLUS, OVERALL_18_PLUS],
        f.config.focus_month_offset(),
    );
    assert!(text.contains("--- STMT 42+ (Account-Level) ---"));
    assert!(text.contains("QUICK REFERENCE - FINAL RESULTS (Month 8: 210-240 Days)"));
}

// ── Income opportunity ─────────────────────────────────────────

#[test]
fn opportunity_groups_by_evaluation_month() {
    let f = fixture();
    let (_, rows) = load_opportunity(&f.store, &f.catalog, &f.params).unwrap();
    let months: Vec<&str> = rows.iter().map(|r| r.clip_month.as_str()).collect();
    assert_eq!(months, vec!["2025-04", "2025-05"]);

    let april = &rows[0];
    assert_eq!(april.total_evaluations, 15);
    assert_eq!(april.approved_count, 6);
    // Seven PIE plus one PRE_EVAL_DECLINED.
    assert_eq!(april.blocked_by_income_count, 8);
    assert_eq!(april.declined_other_count, 1);
    approx(april.actual_exposure, 3_000.0);
    approx(april.opportunity_exposure, 7_000.0);
    approx(april.pct_blocked_by_income, 53.33);
    approx(april.avg_opportunity_clip.unwrap(), 875.0);
    approx(april.avg_fico_blocked.unwrap(), 700.0);

    let may = &rows[1];
    assert_eq!(may.total_evaluations, 1);
    assert!(may.avg_opportunity_clip.is_none());

    let totals = OpportunityTotals::from_rows(&rows);
    approx(totals.actual_exposure, 3_500.0);
    assert_eq!(totals.approved, 7);
    assert_eq!(totals.blocked, 8);
}

#[test]
fn opportunity_respects_minimum_statement() {
    let f = fixture();
    let mut params = f.params.clone();
    params.min_statement = 42;
    let (_, rows) = load_opportunity(&f.store, &f.catalog, &params).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_evaluations, 6);
}

// ── CLIP results ───────────────────────────────────────────────

#[test]
fn clip_results_cover_approvals_at_every_statement() {
    let f = fixture();
    let (table, rows) = load_clip_results(&f.store, &f.catalog, &f.params).unwrap();
    assert_eq!(table.columns[0], "CLIP_MONTH");
    let months: Vec<&str> = rows.iter().map(|r| r.clip_month.as_str()).collect();
    assert_eq!(months, vec!["2025-04", "2025-05"]);

    // Six approvals at 18+ plus E1 at statement 10.
    let april = &rows[0];
    assert_eq!(april.num_clip, 7);
    approx(april.exposure, 3_500.0);
    approx(april.avg_clip_amt, 500.0);
    approx(april.avg_pcl, 5_000.0);
    approx(april.avg_fico.unwrap(), 700.0);
    assert_eq!(rows[1].num_clip, 1);

    let totals = ClipResultTotals::from_rows(&rows);
    assert_eq!(totals.clips, 8);
    approx(totals.exposure, 4_000.0);

    let text = render::clip_results_report(&rows);
    assert!(text.contains("Total Exposure: $4,000"));
    assert!(text.contains("Total CLIPs:    8"));
}

#[test]
fn clip_results_follow_lookback_months() {
    let f = fixture();
    let mut params = f.params.clone();
    params.lookback_months = 1;
    let (_, rows) = load_clip_results(&f.store, &f.catalog, &params).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].clip_month, "2025-04");
}

// ── Collection by statement cohort ─────────────────────────────

#[test]
fn statement_cohorts_track_running_collection() {
    let f = fixture();
    let set = StatementCohortSet::load(&f.store, &f.catalog, &f.params).unwrap();
    assert_eq!(set.codes(), vec![18, 26, STMT_42_PLUS, OVERALL_18_PLUS]);

    let s18 = set.series(18);
    assert_eq!(s18.len(), 8);
    assert_eq!(s18[0].statement_cohort, "Stmt 18");
    assert_eq!(s18[0].months_since_pie, 1);
    assert_eq!(
        (s18[0].total_pop, s18[0].pre_eval_approved, s18[0].approved_initial),
        (6, 4, 2)
    );
    assert_eq!(s18[0].running_approval_count, 1);
    approx(s18[0].pie_collection_rate_pct.unwrap(), 25.0);
    approx(s18[0].collection_rate_pct, 50.0);
    assert_eq!(s18[1].running_approval_count, 2);
    approx(s18[1].collection_rate_pct, 66.67);

    let s42 = set.series(STMT_42_PLUS);
    approx(s42[0].pie_collection_rate_pct.unwrap(), 0.0);
    approx(s42[0].collection_rate_pct, 33.33);
    approx(s42[1].pie_collection_rate_pct.unwrap(), 50.0);

    for r in &set.rows {
        assert_eq!(r.approved_initial + r.pre_eval_approved, r.total_pop);
    }
}

#[test]
fn statement_cohort_summary_takes_end_of_window() {
    let f = fixture();
    let set = StatementCohortSet::load(&f.store, &f.catalog, &f.params).unwrap();
    let summaries = set.summaries();
    assert_eq!(summaries.len(), 4);

    let overall = summaries
        .iter()
        .find(|s| s.statement_number == OVERALL_18_PLUS)
        .unwrap();
    assert_eq!(overall.statement_cohort, "Overall Stmt 18+");
    assert_eq!(
        (overall.total_pop, overall.pre_eval_approved, overall.approved_initial),
        (11, 7, 4)
    );
    assert_eq!(overall.pie_collected, 4);
    approx(overall.pie_collection_rate_pct.unwrap(), 57.14);
    approx(overall.collection_rate_pct, 72.73);

    let text = render::statement_cohort_report(&set, &f.config.cohort.display_name());
    assert!(text.contains("PIE COLLECTION RATE BY STATEMENT COHORT (Apr 2025)"));
    assert!(text.contains("SUMMARY BY COHORT (End of Window)"));
}

#[test]
fn overall_collection_rate_matches_fixed_success_rate() {
    let f = fixture();
    let set = StatementCohortSet::load(&f.store, &f.catalog, &f.params).unwrap();
    let fixed = SuccessRateSet::load(&f.store, &f.catalog, &f.params, Categorization::Fixed).unwrap();
    for r in &set.rows {
        let s = fixed.at(r.statement_number, r.months_since_pie - 1).unwrap();
        assert_eq!(r.running_approval_count, s.pie_income_collected_by_month);
        approx(r.collection_rate_pct, s.success_rate_pct);
    }
}

// ── Cohort comparison ──────────────────────────────────────────

#[test]
fn cohorts_line_up_by_month() {
    let f = fixture();
    let cohorts = vec![
        CohortMonth::parse("2025-04").unwrap(),
        CohortMonth::parse("2025-05").unwrap(),
        CohortMonth::parse("2025-06").unwrap(),
    ];
    let cc = CohortComparison::load(
        &f.store,
        &f.catalog,
        &f.params,
        &cohorts,
        Categorization::Fixed,
    )
    .unwrap();
    assert_eq!(cc.names(), vec!["Apr 2025", "May 2025", "Jun 2025"]);

    let pivot = cc.pivot(OVERALL_18_PLUS);
    assert_eq!(pivot.len(), 8);
    let m1 = &pivot[&1];
    approx(m1[0].unwrap(), 54.55);
    approx(m1[1].unwrap(), 100.0);
    assert!(m1[2].is_none());

    let finals = cc.final_rates(OVERALL_18_PLUS);
    approx(finals[0].1.unwrap(), 72.73);
    assert_eq!(finals[2].1, None);
}
