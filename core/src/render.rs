//! Console rendering. Every function returns the text so callers decide
//! where it goes (stdout in the binary, assertions in tests).

use crate::{
    clip_results::{ClipResultRow, ClipResultTotals},
    cohort::CohortComparison,
    collection::CollectionSet,
    opportunity::{OpportunityRow, OpportunityTotals},
    reconciliation::{CheckSummary, Identity, LogicComparison, ReconciliationReport},
    statement_cohort::StatementCohortSet,
    success_rate::SuccessRateSet,
    summary::{CollectionTier, StatementSummaryRow, SummaryInsights},
    types::{MonthOffset, StatementCode},
    window::MonthWindow,
};
use std::fmt::Write;

pub const WIDE: usize = 120;

// ── Formatting helpers ─────────────────────────────────────────

/// `1234567` -> `1,234,567`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Whole-dollar amount with separators.
pub fn money(amount: f64) -> String {
    format!("${}", thousands(amount.round() as i64))
}

pub fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "N/A".into())
}

pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

pub fn banner(title: &str, width: usize) -> String {
    let bar = rule('=', width);
    format!("{bar}\n{title}\n{bar}")
}

fn verify_mark(ok: bool) -> &'static str {
    if ok {
        "PASSED"
    } else {
        "FAILED"
    }
}

// ── Success rate over time ─────────────────────────────────────

pub fn success_rate_report(set: &SuccessRateSet, focus: MonthOffset) -> String {
    let mut out = String::new();
    let focus_window = MonthWindow::new(focus);

    for code in set.codes() {
        let series = set.series(code);
        let Some(first) = series.first() else {
            continue;
        };
        let _ = writeln!(out, "\n{}", banner(&first.statement_label.to_uppercase(), WIDE));

        let total = first.total_population;
        let _ = writeln!(out, "\nTotal Population: {}", thousands(total));
        let _ = writeln!(
            out,
            "  - Approved Outright: {} ({})",
            thousands(first.approved_outright_count),
            pct(first.pct_of_population(first.approved_outright_count))
        );
        let _ = writeln!(
            out,
            "  - Had PIE: {} ({})",
            thousands(first.pie_total_count),
            pct(first.pct_of_population(first.pie_total_count))
        );
        let ok = first.approved_outright_count + first.pie_total_count == total;
        let sign = if ok { "=" } else { "!=" };
        let _ = writeln!(
            out,
            "  VERIFICATION {}: {} + {} {sign} {}",
            verify_mark(ok),
            thousands(first.approved_outright_count),
            thousands(first.pie_total_count),
            thousands(total)
        );

        let _ = writeln!(
            out,
            "\n{:<8} {:<15} {:>15} {:>15} {:>18} {:>18}",
            "Month", "Days", "Success Rate", "Approved", "PIE Collected", "Success Count"
        );
        let _ = writeln!(out, "{}", rule('-', WIDE));
        for r in &series {
            let w = r.window();
            let _ = writeln!(
                out,
                "Month {:<3} {:<15} {:>15} {:>15} {:>18} {:>18}",
                w.label(),
                w.days_range(),
                pct(r.success_rate_pct),
                thousands(r.approved_outright_count),
                thousands(r.pie_income_collected_by_month),
                thousands(r.success_count)
            );
        }

        if let Some(last) = series.last() {
            let lw = last.window();
            let _ = writeln!(out, "\n  Month {} ({} days) Results:", lw.label(), lw.days_end());
            let _ = writeln!(out, "    - Success Rate: {}", pct(last.success_rate_pct));
            let _ = writeln!(
                out,
                "    - Approved Outright: {}",
                thousands(last.approved_outright_count)
            );
            let _ = writeln!(
                out,
                "    - PIE Collected: {}",
                thousands(last.pie_income_collected_by_month)
            );
            let _ = writeln!(
                out,
                "    - Total Success: {} of {}",
                thousands(last.success_count),
                thousands(total)
            );
        }
    }

    let _ = writeln!(
        out,
        "\n{}",
        banner(&format!("MONTH {} SUMMARY - ALL STATEMENTS", focus_window.label()), WIDE)
    );
    let _ = writeln!(
        out,
        "\n{:<25} {:>15} {:>15} {:>15} {:>18} {:>15}",
        "Statement", "Population", "Approved", "PIE Total", "PIE Collected", "Success Rate"
    );
    let _ = writeln!(out, "{}", rule('-', WIDE));
    for code in set.codes() {
        let Some(r) = set.at(code, focus).or_else(|| set.final_row(code)) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:<25} {:>15} {:>15} {:>15} {:>18} {:>15}",
            r.statement_label,
            thousands(r.total_population),
            thousands(r.approved_outright_count),
            thousands(r.pie_total_count),
            thousands(r.pie_income_collected_by_month),
            pct(r.success_rate_pct)
        );
    }
    out
}

// ── Old vs fixed ───────────────────────────────────────────────

pub fn comparison_report(
    cmp: &LogicComparison,
    codes: &[StatementCode],
    overall: StatementCode,
    focus: MonthOffset,
    flag_rate_delta: f64,
    material_rate_delta: f64,
) -> String {
    let mut out = String::new();
    let focus_window = MonthWindow::new(focus);
    let _ = writeln!(
        out,
        "{}",
        banner("COMPARING OLD (BUGGY) vs FIXED PIE SUCCESS RATE ANALYSIS", WIDE)
    );
    let _ = writeln!(
        out,
        "\nOLD: 'approved outright' = approved at any statement, even with PIE at another"
    );
    let _ = writeln!(out, "FIXED: 'approved outright' = never PIE at any statement");

    let _ = writeln!(
        out,
        "\n{}",
        banner(
            &format!(
                "COMPARISON: MONTH {} RESULTS ({} days)",
                focus_window.label(),
                focus_window.days_end()
            ),
            WIDE
        )
    );
    let _ = writeln!(
        out,
        "\n{:<30} {:<25} {:>20} {:>20} {:>20}",
        "Statement", "Metric", "OLD", "FIXED", "Difference"
    );
    let _ = writeln!(out, "{}", rule('-', WIDE));

    for code in codes {
        let Some(c) = cmp.at(*code, focus) else {
            continue;
        };
        let line = |out: &mut String, name: &str, metric: &str, o: i64, f: i64, mark: &str| {
            let _ = writeln!(
                out,
                "{:<30} {:<25} {:>20} {:>20} {:>20}{mark}",
                name,
                metric,
                thousands(o),
                thousands(f),
                thousands(f - o)
            );
        };
        line(
            &mut out,
            &c.fixed.statement_label,
            "Total Population",
            c.old.total_population,
            c.fixed.total_population,
            "",
        );
        let approved_mark = if c.approved_diff() != 0 { "  <- overcount" } else { "" };
        line(
            &mut out,
            "",
            "Approved Outright",
            c.old.approved_outright_count,
            c.fixed.approved_outright_count,
            approved_mark,
        );
        line(&mut out, "", "PIE Total", c.old.pie_total_count, c.fixed.pie_total_count, "");
        line(
            &mut out,
            "",
            "PIE Collected",
            c.old.pie_income_collected_by_month,
            c.fixed.pie_income_collected_by_month,
            "",
        );
        let success_mark = if c.success_diff() != 0 { "  <- differs" } else { "" };
        line(
            &mut out,
            "",
            "Success Count",
            c.old.success_count,
            c.fixed.success_count,
            success_mark,
        );
        let rate_mark = if c.rate_diff().abs() > flag_rate_delta { "  <- differs" } else { "" };
        let _ = writeln!(
            out,
            "{:<30} {:<25} {:>20.1} {:>20.1} {:>20.1}{rate_mark}",
            "",
            "Success Rate %",
            c.old.success_rate_pct,
            c.fixed.success_rate_pct,
            c.rate_diff()
        );
        let old_sum = c.old.approved_outright_count + c.old.pie_total_count;
        let fixed_sum = c.fixed.approved_outright_count + c.fixed.pie_total_count;
        let _ = writeln!(
            out,
            "{:<30} {:<25} {:>20} {} {:>20} {}",
            "",
            "Verification (A+P=T)",
            thousands(old_sum),
            verify_mark(old_sum == c.old.total_population),
            thousands(fixed_sum),
            verify_mark(fixed_sum == c.fixed.total_population)
        );
        let _ = writeln!(out, "{}", rule('-', WIDE));
    }

    if let Some(c) = cmp.at(overall, focus) {
        let _ = writeln!(
            out,
            "\n{}",
            banner(
                &format!("DETAILED ANALYSIS: {}", c.fixed.statement_label.to_uppercase()),
                WIDE
            )
        );
        let _ = writeln!(
            out,
            "\nTotal Population: {} accounts",
            thousands(c.fixed.total_population)
        );
        let _ = writeln!(out, "\nOLD logic:");
        let _ = writeln!(
            out,
            "  - Approved Outright: {}",
            thousands(c.old.approved_outright_count)
        );
        let _ = writeln!(out, "  - PIE Total: {}", thousands(c.old.pie_total_count));
        let _ = writeln!(
            out,
            "  - Sum: {}",
            thousands(c.old.approved_outright_count + c.old.pie_total_count)
        );
        let _ = writeln!(
            out,
            "  - Overcounted 'approved outright' by: {} accounts",
            thousands(c.overcount())
        );
        let _ = writeln!(out, "\nFIXED logic:");
        let _ = writeln!(
            out,
            "  - Approved Outright (never PIE): {}",
            thousands(c.fixed.approved_outright_count)
        );
        let _ = writeln!(out, "  - PIE Total: {}", thousands(c.fixed.pie_total_count));
        let _ = writeln!(
            out,
            "  - Sum: {}",
            thousands(c.fixed.approved_outright_count + c.fixed.pie_total_count)
        );
        let _ = writeln!(
            out,
            "\n  {} accounts had PIE at one statement and APPROVED at another.",
            thousands(c.overcount())
        );

        let rate_diff = c.old.success_rate_pct - c.fixed.success_rate_pct;
        let _ = writeln!(out, "\nImpact on Success Rate:");
        let _ = writeln!(out, "  OLD:   {}", pct(c.old.success_rate_pct));
        let _ = writeln!(out, "  FIXED: {}", pct(c.fixed.success_rate_pct));
        let _ = writeln!(out, "  Difference: {rate_diff:.1} percentage points");
        if rate_diff.abs() < material_rate_delta {
            let _ = writeln!(out, "  -> No material impact on the reported success rate");
        } else {
            let _ = writeln!(out, "  -> Material difference in reported success rate");
        }

        let _ = writeln!(
            out,
            "\n{}",
            banner(
                &format!(
                    "MONTHLY PROGRESSION COMPARISON - {}",
                    c.fixed.statement_label.to_uppercase()
                ),
                WIDE
            )
        );
        let _ = writeln!(
            out,
            "\n{:<10} {:>15} {:>18} {:>15} {:>15} {:>18} {:>15}",
            "Month",
            "OLD Approved",
            "FIXED Approved",
            "Difference",
            "OLD Rate %",
            "FIXED Rate %",
            "Rate Diff"
        );
        let _ = writeln!(out, "{}", rule('-', WIDE));
        for m in cmp.series(overall) {
            let _ = writeln!(
                out,
                "Month {:<4} {:>15} {:>18} {:>15} {:>15.1} {:>18.1} {:>15.1}",
                m.fixed.window().label(),
                thousands(m.old.approved_outright_count),
                thousands(m.fixed.approved_outright_count),
                thousands(m.approved_diff()),
                m.old.success_rate_pct,
                m.fixed.success_rate_pct,
                m.rate_diff()
            );
        }
    }

    if !cmp.unmatched.is_empty() {
        let _ = writeln!(
            out,
            "\n{} (bucket, month) rows appear in only one result set",
            cmp.unmatched.len()
        );
    }
    out
}

// ── Statement summary ──────────────────────────────────────────

pub fn income_tracking_report(row: &StatementSummaryRow, window_months: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner("COMBINED SUCCESS RATE ANALYSIS", WIDE));
    let _ = writeln!(out, "\nStatement Month:           {}", row.stmt_month);
    let _ = writeln!(out, "Statement:                 {}", row.statement_label);
    let _ = writeln!(out, "\nTotal Population:");
    let _ = writeln!(
        out,
        "  All Accounts (APPROVED + PIE):              {}",
        thousands(row.total_population)
    );
    let _ = writeln!(out, "\nBreakdown by Initial Outcome:");
    let _ = writeln!(
        out,
        "  Approved Outright:                          {} ({})",
        thousands(row.approved_outright_count),
        pct(row.approved_outright_rate_pct)
    );
    let _ = writeln!(
        out,
        "  PRE_EVAL_APPROVED (PIE):                    {} ({})",
        thousands(row.pie_total_count),
        pct(row.pie_pct_of_population())
    );
    let _ = writeln!(out, "\nPIE Income Collection (within {window_months} months):");
    let _ = writeln!(
        out,
        "  Income Collected:                           {} ({} of PIE)",
        thousands(row.pie_income_collected_count),
        opt_pct(row.pie_income_collection_rate_pct)
    );
    let _ = writeln!(
        out,
        "  Income NOT Collected:                       {} ({} of PIE)",
        thousands(row.pie_income_not_collected_count),
        opt_pct(row.pie_income_miss_rate_pct)
    );

    let _ = writeln!(out, "\n{}", banner("OVERALL SUCCESS RATE", WIDE));
    let _ = writeln!(out, "\n  Success = Approved Outright OR PIE with Income Collected");
    let _ = writeln!(
        out,
        "\n  Total Success:                              {} accounts",
        thousands(row.success_count)
    );
    let _ = writeln!(
        out,
        "    - Approved Outright:                      {}",
        thousands(row.approved_outright_count)
    );
    let _ = writeln!(
        out,
        "    - PIE -> Income Collected:                {}",
        thousands(row.pie_income_collected_count)
    );
    let _ = writeln!(
        out,
        "\n  SUCCESS RATE:                               {}",
        pct(row.success_rate_pct)
    );

    let _ = writeln!(out, "\n{}", banner("INTERPRETATION", WIDE));
    let _ = writeln!(out, "\n{} of all accounts achieved success", pct(row.success_rate_pct));
    let _ = writeln!(
        out,
        "  -> {} approved immediately (no income barrier)",
        thousands(row.approved_outright_count)
    );
    let _ = writeln!(
        out,
        "  -> {} were PIE but collected income within {window_months} months",
        thousands(row.pie_income_collected_count)
    );
    let _ = writeln!(
        out,
        "\n{} PIE accounts ({}) did NOT collect income",
        thousands(row.pie_income_not_collected_count),
        opt_pct(row.pie_income_miss_rate_pct)
    );
    if let (Some(tier), Some(rate)) = (row.collection_tier(), row.pie_income_collection_rate_pct) {
        let text = match tier {
            CollectionTier::Strong => format!("Strong PIE income collection ({})", pct(rate)),
            CollectionTier::Moderate => format!(
                "Moderate PIE income collection ({})\n  -> Opportunity to improve through customer engagement",
                pct(rate)
            ),
            CollectionTier::Low => format!(
                "Low PIE income collection ({})\n  -> Significant gap in the income collection process",
                pct(rate)
            ),
        };
        let _ = writeln!(out, "\n{text}");
    }
    out
}

pub fn multi_statement_report(rows: &[StatementSummaryRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner("KEY METRICS BY STATEMENT", WIDE));
    let _ = writeln!(
        out,
        "\n{:<20} {:<12} {:<12} {:<15} {:<30}",
        "Statement", "Total Pop", "PIE Count", "Success Rate", "PIE Income Collection Rate"
    );
    let _ = writeln!(out, "{}", rule('-', WIDE));
    for r in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<12} {:<12} {:<15} {:<30}",
            r.statement_label,
            thousands(r.total_population),
            thousands(r.pie_total_count),
            pct(r.success_rate_pct),
            opt_pct(r.pie_income_collection_rate_pct)
        );
    }

    let Some(i) = SummaryInsights::from_rows(rows) else {
        let _ = writeln!(out, "\nNo results returned from query");
        return out;
    };
    let label = |code: StatementCode| {
        rows.iter()
            .find(|r| r.statement_number == code)
            .map(|r| r.statement_label.clone())
            .unwrap_or_else(|| format!("Stmt {code}"))
    };
    let _ = writeln!(out, "\n{}", banner("INSIGHTS", WIDE));
    let _ = writeln!(
        out,
        "\nSuccess Rate Range: {} - {}",
        pct(i.success_rate_range.0),
        pct(i.success_rate_range.1)
    );
    if let Some((lo, hi)) = i.collection_rate_range {
        let _ = writeln!(out, "PIE Income Collection Rate Range: {} - {}", pct(lo), pct(hi));
    }
    let _ = writeln!(
        out,
        "\nBest Overall Success: {} ({})",
        label(i.best_success.0),
        pct(i.best_success.1)
    );
    let _ = writeln!(
        out,
        "Worst Overall Success: {} ({})",
        label(i.worst_success.0),
        pct(i.worst_success.1)
    );
    if let (Some(b), Some(w)) = (i.best_collection, i.worst_collection) {
        let _ = writeln!(out, "\nBest PIE Income Collection: {} ({})", label(b.0), pct(b.1));
        let _ = writeln!(out, "Worst PIE Income Collection: {} ({})", label(w.0), pct(w.1));
    }
    out
}

// ── Account-level collection ───────────────────────────────────

pub fn account_level_report(set: &CollectionSet, codes: &[StatementCode], focus: MonthOffset) -> String {
    let mut out = String::new();
    let focus_window = MonthWindow::new(focus);
    let _ = writeln!(
        out,
        "{}",
        banner("PIE INCOME COLLECTION ANALYSIS - ACCOUNT-LEVEL DATA", WIDE)
    );
    let _ = writeln!(
        out,
        "Time windows: Month 1 = 0-30 days, Month 2 = 30-60 days, ... Month {} = {} days after PIE",
        focus_window.label(),
        focus_window.days_range()
    );

    for code in codes {
        let series = set.series(*code);
        let Some(first) = series.first() else {
            continue;
        };
        let _ = writeln!(out, "\n--- {} (Account-Level) ---", first.statement_label.to_uppercase());
        let _ = writeln!(
            out,
            "{:<8} {:<15} {:>12} {:>12} {:>18} {:>15}",
            "Month", "Days Range", "Total PIE", "Collected", "Collection Rate", "New This Month"
        );
        let _ = writeln!(out, "{}", rule('-', WIDE));
        for r in series {
            let w = r.window();
            let _ = writeln!(
                out,
                "Month {:<2} {:<15} {:>12} {:>12} {:>18} {:>15}",
                w.label(),
                w.days_range(),
                thousands(r.pie_total_count),
                thousands(r.pie_income_collected_by_month),
                pct(r.pie_income_collection_rate_pct),
                thousands(r.new_income_collections_this_month)
            );
        }
    }

    let _ = writeln!(
        out,
        "\n{}",
        banner(
            &format!(
                "QUICK REFERENCE - FINAL RESULTS (Month {}: {} Days)",
                focus_window.label(),
                focus_window.days_range()
            ),
            WIDE
        )
    );
    let _ = writeln!(
        out,
        "\n{:<35} {:>12} {:>12} {:>18}",
        "Category", "Total PIE", "Collected", "Collection Rate"
    );
    let _ = writeln!(out, "{}", rule('-', WIDE));
    for r in set.month(focus) {
        let _ = writeln!(
            out,
            "{:<35} {:>12} {:>12} {:>18}",
            r.statement_label,
            thousands(r.pie_total_count),
            thousands(r.pie_income_collected_by_month),
            pct(r.pie_income_collection_rate_pct)
        );
    }
    out
}

// ── Cohort comparison ──────────────────────────────────────────

pub fn cohort_comparison_report(cc: &CohortComparison, code: StatementCode, label: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        banner(&format!("SUCCESS RATE BY COHORT - {}", label.to_uppercase()), WIDE)
    );
    let names = cc.names();
    let mut header = format!("\n{:<10}", "Month");
    for n in &names {
        let _ = write!(header, " {n:>12}");
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", rule('-', 10 + 13 * names.len()));
    for (month, rates) in cc.pivot(code) {
        let mut line = format!("Month {month:<4}");
        for r in rates {
            let _ = write!(line, " {:>12}", opt_pct(r));
        }
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "\nFinal success rate:");
    for (name, rate) in cc.final_rates(code) {
        let _ = writeln!(out, "  {name:<10} {}", opt_pct(rate));
    }
    out
}

// ── Income opportunity ─────────────────────────────────────────

pub fn opportunity_report(rows: &[OpportunityRow], min_statement: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        banner(
            &format!("CLIP INCOME OPPORTUNITY ANALYSIS (Statement {min_statement}+)"),
            100
        )
    );
    let _ = writeln!(
        out,
        "\n{:<9} {:>8} {:>9} {:>9} {:>9} {:>14} {:>14} {:>9}",
        "Month", "Evals", "Approved", "Blocked", "Declined", "Actual", "Opportunity", "Blocked%"
    );
    let _ = writeln!(out, "{}", rule('-', 100));
    for r in rows {
        let _ = writeln!(
            out,
            "{:<9} {:>8} {:>9} {:>9} {:>9} {:>14} {:>14} {:>9}",
            r.clip_month,
            thousands(r.total_evaluations),
            thousands(r.approved_count),
            thousands(r.blocked_by_income_count),
            thousands(r.declined_other_count),
            money(r.actual_exposure),
            money(r.opportunity_exposure),
            pct(r.pct_blocked_by_income)
        );
    }

    let t = OpportunityTotals::from_rows(rows);
    let _ = writeln!(out, "\n{}", banner("SUMMARY STATISTICS", 100));
    let _ = writeln!(
        out,
        "Total Actual CLIP Exposure (Approved):          {}",
        money(t.actual_exposure)
    );
    let _ = writeln!(
        out,
        "Total Opportunity Exposure (Blocked by Income): {}",
        money(t.opportunity_exposure)
    );
    let _ = writeln!(
        out,
        "Opportunity as % of Actual:                     {}",
        pct(t.opportunity_pct_of_actual())
    );
    let _ = writeln!(
        out,
        "\nTotal Accounts Approved:                        {}",
        thousands(t.approved)
    );
    let _ = writeln!(
        out,
        "Total Accounts Blocked by Income:               {}",
        thousands(t.blocked)
    );
    let _ = writeln!(
        out,
        "Blocked as % of Approved:                       {}",
        pct(t.blocked_pct_of_approved())
    );
    out
}

// ── CLIP results ───────────────────────────────────────────────

pub fn clip_results_report(rows: &[ClipResultRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner("CLIP RESULTS BY MONTH (Approved)", 90));
    let _ = writeln!(
        out,
        "\n{:<9} {:>14} {:>9} {:>12} {:>12} {:>9}",
        "Month", "Exposure", "CLIPs", "Avg CLIP", "Avg PCL", "Avg FICO"
    );
    let _ = writeln!(out, "{}", rule('-', 90));
    for r in rows {
        let _ = writeln!(
            out,
            "{:<9} {:>14} {:>9} {:>12} {:>12} {:>9}",
            r.clip_month,
            money(r.exposure),
            thousands(r.num_clip),
            money(r.avg_clip_amt),
            money(r.avg_pcl),
            r.avg_fico.map(|f| format!("{f:.1}")).unwrap_or_else(|| "N/A".into())
        );
    }

    let t = ClipResultTotals::from_rows(rows);
    let avg_money = |v: Option<f64>| v.map(money).unwrap_or_else(|| "N/A".into());
    let _ = writeln!(out, "\n{}", banner("SUMMARY STATISTICS", 90));
    let _ = writeln!(out, "Total Exposure: {}", money(t.exposure));
    let _ = writeln!(out, "Total CLIPs:    {}", thousands(t.clips));
    let _ = writeln!(out, "Avg CLIP Amt:   {}", avg_money(t.avg_clip_amt));
    let _ = writeln!(out, "Avg PCL:        {}", avg_money(t.avg_pcl));
    let _ = writeln!(
        out,
        "Avg FICO:       {}",
        t.avg_fico.map(|f| format!("{f:.1}")).unwrap_or_else(|| "N/A".into())
    );
    out
}

// ── Collection by statement cohort ─────────────────────────────

pub fn statement_cohort_report(set: &StatementCohortSet, cohort_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        banner(
            &format!("PIE COLLECTION RATE BY STATEMENT COHORT ({cohort_name})"),
            WIDE
        )
    );
    let _ = writeln!(
        out,
        "\n{:<18} {:>7} {:>10} {:>10} {:>10} {:>10} {:>8} {:>9}",
        "Cohort", "Months", "Total Pop", "PIE", "Approved", "Collected", "PIE %", "Overall"
    );
    let _ = writeln!(out, "{}", rule('-', WIDE));
    for r in &set.rows {
        let _ = writeln!(
            out,
            "{:<18} {:>7} {:>10} {:>10} {:>10} {:>10} {:>8} {:>9}",
            r.statement_cohort,
            r.months_since_pie,
            thousands(r.total_pop),
            thousands(r.pre_eval_approved),
            thousands(r.approved_initial),
            thousands(r.running_approval_count),
            opt_pct(r.pie_collection_rate_pct),
            pct(r.collection_rate_pct)
        );
    }

    let _ = writeln!(out, "\n{}", banner("SUMMARY BY COHORT (End of Window)", WIDE));
    let _ = writeln!(
        out,
        "{:<18} {:>10} {:>18} {:>18} {:>14} {:>16} {:>20}",
        "Cohort",
        "Total Pop",
        "PRE_EVAL_APPROVED",
        "Initially Approved",
        "PIE Collected",
        "PIE Collection %",
        "Overall Collection %"
    );
    for s in set.summaries() {
        let _ = writeln!(
            out,
            "{:<18} {:>10} {:>18} {:>18} {:>14} {:>16} {:>20}",
            s.statement_cohort,
            thousands(s.total_pop),
            thousands(s.pre_eval_approved),
            thousands(s.approved_initial),
            thousands(s.pie_collected),
            opt_pct(s.pie_collection_rate_pct),
            pct(s.collection_rate_pct)
        );
    }
    out
}

// ── Reconciliation check ───────────────────────────────────────

fn reconciliation_lines(out: &mut String, report: &ReconciliationReport, expected: &[Identity]) {
    let _ = writeln!(
        out,
        "\n[{}] {} rows checked, {} violations",
        report.categorization.name(),
        report.rows_checked,
        report.violations.len()
    );
    for v in &report.violations {
        let note = if expected.contains(&v.identity) { " (expected)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<20} month {:<2} {:<40} {} vs {}{note}",
            v.statement_label,
            v.month_offset + 1,
            v.identity.describe(),
            thousands(v.computed),
            thousands(v.reported)
        );
    }
}

pub fn check_report(summary: &CheckSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner("RECONCILIATION CHECK", WIDE));
    reconciliation_lines(&mut out, &summary.fixed, &[]);
    reconciliation_lines(&mut out, &summary.old, &[Identity::Partition]);

    let inconsistent = summary.comparison.inconsistent();
    let _ = writeln!(
        out,
        "\nOld-vs-fixed approved overcount: {} rows compared, {} inconsistent, {} unmatched",
        summary.comparison.rows.len(),
        inconsistent.len(),
        summary.comparison.unmatched.len()
    );
    for c in inconsistent {
        let _ = writeln!(
            out,
            "  {:<20} month {:<2} overcount {} but old partition gap {}",
            c.fixed.statement_label,
            c.month_offset() + 1,
            thousands(c.overcount()),
            thousands(c.old_partition_gap())
        );
    }
    let _ = writeln!(out, "\nRESULT: {}", verify_mark(summary.passed()));
    out
}
