//! Synthetic warehouse generator for demos and tests.
//!
//! RULE: Same seed and parameters, same rows. All draws go through
//! `RngBank` streams; nothing reads the clock.
//!
//! Each account gets one evaluation in its cohort month at statement 18,
//! 26, 34 or 42+. A share of approved/PIE accounts is re-evaluated at the
//! next statement in the same month with the opposite outcome, which
//! gives the account-level buckets their mixed APPROVED/PIE accounts.
//! Single-statement buckets never see those re-evaluations.

use crate::{
    error::ReportResult,
    outcome::Outcome,
    rng::{RngBank, SynthRng, SynthSlot},
    store::{EvaluationRecord, IncomeUpdateRecord, WarehouseStore},
    types::TIMESTAMP_FORMAT,
    window::CohortMonth,
};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub seed: u64,
    pub accounts_per_cohort: usize,
    pub cohorts: Vec<CohortMonth>,
    /// Share of evaluations that are DECLINED / PRE_EVAL_DECLINED and so
    /// sit outside the success-rate population.
    pub declined_rate: f64,
    /// Share of the population whose first outcome is PIE.
    pub pie_rate: f64,
    /// Share of the population re-evaluated with the opposite outcome.
    pub mixed_rate: f64,
    /// Share of PIE accounts that eventually update income.
    pub income_rate: f64,
    /// Latest income update, in days after the PIE.
    pub max_income_days: i64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            seed: 42,
            accounts_per_cohort: 2_000,
            cohorts: vec![
                CohortMonth::literal(2025, 3),
                CohortMonth::literal(2025, 4),
                CohortMonth::literal(2025, 5),
            ],
            declined_rate: 0.2,
            pie_rate: 0.12,
            mixed_rate: 0.04,
            income_rate: 0.55,
            max_income_days: 300,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynthData {
    pub evaluations: Vec<EvaluationRecord>,
    pub income_updates: Vec<IncomeUpdateRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub evaluations: usize,
    pub income_updates: usize,
    pub mixed_accounts: usize,
}

struct Streams {
    account: SynthRng,
    outcome: SynthRng,
    timing: SynthRng,
    income: SynthRng,
    exposure: SynthRng,
}

impl Streams {
    fn new(seed: u64) -> Self {
        let bank = RngBank::new(seed);
        Self {
            account: bank.stream(SynthSlot::Account),
            outcome: bank.stream(SynthSlot::Outcome),
            timing: bank.stream(SynthSlot::Timing),
            income: bank.stream(SynthSlot::Income),
            exposure: bank.stream(SynthSlot::Exposure),
        }
    }
}

/// Generate rows without touching a store.
pub fn generate(params: &SynthParams) -> (SynthData, SeedSummary) {
    let mut rngs = Streams::new(params.seed);
    let mut data = SynthData::default();
    let mut mixed_accounts = 0;

    for cohort in &params.cohorts {
        let month_start = cohort.first_day().and_time(NaiveTime::MIN);
        let days_in_month = (cohort.next().first_day() - cohort.first_day()).num_days();
        let tag = cohort.first_day().format("%Y%m").to_string();

        for n in 0..params.accounts_per_cohort {
            let account_id = format!("ACCT-{tag}-{n:06}");
            let statement = pick_statement(&mut rngs.account);

            // Leave room in the month for a re-evaluation.
            let day = rngs.timing.between(0, (days_in_month - 3).max(0));
            let evaluated_at = month_start
                + Duration::days(day)
                + Duration::seconds(rngs.timing.between(0, 86_399));

            let outcome = if rngs.outcome.chance(params.declined_rate) {
                if rngs.outcome.chance(0.3) {
                    Outcome::PreEvalDeclined
                } else {
                    Outcome::Declined
                }
            } else if rngs.outcome.chance(params.pie_rate) {
                Outcome::PreEvalApproved
            } else {
                Outcome::Approved
            };

            data.evaluations.push(evaluation(
                &mut rngs.exposure,
                format!("EVAL-{tag}-{n:06}-1"),
                &account_id,
                statement,
                evaluated_at,
                &outcome,
            ));

            let mut first_pie_at = outcome.is_pie().then_some(evaluated_at);
            let in_population = matches!(outcome, Outcome::Approved | Outcome::PreEvalApproved);
            if in_population && rngs.outcome.chance(params.mixed_rate) {
                let second = if outcome.is_pie() {
                    Outcome::Approved
                } else {
                    Outcome::PreEvalApproved
                };
                let again_at = evaluated_at + Duration::days(rngs.timing.between(1, 2));
                if second.is_pie() {
                    first_pie_at = Some(again_at);
                }
                data.evaluations.push(evaluation(
                    &mut rngs.exposure,
                    format!("EVAL-{tag}-{n:06}-2"),
                    &account_id,
                    statement + 1,
                    again_at,
                    &second,
                ));
                mixed_accounts += 1;
            }

            // Some accounts refresh income before their PIE; the reports
            // must ignore those.
            if rngs.income.chance(0.05) {
                let before = evaluated_at - Duration::days(rngs.income.between(5, 60));
                push_income(&mut data, &account_id, before);
            }
            if let Some(pie_at) = first_pie_at {
                if rngs.income.chance(params.income_rate) {
                    let days = rngs.income.pareto(1.0, 0.9).min(params.max_income_days as f64);
                    let at = pie_at + Duration::seconds((days * 86_400.0) as i64);
                    push_income(&mut data, &account_id, at);
                }
            }
        }
    }

    let summary = SeedSummary {
        evaluations: data.evaluations.len(),
        income_updates: data.income_updates.len(),
        mixed_accounts,
    };
    (data, summary)
}

/// Generate and insert into `store`, replacing any evaluations and
/// income updates already there.
pub fn seed_store(store: &WarehouseStore, params: &SynthParams) -> ReportResult<SeedSummary> {
    let (data, summary) = generate(params);
    let existing = store.evaluation_count()?;
    if existing > 0 {
        log::warn!("replacing {existing} existing evaluations");
    }
    store.clear_rows()?;
    store.insert_evaluations(&data.evaluations)?;
    store.insert_income_updates(&data.income_updates)?;
    log::info!(
        "seeded {} evaluations, {} income updates ({} mixed accounts) from seed {}",
        summary.evaluations,
        summary.income_updates,
        summary.mixed_accounts,
        params.seed
    );
    Ok(summary)
}

fn pick_statement(rng: &mut SynthRng) -> i64 {
    match rng.weighted(&[0.3, 0.2, 0.2, 0.3]) {
        0 => 18,
        1 => 26,
        2 => 34,
        _ => rng.between(42, 60),
    }
}

fn evaluation(
    rng: &mut SynthRng,
    evaluation_id: String,
    account_id: &str,
    statement_number: i64,
    at: NaiveDateTime,
    outcome: &Outcome,
) -> EvaluationRecord {
    let clip_amount = match outcome {
        Outcome::Approved | Outcome::PreEvalApproved => {
            (rng.pareto(300.0, 2.0).min(10_000.0) / 100.0).round() * 100.0
        }
        _ => 0.0,
    };
    let fico = if rng.chance(0.03) {
        None
    } else {
        Some(rng.between(580, 850))
    };
    EvaluationRecord {
        evaluation_id,
        account_id: account_id.to_string(),
        statement_number,
        evaluated_at: at.format(TIMESTAMP_FORMAT).to_string(),
        outcome: outcome.as_str().to_string(),
        clip_amount,
        pre_clip_line_limit: (rng.between(10, 250) * 100) as f64,
        fico,
    }
}

fn push_income(data: &mut SynthData, account_id: &str, at: NaiveDateTime) {
    let n = data.income_updates.len();
    data.income_updates.push(IncomeUpdateRecord {
        update_id: format!("INC-{n:07}"),
        account_id: account_id.to_string(),
        updated_at: at.format(TIMESTAMP_FORMAT).to_string(),
    });
}
