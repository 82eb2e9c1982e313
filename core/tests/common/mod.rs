//! Hand-built April 2025 warehouse shared by the integration tests.
//!
//! Population per bucket (APPROVED / PRE_EVAL_APPROVED evaluations only):
//!   Stmt 18:  A1 A2 approved; A3 A4 A5 A6 PIE; A7 declined (excluded)
//!   Stmt 26:  B1 approved; B2 PIE
//!   Stmt 42+: C1 PIE@42 then APPROVED@43; C2 APPROVED@50 then PIE@51;
//!             C3 approved; C4 PRE_EVAL_DECLINED (excluded)
//!   Outside:  D1 (May cohort), E1 (statement 10)
//!
//! Income, in days after first PIE:
//!   A3 18, A4 52, A5 none, A6 only before PIE, B2 ~0, C1 36, C2 none

#![allow(dead_code)]

use pie_core::{
    config::ReportConfig,
    query::{QueryCatalog, QueryParams},
    store::{EvaluationRecord, IncomeUpdateRecord, WarehouseStore},
};

pub fn eval(id: &str, account: &str, stmt: i64, at: &str, outcome: &str, clip: f64) -> EvaluationRecord {
    EvaluationRecord {
        evaluation_id: id.to_string(),
        account_id: account.to_string(),
        statement_number: stmt,
        evaluated_at: at.to_string(),
        outcome: outcome.to_string(),
        clip_amount: clip,
        pre_clip_line_limit: 5_000.0,
        fico: Some(700),
    }
}

pub fn income(id: &str, account: &str, at: &str) -> IncomeUpdateRecord {
    IncomeUpdateRecord {
        update_id: id.to_string(),
        account_id: account.to_string(),
        updated_at: at.to_string(),
    }
}

pub fn evaluations() -> Vec<EvaluationRecord> {
    vec![
        eval("e01", "A1", 18, "2025-04-03 10:00:00", "APPROVED", 500.0),
        eval("e02", "A2", 18, "2025-04-05 10:00:00", "APPROVED", 500.0),
        eval("e03", "A3", 18, "2025-04-02 09:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e04", "A4", 18, "2025-04-10 12:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e05", "A5", 18, "2025-04-11 12:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e06", "A6", 18, "2025-04-12 00:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e07", "A7", 18, "2025-04-12 00:00:00", "DECLINED", 0.0),
        eval("e08", "B1", 26, "2025-04-07 00:00:00", "APPROVED", 500.0),
        eval("e09", "B2", 26, "2025-04-08 08:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e10", "C1", 42, "2025-04-04 00:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e11", "C1", 43, "2025-04-06 00:00:00", "APPROVED", 500.0),
        eval("e12", "C2", 50, "2025-04-15 00:00:00", "APPROVED", 500.0),
        eval("e13", "C2", 51, "2025-04-17 00:00:00", "PRE_EVAL_APPROVED", 1_000.0),
        eval("e14", "C3", 45, "2025-04-20 00:00:00", "APPROVED", 500.0),
        eval("e15", "C4", 60, "2025-04-21 00:00:00", "PRE_EVAL_DECLINED", 0.0),
        eval("e16", "D1", 18, "2025-05-02 00:00:00", "APPROVED", 500.0),
        eval("e17", "E1", 10, "2025-04-05 00:00:00", "APPROVED", 500.0),
    ]
}

pub fn income_updates() -> Vec<IncomeUpdateRecord> {
    vec![
        income("i1", "A3", "2025-04-20 09:00:00"),
        income("i2", "A4", "2025-06-01 12:00:00"),
        income("i3", "A6", "2025-03-30 00:00:00"),
        income("i4", "B2", "2025-04-08 09:00:00"),
        income("i5", "C1", "2025-05-10 00:00:00"),
    ]
}

pub struct Fixture {
    pub store: WarehouseStore,
    pub catalog: QueryCatalog,
    pub params: QueryParams,
    pub config: ReportConfig,
}

pub fn fixture() -> Fixture {
    let config = ReportConfig::default();
    let store = WarehouseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.install_buckets(&config.buckets).expect("buckets");
    store.insert_evaluations(&evaluations()).expect("evaluations");
    store.insert_income_updates(&income_updates()).expect("income updates");
    Fixture {
        store,
        catalog: QueryCatalog::builtin(),
        params: QueryParams::from_config(&config),
        config,
    }
}

pub fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
