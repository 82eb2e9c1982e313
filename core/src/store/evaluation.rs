use super::WarehouseStore;
use crate::{error::ReportResult, outcome::Outcome, window::normalize_timestamp};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One credit-line-increase evaluation of one account at one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub evaluation_id: String,
    pub account_id: String,
    pub statement_number: i64,
    /// `YYYY-MM-DD HH:MM:SS`
    pub evaluated_at: String,
    pub outcome: String,
    #[serde(default)]
    pub clip_amount: f64,
    #[serde(default)]
    pub pre_clip_line_limit: f64,
    #[serde(default)]
    pub fico: Option<i64>,
}

impl EvaluationRecord {
    pub fn outcome(&self) -> Outcome {
        Outcome::parse(&self.outcome)
    }
}

/// An income collection event for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeUpdateRecord {
    pub update_id: String,
    pub account_id: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub updated_at: String,
}

impl WarehouseStore {
    /// Insert a batch in one transaction. Returns the number of rows written.
    ///
    /// `evaluated_at` is normalized to `YYYY-MM-DD HH:MM:SS`; a row that
    /// does not parse aborts the whole batch.
    pub fn insert_evaluations(&self, rows: &[EvaluationRecord]) -> ReportResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO clip_evaluation
                 (evaluation_id, account_id, statement_number, evaluated_at, outcome,
                  clip_amount, pre_clip_line_limit, fico)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for e in rows {
                let evaluated_at = normalize_timestamp("evaluated_at", &e.evaluated_at)?;
                stmt.execute(params![
                    e.evaluation_id,
                    e.account_id,
                    e.statement_number,
                    evaluated_at,
                    e.outcome().as_str(),
                    e.clip_amount,
                    e.pre_clip_line_limit,
                    e.fico,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn insert_income_updates(&self, rows: &[IncomeUpdateRecord]) -> ReportResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO income_update (update_id, account_id, updated_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            for u in rows {
                let updated_at = normalize_timestamp("updated_at", &u.updated_at)?;
                stmt.execute(params![u.update_id, u.account_id, updated_at])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Remove every evaluation and income update. Buckets are kept.
    pub fn clear_rows(&self) -> ReportResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM clip_evaluation", [])?;
        tx.execute("DELETE FROM income_update", [])?;
        tx.commit()?;
        Ok(())
    }

    pub fn evaluation_count(&self) -> ReportResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clip_evaluation", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn income_update_count(&self) -> ReportResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM income_update", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Evaluations for one account, oldest first.
    pub fn evaluations_for_account(&self, account_id: &str) -> ReportResult<Vec<EvaluationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT evaluation_id, account_id, statement_number, evaluated_at, outcome,
                    clip_amount, pre_clip_line_limit, fico
             FROM clip_evaluation WHERE account_id = ?1
             ORDER BY evaluated_at ASC, evaluation_id ASC",
        )?;
        let rows = stmt
            .query_map(params![account_id], |row| {
                Ok(EvaluationRecord {
                    evaluation_id: row.get(0)?,
                    account_id: row.get(1)?,
                    statement_number: row.get(2)?,
                    evaluated_at: row.get(3)?,
                    outcome: row.get(4)?,
                    clip_amount: row.get(5)?,
                    pre_clip_line_limit: row.get(6)?,
                    fico: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
