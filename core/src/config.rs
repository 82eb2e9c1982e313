use crate::{
    error::{ReportError, ReportResult},
    types::{StatementCode, OVERALL_18_PLUS, STMT_42_PLUS},
    window::CohortMonth,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One statement bucket: a contiguous statement range reported as a single row set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketConfig {
    pub code: StatementCode,
    pub label: String,
    pub min_statement: i64,
    /// `None` means open-ended (`min_statement` and above).
    #[serde(default)]
    pub max_statement: Option<i64>,
}

impl BucketConfig {
    pub fn single(statement: i64) -> Self {
        Self {
            code: statement,
            label: format!("Stmt {statement}"),
            min_statement: statement,
            max_statement: Some(statement),
        }
    }

    pub fn open_ended(code: StatementCode, label: &str, min_statement: i64) -> Self {
        Self {
            code,
            label: label.to_string(),
            min_statement,
            max_statement: None,
        }
    }

    /// Account-level buckets span several statements, so an account can
    /// appear with different outcomes inside one bucket.
    pub fn is_account_level(&self) -> bool {
        self.max_statement != Some(self.min_statement)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// SQLite warehouse file.
    pub warehouse_path: String,
    /// Directory of `.sql` overrides; built-in queries are used when absent.
    pub sql_dir: Option<String>,
    pub output_dir: String,
    pub cohort: CohortMonth,
    pub comparison_cohorts: Vec<CohortMonth>,
    /// Observation window length in 30-day months.
    pub window_months: i64,
    /// Lowest statement number where the income requirement applies.
    pub min_statement: i64,
    /// Calendar months of evaluations, from the cohort month on, covered
    /// by the opportunity and CLIP results reports.
    pub lookback_months: i64,
    pub buckets: Vec<BucketConfig>,
    /// Statement shown by `income-tracking`.
    pub headline_statement: StatementCode,
    /// Per-bucket success-rate delta (points) flagged in old/fixed comparison.
    pub flag_rate_delta: f64,
    /// Overall-bucket delta (points) considered a material difference.
    pub material_rate_delta: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let cohort = CohortMonth::literal(2025, 4);
        let march = CohortMonth::literal(2025, 3);
        Self {
            warehouse_path: "warehouse.db".into(),
            sql_dir: None,
            output_dir: "./reports".into(),
            cohort,
            comparison_cohorts: vec![march, cohort, cohort.next()],
            window_months: 8,
            min_statement: 18,
            lookback_months: 12,
            buckets: vec![
                BucketConfig::single(18),
                BucketConfig::single(26),
                BucketConfig::single(34),
                BucketConfig::open_ended(STMT_42_PLUS, "Stmt 42+", 42),
                BucketConfig::open_ended(OVERALL_18_PLUS, "Overall Stmt 18+", 18),
            ],
            headline_statement: 18,
            flag_rate_delta: 0.05,
            material_rate_delta: 0.1,
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &str) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.window_months < 1 {
            return Err(ReportError::InvalidConfig {
                reason: format!("window_months must be >= 1 (got {})", self.window_months),
            });
        }
        if self.lookback_months < 1 {
            return Err(ReportError::InvalidConfig {
                reason: format!("lookback_months must be >= 1 (got {})", self.lookback_months),
            });
        }
        if self.buckets.is_empty() {
            return Err(ReportError::InvalidConfig {
                reason: "at least one statement bucket is required".into(),
            });
        }
        let mut seen = HashSet::new();
        for b in &self.buckets {
            if !seen.insert(b.code) {
                return Err(ReportError::InvalidConfig {
                    reason: format!("duplicate bucket code {}", b.code),
                });
            }
            if let Some(max) = b.max_statement {
                if max < b.min_statement {
                    return Err(ReportError::InvalidConfig {
                        reason: format!(
                            "bucket {} has max_statement {max} below min_statement {}",
                            b.code, b.min_statement
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Last month offset of the window (7 for the default 8-month window).
    pub fn focus_month_offset(&self) -> i64 {
        self.window_months - 1
    }

    pub fn bucket(&self, code: StatementCode) -> Option<&BucketConfig> {
        self.buckets.iter().find(|b| b.code == code)
    }

    /// Label for a bucket code, falling back to `Stmt N`.
    pub fn label_for(&self, code: StatementCode) -> String {
        self.bucket(code)
            .map(|b| b.label.clone())
            .unwrap_or_else(|| format!("Stmt {code}"))
    }
}
