//! Shared primitive types used across every report.

/// Statement bucket code as produced by the warehouse queries.
/// Single statements use their own number; account-level buckets use
/// the sentinel codes below.
pub type StatementCode = i64;

/// Zero-based month offset after the PIE evaluation (0 = days 0-30).
pub type MonthOffset = i64;

/// Bucket code for "Stmt 42+" (every statement from 42 on, deduped per account).
pub const STMT_42_PLUS: StatementCode = 442;

/// Bucket code for "Overall Stmt 18+" (every statement from 18 on, deduped per account).
pub const OVERALL_18_PLUS: StatementCode = 999;

/// Length of one observation month, in days.
pub const DAYS_PER_MONTH: i64 = 30;

/// One observation month in seconds. Income offsets are compared in
/// whole seconds so the `N * 30` day boundary is exact.
pub const SECONDS_PER_MONTH: i64 = DAYS_PER_MONTH * 86_400;

/// Canonical warehouse timestamp layout. Stored timestamps are compared
/// as text, so every row is written in this form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
