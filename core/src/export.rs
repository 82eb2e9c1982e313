//! CSV export of report results and CSV import of warehouse rows.
//!
//! RULE: Every file written here is plain CSV (or JSON for the manifest)
//! so any spreadsheet or chart tool can pick it up.

use crate::{
    cohort::CohortComparison,
    collection::CollectionSet,
    config::ReportConfig,
    error::ReportResult,
    store::{EvaluationRecord, IncomeUpdateRecord},
    success_rate::{Categorization, SuccessRateSet},
    table::ResultTable,
    types::StatementCode,
    window::CohortMonth,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use uuid::Uuid;

// ── Writers ────────────────────────────────────────────────────

/// Dump a raw query result with its warehouse column names.
pub fn write_table<W: Write>(table: &ResultTable, out: W) -> ReportResult<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(&table.columns)?;
    for row in &table.rows {
        w.write_record(row.iter().map(|v| v.render()))?;
    }
    w.flush()?;
    Ok(())
}

/// One row per (bucket, month) with spreadsheet-friendly headers.
pub fn write_success_rate_detail<W: Write>(set: &SuccessRateSet, out: W) -> ReportResult<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record([
        "Statement",
        "Month",
        "Days Range",
        "Total Accounts",
        "Approved Outright",
        "PIE Total",
        "PIE Collected",
        "Total Success",
        "Success Rate %",
    ])?;
    for code in set.codes() {
        for r in set.series(code) {
            let window = r.window();
            w.write_record([
                r.statement_label.clone(),
                format!("Month {}", window.label()),
                window.days_range(),
                r.total_population.to_string(),
                r.approved_outright_count.to_string(),
                r.pie_total_count.to_string(),
                r.pie_income_collected_by_month.to_string(),
                r.success_count.to_string(),
                format!("{:.2}", r.success_rate_pct),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Month x bucket success-rate grid, buckets in `codes` order. Missing
/// cells are left blank.
pub fn write_success_rate_pivot<W: Write>(
    set: &SuccessRateSet,
    codes: &[(StatementCode, String)],
    out: W,
) -> ReportResult<()> {
    let mut w = csv::Writer::from_writer(out);
    let mut header = vec!["Month".to_string()];
    header.extend(codes.iter().map(|(_, label)| label.clone()));
    w.write_record(&header)?;

    for (label, rates) in set.pivot_success_rate() {
        let mut record = vec![format!("Month {label}")];
        for (code, _) in codes {
            record.push(
                rates
                    .get(code)
                    .map(|rate| format!("{rate:.2}"))
                    .unwrap_or_default(),
            );
        }
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_account_level<W: Write>(set: &CollectionSet, out: W) -> ReportResult<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record([
        "STATEMENT_LABEL",
        "STATEMENT_NUMBER",
        "MONTH_LABEL",
        "MONTH_OFFSET",
        "DAYS_START",
        "DAYS_END",
        "PIE_TOTAL_COUNT",
        "PIE_INCOME_COLLECTED_BY_MONTH",
        "PIE_INCOME_COLLECTION_RATE_PCT",
        "NEW_INCOME_COLLECTIONS_THIS_MONTH",
    ])?;
    for r in &set.rows {
        let window = r.window();
        w.write_record([
            r.statement_label.clone(),
            r.statement_number.to_string(),
            format!("Month {}", window.label()),
            r.month_offset.to_string(),
            window.days_start().to_string(),
            window.days_end().to_string(),
            r.pie_total_count.to_string(),
            r.pie_income_collected_by_month.to_string(),
            format!("{:.2}", r.pie_income_collection_rate_pct),
            r.new_income_collections_this_month.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Month x cohort success-rate grid for one bucket.
pub fn write_cohort_pivot<W: Write>(
    cc: &CohortComparison,
    code: StatementCode,
    out: W,
) -> ReportResult<()> {
    let mut w = csv::Writer::from_writer(out);
    let mut header = vec!["Month".to_string()];
    header.extend(cc.names());
    w.write_record(&header)?;
    for (label, rates) in cc.pivot(code) {
        let mut record = vec![format!("Month {label}")];
        record.extend(
            rates
                .into_iter()
                .map(|r| r.map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

// ── Export bundle ──────────────────────────────────────────────

/// Written next to the CSVs so a consumer knows what produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub cohort: CohortMonth,
    pub categorization: Categorization,
    pub window_months: i64,
    pub rows: usize,
    pub files: Vec<String>,
}

/// Write the wide pivot, the detailed rows and the manifest into `dir`.
/// Returns the manifest.
pub fn export_success_rate(
    set: &SuccessRateSet,
    config: &ReportConfig,
    cohort: CohortMonth,
    dir: &Path,
) -> ReportResult<ExportManifest> {
    fs::create_dir_all(dir)?;
    let prefix = format!("pie_success_rate_{}_{}", cohort, set.categorization.name());

    // Config order, falling back to whatever the query returned.
    let mut codes: Vec<(StatementCode, String)> = config
        .buckets
        .iter()
        .filter(|b| !set.series(b.code).is_empty())
        .map(|b| (b.code, b.label.clone()))
        .collect();
    for code in set.codes() {
        if !codes.iter().any(|(c, _)| *c == code) {
            codes.push((code, config.label_for(code)));
        }
    }

    let pivot_name = format!("{prefix}_pivot.csv");
    write_success_rate_pivot(set, &codes, fs::File::create(dir.join(&pivot_name))?)?;
    let detail_name = format!("{prefix}_detailed.csv");
    write_success_rate_detail(set, fs::File::create(dir.join(&detail_name))?)?;

    let manifest = ExportManifest {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        cohort,
        categorization: set.categorization,
        window_months: config.window_months,
        rows: set.rows.len(),
        files: vec![pivot_name, detail_name],
    };
    let manifest_path = dir.join(format!("{prefix}_manifest.json"));
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    log::info!(
        "exported {} rows to {} (run {})",
        manifest.rows,
        dir.display(),
        manifest.run_id
    );
    Ok(manifest)
}

/// Write to `dir/name`, creating `dir`. Returns the full path.
pub fn write_file_with<F>(dir: &Path, name: &str, write: F) -> ReportResult<PathBuf>
where
    F: FnOnce(fs::File) -> ReportResult<()>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    write(fs::File::create(&path)?)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

// ── Readers ────────────────────────────────────────────────────

pub fn read_evaluations(path: &Path) -> ReportResult<Vec<EvaluationRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<EvaluationRecord>, _>>()?;
    log::info!("read {} evaluations from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn read_income_updates(path: &Path) -> ReportResult<Vec<IncomeUpdateRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<IncomeUpdateRecord>, _>>()?;
    log::info!("read {} income updates from {}", rows.len(), path.display());
    Ok(rows)
}
