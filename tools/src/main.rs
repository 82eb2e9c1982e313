//! pie-report: PIE success-rate reporting over a local warehouse.
//!
//! Usage:
//!   pie-report seed --seed 42 --accounts 2000
//!   pie-report --cohort 2025-04 success-rate --logic fixed
//!   pie-report compare
//!   pie-report clip-results --lookback-months 6
//!   pie-report check

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pie_core::{
    clip_results::load_clip_results,
    cohort::CohortComparison,
    collection::CollectionSet,
    config::ReportConfig,
    export,
    opportunity::load_opportunity,
    query::{QueryCatalog, QueryParams},
    reconciliation::{compare, CheckSummary},
    render,
    statement_cohort::StatementCohortSet,
    store::WarehouseStore,
    success_rate::{Categorization, SuccessRateSet},
    summary::load_summary,
    synth::{seed_store, SynthParams},
    types::OVERALL_18_PLUS,
    window::CohortMonth,
};
use std::{path::PathBuf, process::ExitCode};

const EXIT_VIOLATION: u8 = 2;

#[derive(Parser)]
#[command(name = "pie-report", version, about = "PIE income evaluation reports")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON report configuration; defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite warehouse file.
    #[arg(long, global = true)]
    warehouse: Option<String>,

    /// Cohort month, YYYY-MM.
    #[arg(long, global = true)]
    cohort: Option<String>,

    #[arg(long, global = true)]
    output_dir: Option<String>,

    /// Directory of .sql files overriding the built-in queries.
    #[arg(long, global = true)]
    sql_dir: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the warehouse with deterministic synthetic data. Existing
    /// evaluations and income updates are replaced.
    Seed {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 2_000)]
        accounts: usize,
        /// Comma-separated cohort months; defaults to the configured comparison cohorts.
        #[arg(long, value_delimiter = ',')]
        cohorts: Vec<String>,
    },
    /// Import evaluation and income-update CSV files.
    Load {
        #[arg(long)]
        evaluations: Option<PathBuf>,
        #[arg(long)]
        income: Option<PathBuf>,
    },
    /// Success rate over time per statement bucket.
    SuccessRate {
        #[arg(long, default_value = "fixed")]
        logic: Categorization,
        /// Skip writing the CSV of all rows.
        #[arg(long)]
        no_csv: bool,
    },
    /// Old vs fixed categorization side by side.
    Compare,
    /// Combined success summary for one statement.
    IncomeTracking {
        /// Statement bucket code; defaults to the configured headline statement.
        #[arg(long)]
        statement: Option<i64>,
    },
    /// Key metrics for every statement bucket.
    MultiStatement,
    /// PIE income collection rate by month, PIE accounts only.
    AccountLevel,
    /// Success rate by month for several cohorts.
    CohortComparison {
        #[arg(long, value_delimiter = ',')]
        cohorts: Vec<String>,
        #[arg(long, default_value_t = OVERALL_18_PLUS)]
        statement: i64,
        #[arg(long, default_value = "fixed")]
        logic: Categorization,
    },
    /// Credit line increase exposure blocked by the income requirement.
    Opportunity {
        #[arg(long)]
        min_statement: Option<i64>,
        /// Calendar months covered, from the cohort month on.
        #[arg(long)]
        lookback_months: Option<i64>,
    },
    /// Approved CLIP exposure and averages by month.
    ClipResults {
        #[arg(long)]
        lookback_months: Option<i64>,
    },
    /// PIE collection by statement cohort and months since PIE.
    CollectionCohorts,
    /// Chart-ready pivot, detailed rows and a manifest.
    Export {
        #[arg(long, default_value = "fixed")]
        logic: Categorization,
    },
    /// Run every reconciliation identity under both categorizations.
    Check {
        /// Print the full result as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli.global)?;
    log::debug!("warehouse={} cohort={}", config.warehouse_path, config.cohort);

    match cli.command {
        Command::Seed {
            seed,
            accounts,
            cohorts,
        } => {
            let cohorts = if cohorts.is_empty() {
                config.comparison_cohorts.clone()
            } else {
                parse_cohorts(&cohorts)?
            };
            let store = WarehouseStore::open(&config.warehouse_path)
                .with_context(|| format!("cannot create warehouse at {}", config.warehouse_path))?;
            store.migrate()?;
            let params = SynthParams {
                seed,
                accounts_per_cohort: accounts,
                cohorts,
                ..SynthParams::default()
            };
            let summary = seed_store(&store, &params)?;
            println!("Seeded {}", config.warehouse_path);
            println!("  evaluations:    {}", render::thousands(summary.evaluations as i64));
            println!("  income updates: {}", render::thousands(summary.income_updates as i64));
            println!("  mixed accounts: {}", render::thousands(summary.mixed_accounts as i64));
        }
        Command::Load { evaluations, income } => {
            let store = WarehouseStore::open(&config.warehouse_path)
                .with_context(|| format!("cannot open warehouse at {}", config.warehouse_path))?;
            store.migrate()?;
            if let Some(path) = evaluations {
                let rows = export::read_evaluations(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let n = store.insert_evaluations(&rows)?;
                println!("Loaded {} evaluations from {}", render::thousands(n as i64), path.display());
            }
            if let Some(path) = income {
                let rows = export::read_income_updates(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let n = store.insert_income_updates(&rows)?;
                println!(
                    "Loaded {} income updates from {}",
                    render::thousands(n as i64),
                    path.display()
                );
            }
        }
        Command::SuccessRate { logic, no_csv } => {
            let ctx = ReportContext::open(&config)?;
            let set = ctx.success_rate(logic)?;
            if set.is_empty() {
                println!("No results returned from query");
                return Ok(ExitCode::SUCCESS);
            }
            print!("{}", render::success_rate_report(&set, config.focus_month_offset()));
            if !no_csv {
                let name = format!("pie_success_rate_{}_{}.csv", config.cohort, logic.name());
                let path = export::write_file_with(ctx.output_dir(), &name, |f| {
                    export::write_table(&set.table, f)
                })?;
                println!("\nResults exported to: {}", path.display());
            }
        }
        Command::Compare => {
            let ctx = ReportContext::open(&config)?;
            let old = ctx.success_rate(Categorization::Old)?;
            let fixed = ctx.success_rate(Categorization::Fixed)?;
            let cmp = compare(&old, &fixed);
            let codes: Vec<i64> = config.buckets.iter().map(|b| b.code).collect();
            print!(
                "{}",
                render::comparison_report(
                    &cmp,
                    &codes,
                    OVERALL_18_PLUS,
                    config.focus_month_offset(),
                    config.flag_rate_delta,
                    config.material_rate_delta,
                )
            );
        }
        Command::IncomeTracking { statement } => {
            let ctx = ReportContext::open(&config)?;
            let code = statement.unwrap_or(config.headline_statement);
            let (_, rows) = load_summary(&ctx.store, &ctx.catalog, &ctx.params)?;
            match rows.iter().find(|r| r.statement_number == code) {
                Some(row) => print!("{}", render::income_tracking_report(row, config.window_months)),
                None => println!("No results returned for {}", config.label_for(code)),
            }
        }
        Command::MultiStatement => {
            let ctx = ReportContext::open(&config)?;
            let (table, rows) = load_summary(&ctx.store, &ctx.catalog, &ctx.params)?;
            print!("{}", render::multi_statement_report(&rows));
            if !rows.is_empty() {
                println!("\n{}", render::banner("FULL RESULTS", render::WIDE));
                print!("{}", table.to_text());
            }
        }
        Command::AccountLevel => {
            let ctx = ReportContext::open(&config)?;
            let set = CollectionSet::load(&ctx.store, &ctx.catalog, &ctx.params)?;
            let codes: Vec<i64> = config
                .buckets
                .iter()
                .filter(|b| b.is_account_level())
                .map(|b| b.code)
                .collect();
            print!(
                "{}",
                render::account_level_report(&set, &codes, config.focus_month_offset())
            );
            for code in &codes {
                if !set.new_collections_reconcile(*code) {
                    log::warn!(
                        "{}: monthly new collections do not add up to the cumulative count",
                        config.label_for(*code)
                    );
                }
            }
            let name = format!("pie_income_collection_account_level_{}.csv", config.cohort);
            let path = export::write_file_with(ctx.output_dir(), &name, |f| {
                export::write_account_level(&set, f)
            })?;
            println!("\nChart data exported to: {}", path.display());
        }
        Command::CohortComparison {
            cohorts,
            statement,
            logic,
        } => {
            let ctx = ReportContext::open(&config)?;
            let cohorts = if cohorts.is_empty() {
                config.comparison_cohorts.clone()
            } else {
                parse_cohorts(&cohorts)?
            };
            let cc = CohortComparison::load(&ctx.store, &ctx.catalog, &ctx.params, &cohorts, logic)?;
            let label = config.label_for(statement);
            print!("{}", render::cohort_comparison_report(&cc, statement, &label));
            let name = format!("pie_success_rate_by_cohort_{statement}_{}.csv", logic.name());
            let path = export::write_file_with(ctx.output_dir(), &name, |f| {
                export::write_cohort_pivot(&cc, statement, f)
            })?;
            println!("\nChart data exported to: {}", path.display());
        }
        Command::Opportunity {
            min_statement,
            lookback_months,
        } => {
            let mut ctx = ReportContext::open(&config)?;
            if let Some(min) = min_statement {
                ctx.params.min_statement = min;
            }
            if let Some(months) = lookback_months {
                ctx.params.lookback_months = positive_months(months)?;
            }
            let (_, rows) = load_opportunity(&ctx.store, &ctx.catalog, &ctx.params)?;
            if rows.is_empty() {
                println!("No results returned from query");
                return Ok(ExitCode::SUCCESS);
            }
            print!("{}", render::opportunity_report(&rows, ctx.params.min_statement));
        }
        Command::ClipResults { lookback_months } => {
            let mut ctx = ReportContext::open(&config)?;
            if let Some(months) = lookback_months {
                ctx.params.lookback_months = positive_months(months)?;
            }
            let (table, rows) = load_clip_results(&ctx.store, &ctx.catalog, &ctx.params)?;
            if rows.is_empty() {
                println!("No results returned from query");
                return Ok(ExitCode::SUCCESS);
            }
            print!("{}", render::clip_results_report(&rows));
            let name = format!("clip_results_{}.csv", config.cohort);
            let path = export::write_file_with(ctx.output_dir(), &name, |f| {
                export::write_table(&table, f)
            })?;
            println!("\nResults exported to: {}", path.display());
        }
        Command::CollectionCohorts => {
            let ctx = ReportContext::open(&config)?;
            let set = StatementCohortSet::load(&ctx.store, &ctx.catalog, &ctx.params)?;
            if set.is_empty() {
                println!("No results returned from query");
                return Ok(ExitCode::SUCCESS);
            }
            print!(
                "{}",
                render::statement_cohort_report(&set, &config.cohort.display_name())
            );
            let name = format!("pie_collection_by_cohort_{}.csv", config.cohort);
            let path = export::write_file_with(ctx.output_dir(), &name, |f| {
                export::write_table(&set.table, f)
            })?;
            println!("\nResults exported to: {}", path.display());
        }
        Command::Export { logic } => {
            let ctx = ReportContext::open(&config)?;
            let set = ctx.success_rate(logic)?;
            if set.is_empty() {
                println!("No results returned from query");
                return Ok(ExitCode::SUCCESS);
            }
            let manifest =
                export::export_success_rate(&set, &config, config.cohort, ctx.output_dir())?;
            println!("Exported run {} to {}", manifest.run_id, config.output_dir);
            for f in &manifest.files {
                println!("  {f}");
            }
        }
        Command::Check { json } => {
            let ctx = ReportContext::open(&config)?;
            let old = ctx.success_rate(Categorization::Old)?;
            let fixed = ctx.success_rate(Categorization::Fixed)?;
            let summary = CheckSummary::build(&old, &fixed);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", render::check_report(&summary));
            }
            if !summary.passed() {
                return Ok(ExitCode::from(EXIT_VIOLATION));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &GlobalArgs) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let path = path.to_string_lossy();
            ReportConfig::load(&path).with_context(|| format!("loading config {path}"))?
        }
        None => ReportConfig::default(),
    };
    if let Some(w) = &args.warehouse {
        config.warehouse_path = w.clone();
    }
    if let Some(c) = &args.cohort {
        config.cohort = CohortMonth::parse(c)?;
    }
    if let Some(o) = &args.output_dir {
        config.output_dir = o.clone();
    }
    if let Some(s) = &args.sql_dir {
        config.sql_dir = Some(s.clone());
    }
    config.validate()?;
    Ok(config)
}

fn positive_months(months: i64) -> Result<i64> {
    anyhow::ensure!(months >= 1, "--lookback-months must be >= 1 (got {months})");
    Ok(months)
}

fn parse_cohorts(values: &[String]) -> Result<Vec<CohortMonth>> {
    values
        .iter()
        .map(|v| CohortMonth::parse(v).map_err(Into::into))
        .collect()
}

/// Everything a report needs: an open warehouse with the configured
/// buckets installed, the query catalog and bound parameters.
struct ReportContext {
    store: WarehouseStore,
    catalog: QueryCatalog,
    params: QueryParams,
    output_dir: PathBuf,
}

impl ReportContext {
    fn open(config: &ReportConfig) -> Result<Self> {
        let store = WarehouseStore::open_existing(&config.warehouse_path)
            .with_context(|| format!("cannot open warehouse at {}", config.warehouse_path))?;
        store.install_buckets(&config.buckets)?;
        log::info!(
            "opened warehouse {} ({} evaluations)",
            store.path().unwrap_or(":memory:"),
            store.evaluation_count()?
        );
        Ok(Self {
            store,
            catalog: QueryCatalog::from_config(config),
            params: QueryParams::from_config(config),
            output_dir: PathBuf::from(&config.output_dir),
        })
    }

    fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    fn success_rate(&self, logic: Categorization) -> Result<SuccessRateSet> {
        SuccessRateSet::load(&self.store, &self.catalog, &self.params, logic)
            .with_context(|| format!("running {} success-rate query", logic.name()))
    }
}
