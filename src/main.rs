use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use samc::acwr::{AcwrReport, AcwrStatus};
use samc::advisor::{AdvisorAction, AdvisorRecommendation};
use samc::config::SamcConfig;
use samc::engine::{DailyEvaluation, SamcEngine};
use samc::logging::init_logging;
use samc::models::{Domain, SportConfig, TrainingSession};
use samc::readiness::{ReadinessReport, ReadinessStatus};

/// SAMC - Strength and Multi-domain Conditioning advisor
///
/// Computes per-domain training loads, acute:chronic workload ratios,
/// recovery-based readiness and a daily training recommendation.
#[derive(Parser)]
#[command(name = "samc")]
#[command(author = "SAMC Contributors")]
#[command(version)]
#[command(about = "Multi-domain training load advisor", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the load vector of one session payload
    Load {
        /// Registered sport id (weight_lifting, bicycle_commuting)
        #[arg(short, long)]
        sport: String,

        /// JSON payload file
        #[arg(short, long)]
        payload: PathBuf,

        /// Global intensity multiplier (0.1-3.0)
        #[arg(short = 'm', long)]
        modifier: Option<f64>,
    },

    /// Acute:chronic workload ratio per domain
    Acwr {
        /// JSON session history
        #[arg(long)]
        history: PathBuf,

        /// Evaluation date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Residual fatigue and readiness per domain
    Readiness {
        /// JSON session history
        #[arg(long)]
        history: PathBuf,

        /// Evaluation instant (RFC 3339, default: now)
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },

    /// Recommend today's session
    Advise {
        /// JSON session history
        #[arg(long)]
        history: PathBuf,

        /// Evaluation instant (RFC 3339, default: now)
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },

    /// Size the training micro-cycle
    Cycle {
        /// JSON list of sport configurations (default: every built-in sport)
        #[arg(short, long)]
        sports: Option<PathBuf>,

        /// Rest days appended to the cycle (0-3)
        #[arg(long)]
        min_rest: Option<u32>,

        /// Fixed cycle length in days (3-21)
        #[arg(long = "override")]
        override_days: Option<u32>,
    },

    /// Replay the advisor over a date range
    Backtest {
        /// JSON session history
        #[arg(long)]
        history: PathBuf,

        /// First day (YYYY-MM-DD)
        #[arg(short, long)]
        from: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(short, long)]
        to: NaiveDate,

        /// Time of day for each evaluation (HH:MM:SS)
        #[arg(long, default_value = "07:00:00")]
        time: NaiveTime,
    },

    /// List the built-in exercise catalog with stress profiles
    Catalog,
}

/// History entries are either stored sessions or raw payloads to compute
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryEntry {
    Computed(TrainingSession),
    Raw {
        timestamp: DateTime<Utc>,
        sport_id: String,
        payload: Value,
        #[serde(default)]
        intensity_modifier: Option<f64>,
    },
}

#[derive(Tabled)]
struct LoadRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Load")]
    load: String,
}

#[derive(Tabled)]
struct AcwrRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Acute")]
    acute: String,
    #[tabled(rename = "Chronic/wk")]
    chronic: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct ReadinessRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Residual")]
    residual: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct GuidanceRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Load?")]
    can_load: String,
    #[tabled(rename = "Guidance")]
    guidance: String,
}

#[derive(Tabled)]
struct BacktestRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "ACWR")]
    acwr: String,
    #[tabled(rename = "Readiness")]
    readiness: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Volume")]
    volume: String,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "M")]
    metabolic: String,
    #[tabled(rename = "N")]
    neuromuscular: String,
    #[tabled(rename = "T")]
    tendon: String,
    #[tabled(rename = "A")]
    autonomic: String,
    #[tabled(rename = "C")]
    coordination: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SamcConfig::load_from_file(path)?,
        None => SamcConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    config.validate()?;
    let engine = config.build_engine()?;

    match cli.command {
        Commands::Load {
            sport,
            payload,
            modifier,
        } => {
            let payload = read_json(&payload)?;
            let load = match modifier {
                Some(modifier) => engine.compute_session_load_with_modifier(&sport, &payload, modifier),
                None => engine.compute_session_load(&sport, &payload),
            }
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;

            if cli.json {
                print_json(&load)?;
            } else {
                println!("{}", format!("Session load ({})", sport).green().bold());
                let rows: Vec<LoadRow> = load
                    .iter()
                    .map(|(domain, value)| LoadRow {
                        domain: domain.name().to_string(),
                        load: format!("{:.1}", value),
                    })
                    .collect();
                print_table(rows);
            }
        }

        Commands::Acwr { history, date } => {
            let sessions = load_history(&engine, &history)?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let report = engine.compute_acwr(&sessions, date);

            if cli.json {
                print_json(&report)?;
            } else {
                print_acwr(&report);
            }
        }

        Commands::Readiness { history, at } => {
            let sessions = load_history(&engine, &history)?;
            let report = engine.compute_domain_readiness(&sessions, at.unwrap_or_else(Utc::now));

            if cli.json {
                print_json(&report)?;
            } else {
                print_readiness(&report);
            }
        }

        Commands::Advise { history, at } => {
            let sessions = load_history(&engine, &history)?;
            let evaluation = engine.evaluate_day(&sessions, at.unwrap_or_else(Utc::now));

            if cli.json {
                print_json(&evaluation)?;
            } else {
                print_advice(&evaluation.advice);
            }
        }

        Commands::Cycle {
            sports,
            min_rest,
            override_days,
        } => {
            let configs: Vec<SportConfig> = match sports {
                Some(path) => serde_json::from_value(read_json(&path)?)
                    .with_context(|| format!("Invalid sport configuration list: {}", path.display()))?,
                None => engine.registry().default_configs(),
            };
            let cycle = engine
                .compute_micro_cycle_length(
                    &configs,
                    min_rest.unwrap_or(config.micro_cycle.min_rest_days),
                    override_days.or(config.micro_cycle.override_days),
                )
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;

            if cli.json {
                print_json(&cycle)?;
            } else {
                println!("{}", "Micro-cycle".cyan().bold());
                println!("  Computed: {} days", cycle.computed_days);
                if let Some(days) = cycle.override_days {
                    println!("  Override: {} days", days);
                }
                println!("  Effective: {}", format!("{} days", cycle.effective_days).bold());
            }
        }

        Commands::Backtest {
            history,
            from,
            to,
            time,
        } => {
            if to < from {
                anyhow::bail!("--to ({}) is before --from ({})", to, from);
            }
            let sessions = load_history(&engine, &history)?;
            let evaluations = engine.backtest_range(&sessions, from, to, time);

            if cli.json {
                print_json(&evaluations)?;
            } else {
                print_backtest(&evaluations);
            }
        }

        Commands::Catalog => {
            let mapper = engine.mapper();
            let catalog = mapper.catalog();
            let rows: Vec<CatalogRow> = catalog
                .ids()
                .into_iter()
                .filter_map(|id| catalog.lookup(id))
                .map(|profile| {
                    let stress = mapper.map(&profile.tags);
                    let cell = |domain: Domain| format!("{:.2}", stress.get(domain));
                    CatalogRow {
                        exercise: profile.display_name.clone(),
                        category: profile.category.clone(),
                        metabolic: cell(Domain::Metabolic),
                        neuromuscular: cell(Domain::Neuromuscular),
                        tendon: cell(Domain::Tendon),
                        autonomic: cell(Domain::Autonomic),
                        coordination: cell(Domain::Coordination),
                    }
                })
                .collect();

            if cli.json {
                let profiles: Vec<_> = catalog.ids().into_iter().filter_map(|id| catalog.lookup(id)).collect();
                print_json(&profiles)?;
            } else {
                println!(
                    "{}",
                    format!("Exercise catalog (table {})", mapper.table().version).green().bold()
                );
                print_table(rows);
            }
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

fn load_history(engine: &SamcEngine, path: &Path) -> Result<Vec<TrainingSession>> {
    let entries: Vec<HistoryEntry> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("Invalid session history: {}", path.display()))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            HistoryEntry::Computed(session) => Ok(session),
            HistoryEntry::Raw {
                timestamp,
                sport_id,
                payload,
                intensity_modifier,
            } => engine
                .build_session(timestamp, &sport_id, &payload, intensity_modifier)
                .map_err(|err| anyhow::anyhow!("session {}: {}", index, err.user_message())),
        })
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn colored_acwr(status: AcwrStatus) -> ColoredString {
    match status {
        AcwrStatus::InRange => status.as_str().green(),
        AcwrStatus::Underexposed => status.as_str().blue(),
        AcwrStatus::Spike => status.as_str().yellow(),
        AcwrStatus::HighSpike => status.as_str().red().bold(),
        AcwrStatus::InsufficientHistory => status.as_str().dimmed(),
    }
}

fn colored_readiness(status: ReadinessStatus) -> ColoredString {
    match status {
        ReadinessStatus::Recovered => status.as_str().green(),
        ReadinessStatus::Partial => status.as_str().yellow(),
        ReadinessStatus::Fatigued => status.as_str().red().bold(),
        ReadinessStatus::NoData => status.as_str().dimmed(),
    }
}

fn colored_action(action: AdvisorAction) -> ColoredString {
    match action {
        AdvisorAction::Train => action.as_str().green().bold(),
        AdvisorAction::TrainReduced => action.as_str().yellow().bold(),
        AdvisorAction::LightSession => action.as_str().blue().bold(),
        AdvisorAction::Rest => action.as_str().red().bold(),
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_acwr(report: &AcwrReport) {
    println!("{}", format!("ACWR as of {}", report.as_of).blue().bold());
    let rows: Vec<AcwrRow> = report
        .domains
        .iter()
        .map(|(domain, acwr)| AcwrRow {
            domain: domain.name().to_string(),
            acute: format!("{:.0}", acwr.acute_load),
            chronic: format!("{:.0}", acwr.chronic_weekly_load),
            ratio: optional(acwr.ratio, 2),
            status: colored_acwr(acwr.status).to_string(),
        })
        .collect();
    print_table(rows);
    println!(
        "  Aggregate: {} (weighted ratio {}), structural: {}",
        colored_acwr(report.aggregate_status),
        optional(report.weighted_ratio, 2),
        report.structural_status.as_str()
    );
    println!("  {}", report.aggregate_status.description().dimmed());
    println!(
        "  {} sessions over {} training days",
        report.session_count, report.days_of_data
    );
    for note in &report.context_notes {
        println!("  {} {}", "•".dimmed(), note);
    }
}

fn print_readiness(report: &ReadinessReport) {
    println!("{}", format!("Readiness at {}", report.as_of).cyan().bold());
    let rows: Vec<ReadinessRow> = report
        .domains
        .iter()
        .map(|(domain, state)| ReadinessRow {
            domain: domain.name().to_string(),
            residual: format!("{:.0}", state.residual_fatigue),
            reference: format!("{:.0}", state.reference_load),
            readiness: optional(state.readiness, 2),
            status: colored_readiness(state.status).to_string(),
        })
        .collect();
    print_table(rows);
    println!(
        "  Overall: {} ({}: {})",
        optional(report.overall_readiness, 2),
        colored_readiness(report.overall_status),
        report.overall_status.description()
    );
    if let Some(domain) = report.bottleneck {
        println!("  Bottleneck: {}", domain.name().bold());
    }
    for note in &report.notes {
        println!("  {} {}", "•".dimmed(), note);
    }
}

fn print_advice(advice: &AdvisorRecommendation) {
    println!(
        "{} {} ({}, {:.0}% volume)",
        "Today:".bold(),
        colored_action(advice.action),
        advice.volume.label.as_str(),
        advice.volume.factor * 100.0
    );
    println!("  {}", advice.summary);
    let rows: Vec<GuidanceRow> = advice
        .domains
        .iter()
        .map(|(domain, guidance)| GuidanceRow {
            domain: domain.name().to_string(),
            can_load: if guidance.can_load {
                "yes".green().to_string()
            } else {
                "no".red().to_string()
            },
            guidance: guidance.guidance.clone(),
        })
        .collect();
    print_table(rows);
}

fn print_backtest(evaluations: &[DailyEvaluation]) {
    println!("{}", format!("Backtest over {} days", evaluations.len()).magenta().bold());
    let rows: Vec<BacktestRow> = evaluations
        .iter()
        .map(|evaluation| BacktestRow {
            date: evaluation.date.to_string(),
            acwr: colored_acwr(evaluation.acwr.aggregate_status).to_string(),
            readiness: colored_readiness(evaluation.readiness.overall_status).to_string(),
            action: colored_action(evaluation.advice.action).to_string(),
            volume: format!("{:.0}%", evaluation.advice.volume.factor * 100.0),
        })
        .collect();
    print_table(rows);
}
