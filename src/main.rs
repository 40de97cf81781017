use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tabled::{Table, Tabled};

use riskradar::cns::{TapSession, TAP_TEST_DURATION};
use riskradar::export::{csv as csv_export, json as json_export, ExportFormat};
use riskradar::logging::init_logging;
use riskradar::predictor::{HttpPredictor, RiskPredictor};
use riskradar::risk::risk_breakdown;
use riskradar::sensor::{FeedSummary, SensorFeed};
use riskradar::tracker::Submission;
use riskradar::trends::{all_trends, metric_trend};
use riskradar::{
    interpret, score_sleep, validate_named, AppConfig, AthleteProfile, AthleteType,
    CnsResult, RiskLevel, RiskRadarError, SqliteStore, Tracker,
};

/// RiskRadar - Athlete Injury Risk Tracker
///
/// Records daily wellness and training metrics, scores sleep and CNS
/// fatigue, and combines everything into a 0-100 injury risk score.
#[derive(Parser)]
#[command(name = "riskradar")]
#[command(author = "RiskRadar Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Athlete injury risk tracker", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a value against a metric's valid range
    Validate {
        /// Metric name (duration, rpe, restingHr, hrv, sleepHours, sleepQuality, acwr, daysSinceInjury, riskFactor)
        field: String,

        /// Value to check
        value: String,
    },

    /// Score a night of sleep without recording it
    Sleep {
        /// Hours slept
        #[arg(long)]
        hours: f64,

        /// Sleep quality from 0 to 1
        #[arg(short, long)]
        quality: f64,
    },

    /// Record a completed CNS tap test from its tap count
    Cns {
        /// Taps counted in 10 seconds
        #[arg(short, long)]
        taps: u32,
    },

    /// Run an interactive 10-second tap test (press Enter to tap)
    TapTest,

    /// Record a training session
    Training {
        /// Session duration in minutes
        #[arg(short, long)]
        duration: f64,

        /// Rate of perceived exertion (1-10)
        #[arg(short, long)]
        rpe: f64,
    },

    /// Record morning resting heart rate and HRV
    Recovery {
        /// Resting heart rate in bpm
        #[arg(long)]
        resting_hr: f64,

        /// Heart rate variability in ms
        #[arg(long)]
        hrv: f64,
    },

    /// Record last night's sleep
    SleepLog {
        /// Hours slept
        #[arg(long)]
        hours: f64,

        /// Sleep quality from 0 to 1
        #[arg(short, long)]
        quality: f64,
    },

    /// Record the acute:chronic workload ratio
    Acwr {
        /// ACWR value
        value: f64,
    },

    /// Record injury history
    Injury {
        /// Athlete has a past injury
        #[arg(short, long)]
        past_injury: bool,

        /// Days since the last injury
        #[arg(short, long, default_value = "0")]
        days: f64,
    },

    /// Get advice for a manually assessed risk factor (0-100)
    RiskFactor {
        value: f64,
    },

    /// Show the current snapshot and overall risk
    Status,

    /// Show recorded history
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Write the full history to a file (csv or json by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show trend statistics per metric
    Trend {
        /// Only this metric
        metric: Option<String>,
    },

    /// Show or update the athlete profile
    Profile {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        age: Option<u8>,

        /// runner, cyclist, swimmer, triathlete, team_sport, strength, other
        #[arg(short = 't', long)]
        athlete_type: Option<AthleteType>,
    },

    /// Export the current snapshot and optionally request a prediction
    Export {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Send the export to the prediction service
        #[arg(short, long)]
        submit: bool,
    },

    /// Classify serial sensor output for DANGER alerts
    Monitor {
        /// Read from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Clear snapshot, history and profile
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std Dev")]
    std_dev: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Z")]
    z_score: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(Some(&config_path));
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Validate { field, value } => {
            let number = value.trim().parse::<f64>().unwrap_or(f64::NAN);
            let result = validate_named(&field, number);
            if result.is_valid {
                println!("{} {} = {}", "✓".green(), field, value);
            } else {
                println!(
                    "{} {}",
                    "✗".red(),
                    result.message.unwrap_or_default().yellow()
                );
            }
        }

        Commands::Sleep { hours, quality } => {
            for (field, value) in [("sleepHours", hours), ("sleepQuality", quality)] {
                if let Some(message) = validate_named(field, value).message {
                    println!("{} {}", "✗".red(), message.yellow());
                    return Ok(());
                }
            }
            println!("Sleep score: {}", score_sleep(hours, quality).to_string().bold());
        }

        Commands::Cns { taps } => {
            let mut tracker = open_tracker(&config)?;
            let result = tracker.record_cns(taps)?;
            print_cns(taps, &result);
        }

        Commands::TapTest => {
            let taps = run_tap_test()?;
            let mut tracker = open_tracker(&config)?;
            let result = tracker.record_cns(taps)?;
            print_cns(taps, &result);
        }

        Commands::Training { duration, rpe } => {
            let mut tracker = open_tracker(&config)?;
            report_submission("Training session", tracker.submit_training(duration, rpe))?;
        }

        Commands::Recovery { resting_hr, hrv } => {
            let mut tracker = open_tracker(&config)?;
            report_submission("Recovery metrics", tracker.submit_recovery(resting_hr, hrv))?;
        }

        Commands::SleepLog { hours, quality } => {
            let mut tracker = open_tracker(&config)?;
            report_submission("Sleep", tracker.submit_sleep(hours, quality))?;
        }

        Commands::Acwr { value } => {
            let mut tracker = open_tracker(&config)?;
            report_submission("ACWR", tracker.submit_acwr(value))?;
        }

        Commands::Injury { past_injury, days } => {
            let mut tracker = open_tracker(&config)?;
            report_submission("Injury history", tracker.submit_injury(past_injury, days))?;
        }

        Commands::RiskFactor { value } => {
            let mut tracker = open_tracker(&config)?;
            match tracker.analyze_risk_factor(value) {
                Ok(advice) => println!("{}", advice),
                Err(e @ RiskRadarError::Validation { .. }) => {
                    e.log("Risk factor rejected");
                    println!("{} {}", "✗".red(), e.user_message().yellow())
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Status => {
            let tracker = open_tracker(&config)?;
            print_status(&tracker);
        }

        Commands::History { limit, output } => {
            let tracker = open_tracker(&config)?;
            let history = tracker.history();

            if let Some(path) = output {
                let format = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("csv");
                match ExportFormat::from_str(format)? {
                    ExportFormat::Csv => csv_export::export_history(&history, &path)?,
                    ExportFormat::Json => json_export::export_json(&history, &path)?,
                }
                println!(
                    "{} {} entries written to {}",
                    "✓".green(),
                    history.len(),
                    path.display()
                );
                return Ok(());
            }

            if history.is_empty() {
                println!("{}", "No history recorded yet".dimmed());
                return Ok(());
            }

            let rows: Vec<HistoryRow> = history
                .entries()
                .iter()
                .take(limit)
                .map(|e| HistoryRow {
                    time: e
                        .timestamp
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                    category: e.category.to_string(),
                    metric: e.metric.clone(),
                    value: format!("{}", e.value),
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::Trend { metric } => {
            let tracker = open_tracker(&config)?;
            let history = tracker.history();
            let trends = match metric {
                Some(name) => metric_trend(&history, &name).into_iter().collect(),
                None => all_trends(&history),
            };

            if trends.is_empty() {
                println!("{}", "No matching history".dimmed());
                return Ok(());
            }

            let rows: Vec<TrendRow> = trends
                .into_iter()
                .map(|t| TrendRow {
                    metric: t.metric,
                    count: t.count,
                    mean: format!("{:.1}", t.mean),
                    std_dev: format!("{:.1}", t.std_dev),
                    latest: format!("{}", t.latest),
                    z_score: format!("{:+.2}", t.z_score),
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::Profile {
            name,
            age,
            athlete_type,
        } => {
            let mut tracker = open_tracker(&config)?;
            let current = tracker.profile();

            if name.is_none() && age.is_none() && athlete_type.is_none() {
                match current {
                    Some(p) => println!("{} ({}), {}", p.name.bold(), p.age, p.athlete_type),
                    None => println!("{}", "No profile saved".dimmed()),
                }
                return Ok(());
            }

            let profile = AthleteProfile {
                name: name
                    .or_else(|| current.as_ref().map(|p| p.name.clone()))
                    .context("A name is required for a new profile")?,
                age: age
                    .or_else(|| current.as_ref().map(|p| p.age))
                    .context("An age is required for a new profile")?,
                athlete_type: athlete_type
                    .or_else(|| current.as_ref().map(|p| p.athlete_type))
                    .unwrap_or(AthleteType::Other),
            };
            tracker.set_profile(&profile)?;
            println!("{} Profile saved", "✓".green());
        }

        Commands::Export { output, submit } => {
            let tracker = open_tracker(&config)?;
            let today = Local::now().date_naive();
            let record = tracker.export(config.athlete_id, today);

            let path = output.unwrap_or_else(|| {
                config
                    .data_dir
                    .join("exports")
                    .join(format!("riskradar_export_{}.json", today.format("%Y-%m-%d")))
            });
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            json_export::export_record(&record, &path)?;
            println!("{} Export written to {}", "✓".green(), path.display());

            if submit {
                submit_export(&config, &record);
            }
        }

        Commands::Monitor { input } => {
            let reader: Box<dyn BufRead> = match &input {
                Some(path) => Box::new(BufReader::new(
                    fs::File::open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                )),
                None => Box::new(BufReader::new(io::stdin())),
            };

            let mut summary = FeedSummary::default();
            for reading in SensorFeed::new(reader) {
                let reading = reading?;
                summary.record(&reading);
                if reading.alert {
                    println!("{} {}", "⚠ DANGER".red().bold(), reading.line);
                } else {
                    println!("  {}", reading.line.dimmed());
                }
            }
            println!(
                "{} readings, {} alerts",
                summary.readings,
                summary.alerts.to_string().red()
            );
        }

        Commands::Reset { yes } => {
            if !yes {
                println!(
                    "{}",
                    "This deletes the snapshot, history and profile. Re-run with --yes to confirm."
                        .yellow()
                );
                return Ok(());
            }
            let mut tracker = open_tracker(&config)?;
            tracker.reset()?;
            println!("{} All data cleared", "✓".green());
        }

        Commands::Config { list, set, get } => {
            if list {
                for (key, value) in config.entries() {
                    println!("{} = {}", key.bold(), value);
                }
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value")?;
                let mut stored = AppConfig::load_or_default(Some(&config_path));
                stored.set(key.trim(), value.trim())?;
                stored.save_to_file(&config_path)?;
                println!("{} {} = {}", "✓".green(), key.trim(), value.trim());
            } else if let Some(key) = get {
                println!("{}", config.get(&key)?);
            }
        }
    }

    Ok(())
}

fn open_tracker(config: &AppConfig) -> Result<Tracker<SqliteStore>> {
    let store = SqliteStore::open(config.database_path())
        .with_context(|| format!("Failed to open {}", config.database_path().display()))?;
    Ok(Tracker::new(store, config.history_capacity))
}

fn report_submission(label: &str, result: riskradar::Result<Submission>) -> Result<()> {
    match result {
        Ok(submission) => {
            println!("{} {} recorded", "✓".green(), label);
            match submission.overall_risk {
                Some(risk) => print_risk(risk),
                None => println!(
                    "  Overall risk: {} (missing: {})",
                    "pending".dimmed(),
                    submission.snapshot.missing_fields().join(", ")
                ),
            }
            Ok(())
        }
        Err(e @ RiskRadarError::Validation { .. }) => {
            e.log("Submission rejected");
            println!("{} {}", "✗".red(), e.user_message().yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_risk(risk: u8) {
    let reading = interpret(risk);
    let text = format!("{} ({})", risk, reading.label);
    let colored_text = match reading.level {
        RiskLevel::Low => text.green(),
        RiskLevel::Moderate => text.yellow(),
        RiskLevel::High => text.red(),
    };
    println!("  Overall risk: {}", colored_text.bold());
}

fn print_cns(taps: u32, result: &CnsResult) {
    println!("Taps: {}", taps);
    println!("CNS score: {}/10", result.score.to_string().bold());
    println!("{} ({} fatigue)", result.interpretation, result.fatigue_level);
}

fn print_status<S: riskradar::KeyValueStore>(tracker: &Tracker<S>) {
    let status = tracker.status();
    let s = status.snapshot;
    let show = |v: Option<f64>| v.map_or_else(|| "-".dimmed().to_string(), |v| v.to_string());

    println!("{}", "Current snapshot".bold());
    println!("  Daily load:        {}", show(s.daily_load));
    println!("  Resting HR:        {}", show(s.resting_hr));
    println!("  HRV:               {}", show(s.hrv));
    println!("  Sleep score:       {}", show(s.sleep_score));
    println!("  ACWR:              {}", show(s.acwr));
    println!(
        "  Past injury:       {}",
        s.past_injury
            .map_or_else(|| "-".dimmed().to_string(), |p| if p { "yes" } else { "no" }.to_string())
    );
    println!("  Days since injury: {}", show(s.days_since_injury));

    match (status.overall_risk, s.complete()) {
        (Some(risk), Some(complete)) => {
            print_risk(risk);
            let b = risk_breakdown(&complete);
            println!(
                "  Factors: load {:.0}, hr {:.0}, hrv {:.0}, sleep {:.0}, acwr {:.0}, injury {:.0}, recency {:.0}",
                b.load, b.resting_hr, b.hrv, b.sleep, b.acwr, b.injury, b.recency
            );
        }
        _ => println!(
            "  Overall risk: {} (missing: {})",
            "pending".dimmed(),
            status.missing_fields.join(", ")
        ),
    }

    if let Some(profile) = tracker.profile() {
        println!("  Athlete: {} ({}, {})", profile.name, profile.age, profile.athlete_type);
    }
}

fn run_tap_test() -> Result<u32> {
    println!(
        "{}",
        "Press Enter as fast as you can for 10 seconds. Go!".cyan().bold()
    );

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(Instant::now()).is_err() {
                break;
            }
        }
    });

    let window_ms = TAP_TEST_DURATION.as_millis() as u64;
    let pb = ProgressBar::new(window_ms);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let mut session = TapSession::start();
    loop {
        let remaining = session.remaining(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining.min(Duration::from_millis(100))) {
            Ok(at) => {
                session.record_tap(at);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        let remaining = session.remaining(Instant::now());
        pb.set_position(window_ms.saturating_sub(remaining.as_millis() as u64));
        pb.set_message(format!("{} taps", session.taps()));
    }
    pb.finish_and_clear();

    Ok(session.taps())
}

fn submit_export(config: &AppConfig, record: &riskradar::ExportRecord) {
    let outcome = HttpPredictor::from_settings(&config.predictor).map_err(RiskRadarError::from);
    let outcome = outcome.and_then(|predictor| {
        println!("Requesting prediction from {}", predictor.endpoint());
        let runtime = tokio::runtime::Runtime::new()?;
        runtime
            .block_on(predictor.predict(record))
            .map_err(RiskRadarError::from)
    });

    match outcome {
        Ok(prediction) => {
            println!(
                "Predicted 7-day risk: {} (confidence {:.0}%)",
                prediction.next_7_days_predicted_risk.bold(),
                prediction.confidence * 100.0
            );
        }
        Err(e) => {
            e.log("Remote prediction failed");
            println!("{} {}", "!".yellow(), e.user_message().yellow());
            if e.is_retryable() {
                println!("  The service may be temporarily unreachable; try `export --submit` again later.");
            }
        }
    }
}
