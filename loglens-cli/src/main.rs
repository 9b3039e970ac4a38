use clap::{Parser, Subcommand};
use colored::Colorize;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use loglens::{
    scan_file, scan_files, total_input_bytes, FilterCriteria, ProgressSink, ScanConfig,
    ScanSummary,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "loglens-cli", author, version, about = "View and filter log files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct FilterArgs {
    /// Path to a single log file
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Comma-separated list of log file paths, read concurrently
    #[arg(long, value_delimiter = ',')]
    files: Vec<PathBuf>,

    /// Directory whose files are all read concurrently
    #[arg(short = 'd', long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Comma-separated keywords a line must contain
    #[arg(short = 'k', long = "keywords", value_delimiter = ',')]
    keywords: Vec<String>,

    /// Comma-separated keywords that drop a line
    #[arg(short = 'x', long = "exclude-keywords", value_delimiter = ',')]
    exclude_keywords: Vec<String>,

    /// Regex pattern surviving lines must match
    #[arg(short = 'r', long)]
    regex: Option<String>,

    /// Start of time window (format: YYYY-MM-DD HH:MM:SS)
    #[arg(short = 's', long)]
    start: Option<String>,

    /// End of time window (format: YYYY-MM-DD HH:MM:SS)
    #[arg(short = 'e', long)]
    end: Option<String>,

    /// Comma-separated log levels (e.g. ERROR,WARNING,INFO)
    #[arg(short = 'l', long, value_delimiter = ',')]
    levels: Vec<String>,

    /// Wrap each output line as {"log": "..."}
    #[arg(short = 'j', long)]
    json: bool,

    /// Write filtered lines to this file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    output_file: Option<PathBuf>,

    /// Number of files read concurrently (default: CPU count)
    #[arg(short = 'c', long)]
    concurrency: Option<NonZeroUsize>,

    /// Path to a YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Parser)]
struct GenerateArgs {
    /// Number of log files to generate
    #[arg(long, default_value = "5")]
    files: usize,

    /// Number of lines per log file
    #[arg(long, default_value = "100")]
    lines: usize,

    /// Directory to generate into (a timestamped subdirectory is created)
    #[arg(long, default_value = "generated_logs")]
    out: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter log files by keyword, level, time window and regex
    Filter(Box<FilterArgs>),

    /// Generate synthetic log files for testing
    Generate(GenerateArgs),
}

/// Drives an indicatif bar from the readers' byte counts
struct BarSink(ProgressBar);

impl ProgressSink for BarSink {
    fn add_bytes(&self, n: u64) {
        self.0.inc(n);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter(args) => run_filter(*args),
        Commands::Generate(args) => run_generate(&args),
    }
}

fn run_filter(args: FilterArgs) -> anyhow::Result<()> {
    let cli_config = ScanConfig {
        include_keywords: args.keywords.clone(),
        exclude_keywords: args.exclude_keywords.clone(),
        levels: args.levels.clone(),
        pattern: args.regex.clone(),
        start_time: args.start.clone(),
        end_time: args.end.clone(),
        concurrency: args.concurrency,
        log_level: "warn".to_string(),
    };

    let config = ScanConfig::load_from(args.config.as_deref())?.merge_with_cli(cli_config);

    // RUST_LOG takes precedence over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Configuration errors (bad regex, bad timestamps) are fatal before
    // any file is opened
    let criteria = FilterCriteria::build(&config)?;

    let started = Instant::now();
    let mut writer: BufWriter<Box<dyn Write>> = BufWriter::new(match &args.output_file {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    });

    let json = args.json;
    let mut write_error: Option<io::Error> = None;
    let mut emit = |line: &str, writer: &mut dyn Write| {
        if write_error.is_some() {
            return;
        }
        let result = if json {
            writeln!(writer, "{}", serde_json::json!({ "log": line }))
        } else {
            writeln!(writer, "{}", line)
        };
        if let Err(e) = result {
            write_error = Some(e);
        }
    };

    let summary = if let Some(file) = &args.file {
        let bar = progress_bar(&args, std::slice::from_ref(file));
        let result = scan_file(file, &criteria, sink_ref(&bar), |line| {
            emit(line, &mut writer)
        });
        finish(bar);
        result?
    } else {
        let paths = if let Some(dir) = &args.log_dir {
            collect_log_files(dir)?
        } else {
            args.files.clone()
        };
        if paths.is_empty() {
            anyhow::bail!(
                "Please provide a log file path using --file, a log directory using --log-dir, \
                 or a comma-separated list of files using --files"
            );
        }
        let bar = progress_bar(&args, &paths);
        let result = scan_files(&paths, &criteria, config.concurrency(), sink_ref(&bar), |line| {
            emit(line, &mut writer)
        });
        finish(bar);
        result?
    };

    writer.flush()?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    report(&summary, started);
    Ok(())
}

fn sink_ref(bar: &Option<BarSink>) -> Option<&dyn ProgressSink> {
    bar.as_ref().map(|b| b as &dyn ProgressSink)
}

fn progress_bar(args: &FilterArgs, paths: &[PathBuf]) -> Option<BarSink> {
    if args.no_progress {
        return None;
    }
    let bar = ProgressBar::new(total_input_bytes(paths));
    bar.set_style(
        ProgressStyle::with_template("[{bar:20}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .expect("progress template is valid")
            .progress_chars("#-"),
    );
    Some(BarSink(bar))
}

fn finish(bar: Option<BarSink>) {
    if let Some(BarSink(bar)) = bar {
        bar.finish_and_clear();
    }
}

/// Walks a log directory and returns every file in it, in path order
fn collect_log_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    tracing::debug!("Found {} files under {}", paths.len(), dir.display());
    Ok(paths)
}

fn report(summary: &ScanSummary, started: Instant) {
    for failure in &summary.failures {
        eprintln!(
            "{} {}: {}",
            "Skipped".yellow().bold(),
            failure.path.display(),
            failure.error
        );
    }

    let elapsed = std::time::Duration::from_millis(started.elapsed().as_millis() as u64);
    eprintln!(
        "Matched {} of {} lines ({} read) in {}",
        summary.lines_matched.to_string().green(),
        summary.lines_scanned,
        indicatif::HumanBytes(summary.bytes_read),
        humantime::format_duration(elapsed)
    );
}

const LEVELS: [&str; 4] = ["INFO", "WARNING", "ERROR", "DEBUG"];

const MESSAGES: [&str; 10] = [
    "System started",
    "User logged in",
    "File not found",
    "Connection lost",
    "Transaction completed",
    "Memory usage high",
    "Disk almost full",
    "New user registered",
    "Backup completed",
    "Permission denied",
];

const FILLER: [&str; 20] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "veniam", "quis",
    "nostrud", "exercitation",
];

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let out_dir = args
        .out
        .join(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
    std::fs::create_dir_all(&out_dir)?;

    for i in 0..args.files {
        let path = out_dir.join(format!("logfile_{}.log", i + 1));
        let mut file = BufWriter::new(File::create(&path)?);
        for _ in 0..args.lines {
            writeln!(file, "{}", generate_log_entry())?;
        }
        file.flush()?;
    }

    println!("Logs generated in directory: {}", out_dir.display());
    Ok(())
}

fn generate_log_entry() -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let level = LEVELS[fastrand::usize(..LEVELS.len())];
    let message = MESSAGES[fastrand::usize(..MESSAGES.len())];

    let base = format!("{} [{}] {}", timestamp, level, message);

    // Pad each line to roughly 250-350 bytes with filler words
    let target = fastrand::usize(250..350);
    let mut entry = base;
    while entry.len() < target {
        entry.push(' ');
        entry.push_str(FILLER[fastrand::usize(..FILLER.len())]);
    }
    entry
}
