//! MMLU-Pro Evaluation CLI

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mmlu_pro_eval::{
    config::Config,
    providers::create_provider,
    reporting::{analyze_results_dir, print_analysis, print_console_report},
    runner::{Dispatcher, DispatcherConfig, Orchestrator},
    store::ResultStore,
    tasks::load_split,
};

#[derive(Parser)]
#[command(name = "mmlu-pro-eval")]
#[command(about = "Evaluate a local chat-completion endpoint on MMLU-Pro")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the model on the selected subjects
    Run {
        /// Model name sent with every request
        #[arg(short, long)]
        model: String,

        /// Directory for result and summary files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Comma-separated subjects, or "all"
        #[arg(short, long, default_value = "all")]
        assigned_subjects: String,

        /// Questions per batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Maximum in-flight requests
        #[arg(short = 'c', long)]
        max_concurrent: Option<usize>,

        /// Endpoint base URL, e.g. http://127.0.0.1:3000/v1
        #[arg(long)]
        base_url: Option<String>,

        /// Directory holding test and validation splits
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Per-request deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Summarize existing result files
    Analyze {
        /// Results directory (scanned with its immediate subdirectories)
        #[arg(short, long, default_value = "eval_results")]
        input: PathBuf,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/eval.toml")]
        output: PathBuf,
    },
}

/// Command-line values that override the configuration file
struct RunOverrides {
    output_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    max_concurrent: Option<usize>,
    base_url: Option<String>,
    data_dir: Option<PathBuf>,
    timeout_ms: Option<u64>,
}

impl RunOverrides {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.output_dir {
            config.run.output_dir = dir.display().to_string();
        }
        if let Some(size) = self.batch_size {
            config.run.batch_size = size;
        }
        if let Some(limit) = self.max_concurrent {
            config.run.max_concurrent = limit;
        }
        if let Some(url) = self.base_url {
            config.endpoint.base_url = url;
        }
        if let Some(dir) = self.data_dir {
            config.run.data_dir = dir.display().to_string();
        }
        if let Some(ms) = self.timeout_ms {
            config.run.timeout_ms = ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("mmlu_pro_eval=debug,info")
    } else {
        EnvFilter::new("mmlu_pro_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Run {
            model,
            output_dir,
            assigned_subjects,
            batch_size,
            max_concurrent,
            base_url,
            data_dir,
            timeout_ms,
        } => {
            let mut config = match cli.config {
                Some(path) => Config::from_file(&path)?,
                None => Config::load_or_default(),
            };
            RunOverrides {
                output_dir,
                batch_size,
                max_concurrent,
                base_url,
                data_dir,
                timeout_ms,
            }
            .apply(&mut config);

            run_evaluation(config, &model, &assigned_subjects).await?;
        }

        Commands::Analyze { input } => {
            let stats = analyze_results_dir(&input)?;
            print_analysis(&stats);
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn parse_subjects(arg: &str) -> Vec<String> {
    if arg.trim() == "all" {
        return Vec::new();
    }
    arg.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn run_evaluation(
    config: Config,
    model: &str,
    assigned_subjects: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();

    println!("=== MMLU-Pro Evaluation ===");
    println!("Started:  {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Model:    {}", model);
    println!("Endpoint: {}", config.chat_completions_url());
    println!("Output:   {}", config.run.output_dir);
    println!(
        "Batches of {} with at most {} concurrent requests",
        config.run.batch_size, config.run.max_concurrent
    );
    println!();

    let provider = create_provider(&config, model)?;

    let test = load_split(&config.run.data_dir, "test")?;
    let validation = load_split(&config.run.data_dir, "validation")?;
    let subjects = parse_subjects(assigned_subjects);

    std::fs::create_dir_all(&config.run.output_dir)?;

    let dispatcher = Dispatcher::new(provider, DispatcherConfig::from(&config));
    let store = ResultStore::seeded(config.run.seed)
        .with_read_retry_delay(Duration::from_millis(config.run.read_retry_delay_ms));
    let mut orchestrator = Orchestrator::new(
        dispatcher,
        store,
        &config.run.output_dir,
        config.run.batch_size,
    );

    let outcomes = orchestrator.evaluate(&test, &validation, &subjects).await?;
    print_console_report(&outcomes);

    let elapsed = Utc::now() - started_at;
    println!("Finished in {}s", elapsed.num_seconds());
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
