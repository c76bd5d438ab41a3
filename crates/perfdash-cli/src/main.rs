//! perfdash-cli: drive the inference dashboard API from a terminal.
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use perfdash_core::mock::ProxyConfigUpdate;
use perfdash_core::synth::{performance_csv, PageRequest};
use perfdash_core::{ApiClient, ApiClientBuilder, ClientSettings, PerfdashError, SimulationSettings};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "perfdash-cli")]
#[command(about = "Query and drive the inference performance dashboard API")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// API base URL (overrides PERFDASH_API_BASE)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides PERFDASH_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Answer matching requests from the built-in simulation
    #[arg(long, global = true)]
    mock: bool,

    /// JSON file with simulation overrides (delay range, series lengths)
    #[arg(long, global = true)]
    sim_config: Option<PathBuf>,

    /// Bearer token to send with every request
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and print the issued token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Proxy configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Traffic collection tasks
    #[command(subcommand)]
    Collect(CollectCommand),

    /// List every task that has captured files
    Files,

    /// Page through the per-request performance records of a task
    Performance {
        task_id: String,
        #[command(flatten)]
        page: PageOpts,
        /// Print the page as CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Page through the captured prompt/response pairs of a task
    Qa {
        task_id: String,
        #[command(flatten)]
        page: PageOpts,
    },

    /// File summary of a task
    Summary { task_id: String },

    /// Latency and throughput percentiles of a task
    Metrics { task_id: String },

    /// Histograms of a task
    Distributions { task_id: String },

    /// Benchmark tasks
    #[command(subcommand)]
    Benchmark(BenchmarkCommand),

    /// Compare a baseline task against an optimized one
    Compare {
        #[arg(long)]
        baseline: String,
        #[arg(long)]
        optimized: String,
    },

    /// Reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// List analysis engines
    Engines,

    /// Tuning suggestions for a task
    Suggestions { task_id: String },

    /// Check that the backend is reachable
    Health,
}

#[derive(Args)]
struct PageOpts {
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long, default_value_t = 20)]
    size: u64,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the current proxy configuration
    Get,
    /// Update the fields that are given and keep the rest
    Set {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        api_type: Option<String>,
        #[arg(long)]
        tokens_jsonpath: Option<String>,
    },
}

#[derive(Subcommand)]
enum CollectCommand {
    /// Start capturing traffic
    Start {
        /// Extra start parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Stop the running capture
    Stop {
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Current capture status
    Status,
    /// List collection tasks
    Tasks,
}

#[derive(Subcommand)]
enum BenchmarkCommand {
    /// Start a benchmark run
    Start {
        /// Benchmark parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Progress of a benchmark run
    Progress { task_id: String },
    /// List benchmark tasks
    Tasks,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Generate a report
    Generate {
        /// Report parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// List generated reports
    List,
    /// Print the download link of a report
    Url { report_id: String },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Flags over environment over defaults.
fn client_settings(opts: &GlobalOpts) -> ClientSettings {
    let mut settings = ClientSettings::from_env();
    if let Some(base) = &opts.base_url {
        settings.base_url = base.clone();
    }
    if let Some(secs) = opts.timeout {
        settings.timeout_secs = secs;
    }
    if opts.mock {
        settings.use_mock = true;
    }
    settings
}

async fn build_client(opts: &GlobalOpts) -> Result<ApiClient, PerfdashError> {
    let settings = client_settings(opts);
    let simulation = match &opts.sim_config {
        Some(path) => SimulationSettings::from_json_file(path).await?,
        None => SimulationSettings::default(),
    };
    debug!(
        base_url = %settings.base_url,
        use_mock = settings.use_mock,
        timeout_ms = settings.timeout().as_millis() as u64,
        "Building client"
    );

    let client = ApiClientBuilder::from_settings(&settings, simulation)?.build()?;
    if let Some(token) = &opts.token {
        client.tokens().set(token.clone());
    }
    Ok(client)
}

fn parse_params(raw: &str) -> Result<Value, PerfdashError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(PerfdashError::Validation(format!(
            "parameters must be a JSON object, got: {raw}"
        )));
    }
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PerfdashError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), PerfdashError> {
    let client = build_client(&cli.global).await?;

    match cli.command {
        Commands::Login { username, password } => {
            print_json(&client.login(&username, &password).await?)
        }

        Commands::Config(ConfigCommand::Get) => print_json(&client.get_proxy_config().await?),
        Commands::Config(ConfigCommand::Set {
            host,
            port,
            api_type,
            tokens_jsonpath,
        }) => {
            let update = ProxyConfigUpdate {
                target_host: host,
                target_port: port,
                api_type,
                custom_tokens_jsonpath: tokens_jsonpath,
                ..Default::default()
            };
            client.set_proxy_config(&update).await?;
            print_json(&client.get_proxy_config().await?)
        }

        Commands::Collect(cmd) => match cmd {
            CollectCommand::Start { params } => {
                print_json(&client.start_collect(parse_params(&params)?).await?)
            }
            CollectCommand::Stop { task_id } => {
                print_json(&client.stop_collect(task_id.as_deref()).await?)
            }
            CollectCommand::Status => print_json(&client.get_collect_status().await?),
            CollectCommand::Tasks => print_json(&client.list_collect_tasks().await?),
        },

        Commands::Files => print_json(&client.list_task_files().await?),
        Commands::Performance { task_id, page, csv } => {
            let page = client
                .get_performance_data(&task_id, PageRequest::new(page.page, page.size))
                .await?;
            if csv {
                print!("{}", performance_csv(&page.items)?);
                Ok(())
            } else {
                print_json(&page)
            }
        }
        Commands::Qa { task_id, page } => print_json(
            &client
                .get_qa_data(&task_id, PageRequest::new(page.page, page.size))
                .await?,
        ),
        Commands::Summary { task_id } => print_json(&client.get_summary(&task_id).await?),

        Commands::Metrics { task_id } => print_json(&client.get_metrics_summary(&task_id).await?),
        Commands::Distributions { task_id } => {
            print_json(&client.get_distributions(&task_id).await?)
        }

        Commands::Benchmark(cmd) => match cmd {
            BenchmarkCommand::Start { params } => {
                print_json(&client.start_benchmark(parse_params(&params)?).await?)
            }
            BenchmarkCommand::Progress { task_id } => {
                print_json(&client.get_benchmark_progress(&task_id).await?)
            }
            BenchmarkCommand::Tasks => print_json(&client.list_benchmark_tasks().await?),
        },

        Commands::Compare {
            baseline,
            optimized,
        } => print_json(&client.compare_tasks(&baseline, &optimized).await?),

        Commands::Report(cmd) => match cmd {
            ReportCommand::Generate { params } => {
                print_json(&client.generate_report(parse_params(&params)?).await?)
            }
            ReportCommand::List => print_json(&client.list_reports().await?),
            ReportCommand::Url { report_id } => {
                print_json(&json!({ "url": client.download_report_url(&report_id) }))
            }
        },

        Commands::Engines => print_json(&client.list_engines().await?),
        Commands::Suggestions { task_id } => print_json(&client.get_suggestions(&task_id).await?),
        Commands::Health => print_json(&client.health().await?),
    }
}
