// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use pii_scrub::utils::logging::{format_error, format_info, format_success, format_warning};
use pii_scrub::{
    Config, HttpOracle, InvocationResult, InvocationStatus, LocalObjectStore,
    PipelineOrchestrator, ProcessingStatus, RedactionClient, StorageEvent, Throttle,
    TriggerAdapter,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pii_scrub")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Redacts PII from CSV objects as they land in storage", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Wall-clock budget for the whole invocation
    #[arg(long, global = true, value_name = "SECS")]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a storage notification envelope (`-` reads stdin)
    Handle {
        #[arg(short, long, value_name = "PATH")]
        event: String,
    },

    /// Redact a single object as if a creation notification arrived for it
    Redact {
        #[arg(short, long)]
        bucket: String,

        #[arg(short, long)]
        key: String,
    },

    /// Validate configuration and print the effective settings
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pii_scrub::utils::logging::init_logger(cli.color, cli.verbose);

    info!("PII scrub pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let mut config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using built-in defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    if let Some(secs) = cli.deadline_secs {
        config.pipeline.invocation_timeout_secs = Some(secs);
    }
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Handle { event } => {
            let event = read_event(&event).await?;
            cmd_handle(&config, &event).await?;
        }
        Commands::Redact { bucket, key } => {
            let event = StorageEvent::synthetic(&bucket, &key);
            cmd_handle(&config, &event).await?;
        }
        Commands::Verify => {
            cmd_verify(&config)?;
        }
    }

    Ok(())
}

async fn read_event(source: &str) -> Result<StorageEvent> {
    let text = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read event from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read event file {}", source))?
    };

    StorageEvent::from_json(&text).context("Failed to parse storage notification")
}

fn build_adapter(config: &Config) -> Result<TriggerAdapter> {
    let store = Arc::new(LocalObjectStore::new(config.storage.root.clone()));
    let oracle = Arc::new(
        HttpOracle::new(&config.oracle).context("Failed to create redaction oracle client")?,
    );
    let throttle = Arc::new(Throttle::from_config(&config.throttle));
    let client = RedactionClient::from_config(config, oracle, throttle);
    let orchestrator = PipelineOrchestrator::new(config, store, client);

    Ok(TriggerAdapter::from_config(config, orchestrator))
}

async fn cmd_handle(config: &Config, event: &StorageEvent) -> Result<()> {
    info!("Handling notification with {} records", event.len());

    let adapter = build_adapter(config)?;
    let result = adapter.handle(event).await;

    print_summary(&result);

    let json =
        serde_json::to_string_pretty(&result).context("Failed to serialize invocation result")?;
    println!("{}", json);

    Ok(())
}

fn print_summary(result: &InvocationResult) {
    for item in &result.results {
        let line = format!("{}/{}", item.bucket, item.key);
        let rendered = match item.status {
            ProcessingStatus::Success => format_success(&format!(
                "{} -> {} ({} rows, {} batches)",
                line,
                item.destination_key.as_deref().unwrap_or("-"),
                item.rows,
                item.batches
            )),
            ProcessingStatus::Skipped => format_info(&format!(
                "{} skipped: {}",
                line,
                item.reason.as_deref().unwrap_or("-")
            )),
            ProcessingStatus::Failed => format_error(&format!(
                "{} failed: {}",
                line,
                item.reason.as_deref().unwrap_or("-")
            )),
        };
        eprintln!("{}", rendered);
    }

    let status = match result.status {
        InvocationStatus::Success => format_success("success"),
        InvocationStatus::PartialFailure => format_warning("partial failure"),
        InvocationStatus::Failure => format_error("failure"),
    };
    eprintln!(
        "{} {} ({} oracle calls, {:.1}% success)",
        "Invocation".bold(),
        status,
        result.stats.oracle_calls,
        result.stats.success_rate()
    );
}

fn cmd_verify(config: &Config) -> Result<()> {
    info!("Verifying configuration");

    let pipeline = &config.pipeline;
    let oracle = &config.oracle;

    eprintln!("{}", "Pipeline".bold());
    eprintln!("  batch_size:          {}", pipeline.batch_size);
    eprintln!("  has_header:          {}", pipeline.has_header);
    eprintln!("  allow_ragged_rows:   {}", pipeline.allow_ragged_rows);
    eprintln!("  csv_suffix:          {}", pipeline.csv_suffix);
    eprintln!("  input_prefix:        {}", pipeline.input_prefix);
    eprintln!("  output_prefix:       {}", pipeline.output_prefix);
    eprintln!("  unprefixed_keys:     {:?}", pipeline.unprefixed_keys);
    eprintln!("  parallel_documents:  {}", pipeline.parallel_documents);
    eprintln!("  max_object_size_mb:  {}", pipeline.max_object_size_mb);
    eprintln!(
        "  invocation_timeout:  {}",
        pipeline
            .invocation_timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );

    eprintln!("{}", "Oracle".bold());
    eprintln!("  endpoint:            {}", oracle.resolved_endpoint());
    eprintln!("  model:               {}", oracle.model);
    eprintln!("  max_tokens:          {}", oracle.max_tokens);
    eprintln!("  timeout:             {}s", oracle.timeout_secs);
    eprintln!(
        "  api_key:             {}",
        if oracle.api_key.is_some() { "set" } else { "missing" }
    );

    eprintln!("{}", "Throttle / retry".bold());
    eprintln!(
        "  inter_call_delay:    {}ms",
        config.throttle.inter_call_delay_ms
    );
    eprintln!("  max_retries:         {}", config.retry.max_retries);
    eprintln!(
        "  backoff:             {}ms .. {}ms",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );

    eprintln!("{}", "Storage".bold());
    eprintln!("  root:                {}", config.storage.root.display());

    if oracle.api_key.is_none() {
        eprintln!(
            "{}",
            format_warning("No oracle API key configured (set PII_SCRUB__ORACLE__API_KEY)")
        );
    }
    if !config.storage.root.exists() {
        eprintln!(
            "{}",
            format_warning(&format!(
                "Storage root {} does not exist yet",
                config.storage.root.display()
            ))
        );
    }

    eprintln!("{}", format_success("Configuration is valid"));
    Ok(())
}
