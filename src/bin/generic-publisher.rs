//! Generic Publisher CLI
//!
//! Uploads build artifacts to a generic update server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use generic_publisher::{
    ConfigLoadOptions, ConfigLoader, GenericPublisher, HttpUploader, MakeResult, ProgressSink,
    PublishConfig, PublishOptions, Publisher, SecureTokenManager, plan,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Upload build artifacts to a generic update server
#[derive(Parser)]
#[command(name = "generic-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Upload build artifacts to a generic update server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish build artifacts
    Publish {
        /// Artifact as PLATFORM=PATH (repeatable, e.g. darwin=out/app.dmg)
        #[arg(
            short,
            long = "artifact",
            value_name = "PLATFORM=PATH",
            value_parser = parse_artifact
        )]
        artifacts: Vec<(String, PathBuf)>,

        /// YAML file with a list of {platform, artifacts} make results
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Project path holding .generic-publisher.yaml (defaults to current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Base url of the update server (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Authorization header value (overrides config)
        #[arg(long)]
        token: Option<String>,

        /// Only print what would be uploaded
        #[arg(long)]
        dry_run: bool,

        /// Print the publish report as JSON on stdout (human output goes to stderr)
        #[arg(long)]
        json: bool,
    },

    /// Check the publisher configuration
    Check {
        /// Project path (defaults to current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,
    },
}

fn parse_artifact(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((platform, path)) if !platform.is_empty() && !path.is_empty() => {
            Ok((platform.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected PLATFORM=PATH, got '{}'", value)),
    }
}

/// Where human-readable output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Console {
    Stdout,
    Stderr,
}

impl Console {
    /// Keeps stdout free for the JSON report
    fn for_output(json: bool) -> Self {
        if json { Self::Stderr } else { Self::Stdout }
    }

    fn line(self, line: &str) {
        match self {
            Self::Stdout => println!("{}", line),
            Self::Stderr => eprintln!("{}", line),
        }
    }
}

/// Prints per-file progress lines to the console
struct ConsoleProgress(Console);

impl ProgressSink for ConsoleProgress {
    fn progress(&self, line: &str) {
        self.0.line(&format!("   {}", line));
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            artifacts,
            manifest,
            project_path,
            base_url,
            token,
            dry_run,
            json,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            let make_results = collect_make_results(manifest, artifacts).await?;

            if dry_run {
                return dry_run_command(&make_results);
            }

            let cli_config = PublishConfig {
                extends: None,
                base_url,
                token,
            };
            publish_command(path, cli_config, make_results, json).await
        }
        Commands::Check { project_path } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            check_command(path).await
        }
    }
}

/// Manifest entries first, then one make result per `--artifact`
async fn collect_make_results(
    manifest: Option<PathBuf>,
    artifacts: Vec<(String, PathBuf)>,
) -> Result<Vec<MakeResult>> {
    let mut make_results = Vec::new();

    if let Some(manifest) = manifest {
        let content = tokio::fs::read_to_string(&manifest)
            .await
            .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
        let entries: Vec<MakeResult> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", manifest.display()))?;
        make_results.extend(entries);
    }

    make_results.extend(
        artifacts
            .into_iter()
            .map(|(platform, path)| MakeResult::new(platform, [path])),
    );

    Ok(make_results)
}

fn load_options(project_path: PathBuf, cli_args: Option<PublishConfig>) -> ConfigLoadOptions {
    ConfigLoadOptions {
        project_path,
        home_dir: std::env::var_os("HOME").map(PathBuf::from),
        cli_args,
        env: std::env::vars().collect(),
    }
}

fn dry_run_command(make_results: &[MakeResult]) -> Result<i32> {
    println!("\n🧪 Dry-run: nothing will be uploaded\n");

    let planned = plan(make_results);
    if planned.is_empty() {
        println!("No artifacts to publish");
        return Ok(0);
    }

    for group in &planned {
        println!("📦 {}:", group.os);
        for file in &group.files {
            println!("  - {}", file.display());
        }
        if !group.metadata_fragments.is_empty() {
            println!(
                "  - latest.yml (merged from {})",
                group
                    .metadata_fragments
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    println!();

    Ok(0)
}

async fn publish_command(
    project_path: PathBuf,
    cli_config: PublishConfig,
    make_results: Vec<MakeResult>,
    json: bool,
) -> Result<i32> {
    let console = Console::for_output(json);
    console.line("\n📦 generic-publisher\n");

    let config = ConfigLoader::load_resolved(load_options(project_path, Some(cli_config))).await?;
    let uploader = HttpUploader::new(config).with_progress(Arc::new(ConsoleProgress(console)));
    let publisher = GenericPublisher::new(uploader);

    let status = |line: &str| console.line(&format!("📤 {}", line));

    match publisher
        .publish(PublishOptions { make_results }, &status)
        .await
    {
        Ok(report) => {
            console.line(&format!(
                "\n✅ Published {} artifact(s) across {} OS group(s)",
                report.uploaded.len(),
                report.os_groups
            ));
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("\n❌ Publishing failed [{}]: {}", e.code(), e);
            for action in e.suggested_actions() {
                eprintln!("  💡 {}", action);
            }
            Ok(1)
        }
    }
}

async fn check_command(project_path: PathBuf) -> Result<i32> {
    println!("\n🔍 Configuration Check\n");

    let config = ConfigLoader::load(load_options(project_path, None)).await?;
    let result = ConfigLoader::validate(&config);

    println!("{}\n", ConfigLoader::format_validation_result(&result));

    if let Some(base_url) = &config.base_url {
        println!("  Base URL: {}", base_url);
    }
    if let Some(token) = &config.token {
        println!("  Token: {}", SecureTokenManager::new().mask_token(token));
    }
    println!();

    Ok(if result.valid { 0 } else { 1 })
}
