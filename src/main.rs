// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Luotain - Subdomain Reconnaissance Engine
 * Standalone CLI: scan, update and version commands
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use luotain::ai::{AiEngine, AiSource};
use luotain::config::AppConfig;
use luotain::logging;
use luotain::orchestrator::Orchestrator;
use luotain::output::{Exporter, OutputFormat};
use luotain::sources::bruteforce::BruteforceSource;
use luotain::sources::crtsh::CrtShSource;
use luotain::sources::wayback::WaybackSource;
use luotain::storage::manager::StorageManager;
use luotain::storage::Differ;
use luotain::types::ScanMode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const BANNER: &str = r#"
 _                 _        _
| |_   _  ___ | |_ __ _(_)_ __
| | | | |/ _ \| __/ _` | | '_ \
| | |_| | (_) | || (_| | | | | |
|_|\__,_|\___/ \__\__,_|_|_| |_|

Subdomain Reconnaissance Engine"#;

/// Luotain - subdomain reconnaissance engine
#[derive(Parser)]
#[command(name = "luotain")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = VERSION)]
#[command(about = "Multi-source subdomain discovery with wildcard-aware validation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (default: $HOME/.luotain/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform subdomain reconnaissance on a target domain
    Scan {
        /// Target domain
        domain: String,

        /// Scan mode
        #[arg(long, value_enum)]
        mode: Option<ScanModeArg>,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormatArg,

        /// Enable AI-enhanced discovery
        #[arg(long)]
        ai: bool,

        /// Enable recursive enumeration
        #[arg(long)]
        recursive: bool,

        /// Number of concurrent workers (overrides config)
        #[arg(long)]
        threads: Option<usize>,

        /// Scan deadline in seconds (0 = no deadline)
        #[arg(long, default_value = "0")]
        timeout: u64,
    },

    /// Update wordlists, resolvers and data sources
    Update,

    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScanModeArg {
    Passive,
    Active,
    Aggressive,
    Stealth,
}

impl From<ScanModeArg> for ScanMode {
    fn from(arg: ScanModeArg) -> Self {
        match arg {
            ScanModeArg::Passive => ScanMode::Passive,
            ScanModeArg::Active => ScanMode::Active,
            ScanModeArg::Aggressive => ScanMode::Aggressive,
            ScanModeArg::Stealth => ScanMode::Stealth,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Json,
    Csv,
    Html,
    Nuclei,
    Txt,
    Burp,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Html => OutputFormat::Html,
            OutputFormatArg::Nuclei => OutputFormat::Nuclei,
            OutputFormatArg::Txt => OutputFormat::Txt,
            OutputFormatArg::Burp => OutputFormat::Burp,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config and logger failures are the only fatal startup conditions.
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.log_level, &config.log_file) {
        eprintln!("Error initializing logger: {e}");
        std::process::exit(1);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("luotain-worker")
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Scan {
            domain,
            mode,
            output,
            format,
            ai,
            recursive,
            threads,
            timeout,
        } => runtime.block_on(run_scan(
            config, domain, mode, output, format, ai, recursive, threads, timeout,
        )),
        Commands::Update => {
            run_update();
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    mut config: AppConfig,
    domain: String,
    mode: Option<ScanModeArg>,
    output: Option<PathBuf>,
    format: OutputFormatArg,
    ai: bool,
    recursive: bool,
    threads: Option<usize>,
    timeout: u64,
) -> Result<()> {
    if let Some(mode) = mode {
        config.scan_mode = mode.into();
    }
    if ai {
        config.ai.enabled = true;
    }
    if recursive {
        config.sources.active.recursive = true;
    }
    if let Some(threads) = threads {
        config.max_threads = threads;
        config.dns_workers = threads;
        config.http_workers = threads;
    }

    println!("{BANNER} v{VERSION}\n");
    println!("[*] Target: {domain}");
    println!("[*] Mode: {}", config.scan_mode);
    println!("[*] Environment: {}", detect_environment());
    println!();

    let storage = Arc::new(StorageManager::open(&config.storage)?);

    let mut orchestrator = Orchestrator::new(config.clone(), Arc::clone(&storage))?;
    register_sources(&mut orchestrator, &config)?;

    let outcome = if timeout > 0 {
        orchestrator
            .run_with_deadline(&domain, Duration::from_secs(timeout))
            .await?
    } else {
        orchestrator.run(&domain).await?
    };

    println!(
        "[+] Scan complete: {} subdomains ({} validated)",
        outcome.subdomains.len(),
        outcome
            .subdomains
            .iter()
            .filter(|s| s.validated)
            .count()
    );

    if let Some(diff) = &outcome.diff {
        println!();
        println!("{}", Differ::render_report(diff));
    } else {
        println!("[*] No previous scan available for comparison");
    }

    let format: OutputFormat = format.into();
    let output_path = match output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&config.output_dir)?;
            config
                .output_dir
                .join(format!("{domain}.{}", format.extension()))
        }
    };

    Exporter::new().export(&outcome.subdomains, format, &output_path)?;
    println!("[+] Results written to {}", output_path.display());

    Ok(())
}

fn register_sources(orchestrator: &mut Orchestrator, config: &AppConfig) -> Result<()> {
    if config.sources.passive.certificate_transparency {
        orchestrator.register_source(Arc::new(CrtShSource::new(true)?));
    }

    if config.sources.passive.wayback_machine {
        orchestrator.register_source(Arc::new(WaybackSource::new(true)?));
    }

    let active_mode = matches!(config.scan_mode, ScanMode::Active | ScanMode::Aggressive);
    if config.sources.active.dns_bruteforce || active_mode {
        let resolver = orchestrator.resolver();
        orchestrator.register_source(Arc::new(BruteforceSource::new(
            true,
            resolver,
            &config.sources.active.wordlists,
            config.dns_workers,
        )));
    }

    if config.ai.enabled {
        let engine = Arc::new(AiEngine::new(&config.ai)?);
        orchestrator.register_source(Arc::new(AiSource::new(engine, true)));
    }

    Ok(())
}

fn run_update() {
    info!("Updating resources");

    println!("[*] Updating wordlists...");
    println!("[*] Updating DNS resolvers...");
    println!("[*] Updating source configurations...");
    println!("[+] Update complete");

    info!("Update completed");
}

fn print_version() {
    println!("{BANNER} v{VERSION}\n");
    println!("Version:      {VERSION}");
    println!("OS/Arch:      {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    println!("Environment:  {}", detect_environment());
}

/// Report the host environment, with a nod to the usual offensive distro.
fn detect_environment() -> String {
    if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
        if content.contains("Kali") || content.contains("kali") {
            return "Kali Linux (Optimized)".to_string();
        }
    }

    format!("{} (Compatible)", std::env::consts::OS)
}
