//! Similar Media - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use similar_media::{
    cli::{Args, Command, DetectArgs, GroupsArgs},
    config::{validate_config, Config},
    error::{exit_codes, Result},
    output::{
        media_to_json, print_config_summary, print_detection_report, print_error,
        print_groups, print_info, print_success, print_warning, scan_spinner,
    },
    similarity::{hash_to_hex, ImageHasher, PerceptualHasher, SimilarityDetector},
    storage,
    store::SqliteStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    match &args.command {
        Command::InitConfig { path } => init_config(path.as_deref().unwrap_or(&args.config)),
        Command::Hash { files } => {
            hash_files(files);
            Ok(())
        }
        Command::Detect(detect) => {
            let config = load_config(&args)?;
            validate_config(&config)?;
            detect_similar(&config, detect).await
        }
        Command::Groups(groups) => {
            let config = load_config(&args)?;
            list_groups(&config, groups).await
        }
    }
}

/// Load the config file (or defaults) and apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    args.merge_into_config(&mut config);
    Ok(config)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        print_warning(&format!("Overwriting {}", path.display()));
    }
    Config::default().save(path)?;
    print_success(&format!("Configuration written to {}", path.display()));
    Ok(())
}

fn hash_files(files: &[PathBuf]) {
    let hasher = PerceptualHasher::new();
    for file in files {
        match hasher.hash_file(file) {
            Ok(hash) => println!("{}  {}", hash_to_hex(hash), file.display()),
            Err(e) => print_warning(&format!("{}", e)),
        }
    }
}

async fn detect_similar(config: &Config, detect: &DetectArgs) -> Result<()> {
    if !detect.json {
        print_config_summary(
            &config.storage.backend.to_string(),
            &storage::describe(config),
            &config.database.path.display().to_string(),
            config.detection.threshold,
        );
    }

    let store = Arc::new(SqliteStore::open(&config.database.path).await?);
    let detector = SimilarityDetector::new(
        store.clone(),
        store.clone(),
        storage::from_config(config)?,
        store,
        Arc::new(PerceptualHasher::new()),
        config.detection.options(),
    );

    // Ctrl-C cancels the run; temporary files are still removed
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let spinner = (!detect.json).then(|| scan_spinner(detect.album));
    let result = detector.run(detect.owner, detect.album, &cancel).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    if detect.json {
        println!("{}", media_to_json(&report.media)?);
    } else {
        print_detection_report(&report);
    }

    Ok(())
}

async fn list_groups(config: &Config, groups: &GroupsArgs) -> Result<()> {
    let store = SqliteStore::open(&config.database.path).await?;
    let summaries = store.list_groups(groups.owner).await?;

    if groups.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_groups(&summaries);
    }

    Ok(())
}
