//! Command-line argument definitions using clap.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, StorageBackend};
use crate::model::{AlbumId, OwnerId};

/// Near-duplicate photo detection CLI.
#[derive(Parser, Debug)]
#[command(
    name = "similar-media",
    version,
    about = "Find visually similar photos in gallery albums",
    long_about = "Hashes every image of an album with a perceptual hash, compares all pairs by\n\
                  Hamming distance and records the similar ones as a similarity group."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file.
    #[arg(short, long, global = true, default_value = "similar-media.toml")]
    pub config: PathBuf,

    /// SQLite database file.
    #[arg(long, global = true, env = "SIMILAR_MEDIA_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory holding one sub-directory per bucket (local backend).
    #[arg(long = "storage-root", global = true, env = "SIMILAR_MEDIA_STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// Base URL of an S3-like storage API (http backend).
    #[arg(long = "storage-url", global = true, env = "SIMILAR_MEDIA_STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Storage backend.
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect similar media in an album.
    Detect(DetectArgs),

    /// List past similarity groups of an owner.
    Groups(GroupsArgs),

    /// Print the perceptual hash of local image files.
    Hash {
        /// Image files to hash.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a configuration file with default values.
    InitConfig {
        /// Destination (defaults to --config).
        path: Option<PathBuf>,
    },
}

/// Arguments of `detect`.
#[derive(ClapArgs, Debug)]
pub struct DetectArgs {
    /// Owner identity performing the detection.
    #[arg(short, long)]
    pub owner: OwnerId,

    /// Album to scan.
    #[arg(short, long)]
    pub album: AlbumId,

    /// Hamming distance below which two images are similar.
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Number of files downloaded and hashed at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print the similar media as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `groups`.
#[derive(ClapArgs, Debug)]
pub struct GroupsArgs {
    /// Owner whose groups are listed.
    #[arg(short, long)]
    pub owner: OwnerId,

    /// Print the groups as JSON.
    #[arg(long)]
    pub json: bool,
}

/// CLI storage backend argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    /// Local directories.
    Local,
    /// S3-like HTTP API.
    Http,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => StorageBackend::Local,
            BackendArg::Http => StorageBackend::Http,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }

        if let Some(root) = &self.storage_root {
            config.storage.root = Some(root.clone());
        }

        // A URL alone implies the http backend
        if let Some(url) = &self.storage_url {
            config.storage.api_url = Some(url.clone());
            config.storage.backend = StorageBackend::Http;
        }

        if let Some(backend) = self.backend {
            config.storage.backend = backend.into();
        }

        if let Command::Detect(detect) = &self.command {
            if let Some(threshold) = detect.threshold {
                config.detection.threshold = threshold;
            }

            if let Some(concurrency) = detect.concurrency {
                config.detection.max_concurrent_downloads = concurrency;
            }
        }
    }
}
