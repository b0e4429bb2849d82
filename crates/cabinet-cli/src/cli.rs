use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cabinet",
    version,
    about = "Install, back up and run small script games",
    after_help = "\
Configuration file lookup order:
  1. --config <path>             (explicit flag)
  2. $CABINET_CONFIG             (environment variable)
  3. ./cabinet.yaml              (project)
  4. Platform user config dir + /cabinet/config.yaml (e.g. ~/.config)
  5. /etc/cabinet/config.yaml    (system)

Without a config file every setting takes its default; the store lives in ~/.cabinet."
)]
pub(crate) struct Cli {
    /// Path to configuration file (overrides CABINET_CONFIG and default search)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Store root for this invocation (overrides store.root)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List installed games
    List {
        /// Show author, generator and language details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Install a game or a collection from a directory, archive or URL
    Install {
        /// Directory, .zip/.tar/.tar.gz archive, or http(s) URL
        source: String,

        /// Install every game found instead of requiring exactly one
        #[arg(short, long)]
        collection: bool,

        /// Do not write a backup archive
        #[arg(long)]
        no_backup: bool,
    },

    /// Install every source named by a list file or found in a directory
    BatchInstall {
        /// A .txt/.list file of sources, or a directory
        path: PathBuf,

        /// Take archives from the directory instead of sub-directories
        #[arg(long)]
        archives: bool,

        /// Do not write backup archives
        #[arg(long)]
        no_backup: bool,
    },

    /// Remove an installed game
    Uninstall {
        /// Identifier, name, list position or unique part of a name
        unit: String,

        /// Keep the backup archive so the game can be restored later
        #[arg(long)]
        keep_backup: bool,

        /// Skip interactive confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Copy an installed game out of the store
    Export {
        /// Identifier, name, list position or unique part of a name
        unit: String,

        /// Destination file or directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export a plain directory instead of a .tar.gz archive
        #[arg(long)]
        dir: bool,
    },

    /// Export every installed game into a directory
    BatchExport {
        /// Destination directory (created if missing)
        dest: PathBuf,

        /// Export plain directories instead of .tar.gz archives
        #[arg(long)]
        dir: bool,
    },

    /// Bring backup archives in line with the installed games
    Sync,

    /// Reinstall a game from its backup archive
    Restore {
        /// Backup identifier, position in `cabinet backups`, or unique part
        unit: String,
    },

    /// List backup archives
    Backups,

    /// Run an installed game with its interpreter
    Play {
        /// Identifier, name, list position or unique part of a name
        unit: String,

        /// Arguments passed to the game
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Report which interpreters are available
    Check,

    /// Uninstall games whose manifests are identical, keeping the first
    Dedupe {
        /// Skip interactive confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a game.json for a directory of scripts
    Init {
        /// Directory holding the game's files
        dir: PathBuf,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Tool or model that generated the game
        #[arg(long)]
        generator: Option<String>,

        #[arg(long = "version", value_name = "VERSION")]
        game_version: Option<String>,

        /// Language tag (detected from file extensions when omitted)
        #[arg(long)]
        language: Option<String>,

        /// Entry file, relative to the directory
        #[arg(long)]
        main: Option<PathBuf>,
    },

    /// Show store paths and statistics
    Info,

    /// Generate a starter configuration file
    Config {
        /// Destination path (skips interactive prompt)
        #[arg(short, long)]
        dest: Option<String>,
    },
}
