use std::path::PathBuf;

use cabinet_core::config::CabinetConfig;
use cabinet_core::runtime::RuntimeTable;
use cabinet_core::store::Store;

use crate::cli::Commands;
use crate::cmd;

/// Settings shared by every command of one invocation.
pub(crate) struct Context {
    pub config: CabinetConfig,
    root_override: Option<PathBuf>,
}

impl Context {
    pub(crate) fn new(config: CabinetConfig, root_override: Option<PathBuf>) -> Self {
        Self {
            config,
            root_override,
        }
    }

    pub(crate) fn runtimes(&self) -> RuntimeTable {
        RuntimeTable::with_overrides(&self.config.runtimes)
    }

    pub(crate) fn store_root(&self) -> PathBuf {
        self.root_override
            .clone()
            .unwrap_or_else(|| self.config.store.root_path())
    }

    /// Open the store and report anything start-up reconciliation repaired.
    pub(crate) fn open_store(&self) -> Result<Store, Box<dyn std::error::Error>> {
        let store = Store::open_at(&self.store_root(), self.runtimes())?;
        let report = store.reconcile_report();
        for id in &report.dropped {
            eprintln!("Warning: '{id}' no longer matches its directory and was dropped from the index");
        }
        for id in &report.adopted {
            eprintln!("Warning: adopted unindexed directory '{id}'");
        }
        Ok(store)
    }
}

pub(crate) fn dispatch_command(
    command: &Commands,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List { verbose } => cmd::list::run_list(ctx, *verbose),
        Commands::Install {
            source,
            collection,
            no_backup,
        } => cmd::install::run_install(ctx, source, *collection, *no_backup),
        Commands::BatchInstall {
            path,
            archives,
            no_backup,
        } => cmd::install::run_batch_install(ctx, path, *archives, *no_backup),
        Commands::Uninstall {
            unit,
            keep_backup,
            yes,
        } => cmd::uninstall::run_uninstall(ctx, unit, *keep_backup, *yes),
        Commands::Export { unit, output, dir } => {
            cmd::export::run_export(ctx, unit, output.as_deref(), *dir)
        }
        Commands::BatchExport { dest, dir } => cmd::export::run_batch_export(ctx, dest, *dir),
        Commands::Sync => cmd::sync::run_sync(ctx),
        Commands::Restore { unit } => cmd::sync::run_restore(ctx, unit),
        Commands::Backups => cmd::backups::run_backups(ctx),
        Commands::Play { unit, args } => cmd::play::run_play(ctx, unit, args),
        Commands::Check => cmd::play::run_check(ctx),
        Commands::Dedupe { yes } => cmd::dedupe::run_dedupe(ctx, *yes),
        Commands::Init {
            dir,
            name,
            author,
            generator,
            game_version,
            language,
            main,
        } => cmd::init::run_init(
            ctx,
            dir,
            cabinet_core::manifest::ScaffoldOptions {
                name: name.clone(),
                author: author.clone(),
                generator: generator.clone(),
                version: game_version.clone(),
                language: language.clone(),
                main: main.clone(),
            },
        ),
        Commands::Info => cmd::info::run_info(ctx),
        Commands::Config { .. } => {
            Err("'config' command should be handled before config resolution".into())
        }
    }
}
