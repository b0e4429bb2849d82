pub mod backups;
pub mod dedupe;
pub mod export;
pub mod info;
pub mod install;
pub mod list;
pub mod play;
pub mod restore;
pub mod sync;
pub mod uninstall;
