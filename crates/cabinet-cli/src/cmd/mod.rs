pub(crate) mod backups;
pub(crate) mod dedupe;
pub(crate) mod export;
pub(crate) mod info;
pub(crate) mod init;
pub(crate) mod install;
pub(crate) mod list;
pub(crate) mod play;
pub(crate) mod sync;
pub(crate) mod uninstall;
