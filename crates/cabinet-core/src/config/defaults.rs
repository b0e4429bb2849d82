pub(super) fn default_store_root() -> String {
    "~/.cabinet".to_string()
}

pub(super) fn default_backup_on_install() -> bool {
    true
}

pub(super) fn default_connect_timeout_secs() -> u64 {
    15
}

pub(super) fn default_timeout_secs() -> u64 {
    300
}

pub(super) fn default_max_bytes() -> u64 {
    256 * 1024 * 1024 // 256 MiB
}

pub(super) fn default_max_retries() -> usize {
    3
}

pub(super) fn default_retry_delay_ms() -> u64 {
    500
}

pub(super) fn default_retry_max_delay_ms() -> u64 {
    10_000
}
