pub const DEFAULT_CONTEXT_LINES: usize = 4;
pub const DEFAULT_MAX_CONTEXT_LINES: usize = 10;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_RELOAD_DELAY_MS: u64 = 1000;
pub const DEFAULT_USE_DIFF_PATCH: bool = true;
