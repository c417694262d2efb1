/// Visible days in a fresh window.
pub const DEFAULT_DAY_COUNT: u32 = 60;
/// Widest window a chart may be created with.
pub const MAX_DAY_COUNT: u32 = 366;
/// Columns moved by prev/next paging at the default scale.
pub const DEFAULT_PAGE_STEP: i64 = 7;
/// Undo entries kept before the oldest is evicted.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;
pub const MAX_HISTORY_LIMIT: usize = 500;
/// Longest guest-name fragment kept by privacy masking.
pub const MAX_MASK_LEN: usize = 5;
