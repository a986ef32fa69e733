/// Number of ranked assets tracked per tick
pub const DEFAULT_TOP_ASSETS: usize = 5;

/// Number of ranked venues queried per asset
pub const DEFAULT_TOP_VENUES: usize = 3;

/// Default scheduler cadence in seconds
pub const DEFAULT_FETCH_INTERVAL_SECS: u64 = 30;

/// Key namespace of the append-only snapshot log
pub const SNAPSHOT_KEY_PREFIX: &str = "snapshot:";

/// Key namespace of the latest-value index
pub const LATEST_KEY_PREFIX: &str = "latest:";
