//! Key layout of the `entries` table.
//!
//! `snapshot:` keys embed the timestamp zero-padded to 20 digits, so key
//! order is timestamp order and a time range is one contiguous key range.
//! `latest:` keys sort in their own block and never fall inside it.

use pricefeed_core::constants::{LATEST_KEY_PREFIX, SNAPSHOT_KEY_PREFIX};

pub fn snapshot_key(timestamp: i64) -> String {
    format!("{}{:020}", SNAPSHOT_KEY_PREFIX, timestamp)
}

pub fn latest_key(symbol: &str) -> String {
    format!("{}{}", LATEST_KEY_PREFIX, symbol.to_lowercase())
}

pub fn parse_snapshot_key(key: &str) -> Option<i64> {
    key.strip_prefix(SNAPSHOT_KEY_PREFIX)?.parse().ok()
}

/// Bounds covering every snapshot key.
pub fn snapshot_key_bounds() -> (String, String) {
    (snapshot_key(0), snapshot_key(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_is_timestamp_order() {
        let mut stamps = vec![2_000_i64, 999, 1_700_000_000_000, 10, 0];
        let mut keys: Vec<String> = stamps.iter().map(|t| snapshot_key(*t)).collect();
        keys.sort();
        stamps.sort();
        let parsed: Vec<i64> = keys.iter().filter_map(|k| parse_snapshot_key(k)).collect();
        assert_eq!(parsed, stamps);
    }

    #[test]
    fn test_latest_keys_stay_out_of_snapshot_range() {
        let (lo, hi) = snapshot_key_bounds();
        for symbol in ["btc", "ETH", "zzz", "snapshot"] {
            let key = latest_key(symbol);
            assert!(key < lo || key > hi, "{key} inside snapshot range");
        }
    }

    #[test]
    fn test_latest_key_is_lowercase() {
        assert_eq!(latest_key("BTC"), "latest:btc");
        assert_eq!(snapshot_key(1000), "snapshot:00000000000000001000");
        assert_eq!(parse_snapshot_key("latest:btc"), None);
    }
}
