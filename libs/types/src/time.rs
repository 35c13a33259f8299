//! Wall-clock helper
//!
//! All wire timestamps are Unix milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_past_2023() {
        assert!(now_millis() > 1_672_531_200_000);
    }
}
