//! Reconnection policy.
//!
//! Pure functions deciding whether and when to reconnect, kept free of
//! side effects so the policy is testable without a socket.

use std::time::Duration;

/// Ceiling multiplier for the exponential delay: the Nth retry waits
/// `base * 2^(N-1)`, never more than `base * MAX_BACKOFF_FACTOR`.
pub const MAX_BACKOFF_FACTOR: u32 = 10;

/// Normal-closure WebSocket status code (RFC 6455)
const CLOSE_CODE_NORMAL: u16 = 1000;

/// Compute the delay before the given reconnect attempt.
///
/// `attempt` is 1-indexed: the first reconnect after a drop waits the
/// base interval, each following attempt doubles it up to the ceiling.
pub fn reconnect_delay(attempt: u32, base_interval: Duration) -> Duration {
    let factor = 2u32
        .saturating_pow(attempt.saturating_sub(1))
        .min(MAX_BACKOFF_FACTOR);
    base_interval * factor
}

/// Check whether another reconnect attempt is allowed.
///
/// # Arguments
///
/// * `failed_attempts` - Consecutive unexpected closures since the last `Ready`
/// * `max_attempts` - The configured retry bound
pub fn should_reconnect(failed_attempts: u32, max_attempts: u32) -> bool {
    failed_attempts < max_attempts
}

/// Check whether a close frame represents a normal, on-purpose closure.
///
/// A normal closure ends the connection without a reconnect attempt; a
/// missing close frame (the peer vanished) is treated as abnormal.
pub fn is_normal_closure(close_code: Option<u16>) -> bool {
    close_code == Some(CLOSE_CODE_NORMAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reconnect_waits_the_base_interval() {
        // テスト項目: 初回の再接続は基本間隔そのままの遅延になる
        // given (前提条件):
        let base = Duration::from_secs(5);

        // when (操作):
        let delay = reconnect_delay(1, base);

        // then (期待する結果):
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        // テスト項目: 再接続遅延が試行ごとに倍増する
        // given (前提条件):
        let base = Duration::from_secs(5);

        // when (操作):
        let delays: Vec<Duration> = (1..=4).map(|n| reconnect_delay(n, base)).collect();

        // then (期待する結果):
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(20),
                Duration::from_secs(40),
            ]
        );
    }

    #[test]
    fn test_delay_is_capped_at_ten_times_the_base() {
        // テスト項目: 遅延は基本間隔の 10 倍で頭打ちになる
        // given (前提条件):
        let base = Duration::from_secs(5);

        // when (操作):
        let fifth = reconnect_delay(5, base);
        let huge = reconnect_delay(30, base);

        // then (期待する結果):
        assert_eq!(fifth, Duration::from_secs(50));
        assert_eq!(huge, Duration::from_secs(50));
    }

    #[test]
    fn test_attempt_zero_is_treated_as_the_first() {
        // テスト項目: 0 回目の指定でも基本間隔の遅延が返る
        // given (前提条件):
        let base = Duration::from_secs(5);

        // when (操作):
        let delay = reconnect_delay(0, base);

        // then (期待する結果):
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn test_should_reconnect_within_bound() {
        // テスト項目: 失敗回数が上限未満の間のみ再接続すべきと判定される
        // given (前提条件):
        let max_attempts = 5;

        // when (操作):

        // then (期待する結果):
        assert!(should_reconnect(0, max_attempts));
        assert!(should_reconnect(4, max_attempts));
        assert!(!should_reconnect(5, max_attempts));
        assert!(!should_reconnect(6, max_attempts));
    }

    #[test]
    fn test_normal_closure_code() {
        // テスト項目: クローズコード 1000 のみ正常終了と判定される
        // given (前提条件):

        // when (操作):

        // then (期待する結果):
        assert!(is_normal_closure(Some(1000)));
        assert!(!is_normal_closure(Some(1006)));
        assert!(!is_normal_closure(Some(1011)));
        assert!(!is_normal_closure(None));
    }
}
