//! # Clock（時刻プロバイダ）
//!
//! 決裁・却下・取り消しなどの状態遷移に刻む時刻を外から注入するための抽象化。
//! ユースケース層は `Utc::now()` を直接呼ばず、このトレイト経由で現在時刻を得る。

use chrono::{DateTime, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// システム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_system_clock_は現在時刻を返す() {
        let before = Utc::now();
        let result = SystemClock.now();
        let after = Utc::now();

        assert!(before <= result && result <= after);
    }

    #[test]
    fn test_fixed_clock_は何度呼んでも同じ時刻を返す() {
        let fixed = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
        let clock = FixedClock::new(fixed);

        assert_eq!(clock.now(), fixed);
        assert_eq!(clock.now(), clock.now());
    }
}
