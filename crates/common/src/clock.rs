//! 时钟抽象
//!
//! 会话过期、审计时间戳、风险编号年份都依赖当前时间，统一从 `Clock` 读取，
//! 测试中用 `ManualClock` 推进时间。

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Datelike, Duration, Utc};

/// 时钟 trait
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 当前年份
    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动时钟（测试用）
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// 向前推进
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advance() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let shared = clock.clone();

        shared.advance(Duration::minutes(31));

        assert_eq!(clock.now(), start + Duration::minutes(31));
        assert_eq!(clock.current_year(), 2025);
    }
}
