//! 请求节流 - 基础设施层
//!
//! 所有访问 arXiv 的请求（元数据查询和 PDF 下载）共用同一个实例，
//! 保证任意两次请求的发起时间间隔不小于 `min_interval`。

use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use tokio::time::Instant;
use tracing::debug;

/// 最小间隔节流器
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// 从配置中的秒数（可为小数）创建；负数按 0 处理
    ///
    /// # 返回
    /// NaN、无穷大或超出 `Duration` 范围时返回 `InvalidArgument`
    pub fn from_secs_f64(secs: f64) -> AppResult<Self> {
        let clamped = if secs < 0.0 { 0.0 } else { secs };
        Duration::try_from_secs_f64(clamped)
            .map(Self::new)
            .map_err(|e| AppError::InvalidArgument(format!("请求间隔无效 {}: {}", secs, e)))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 等到允许发起下一次请求，并把当前时刻记为最近一次请求
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("⏳ 节流等待 {:.2} 秒", remaining.as_secs_f64());
                tokio::time::sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }
}
