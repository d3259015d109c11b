//! 基础设施层
//!
//! 持有文件和节流状态，只暴露能力，不认识流程。

pub mod cache;
pub mod job_log;
pub mod json_store;
pub mod rate_limiter;

pub use cache::{Clock, ManualClock, QueryKey, SystemClock, TimeBoundedCache};
pub use job_log::{DownloadEntry, JobLog, ParseEntry, SummaryEntry};
pub use rate_limiter::RateLimiter;
