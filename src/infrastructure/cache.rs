//! 带过期时间的磁盘缓存
//!
//! 文件格式：`{key: {"timestamp": 秒(浮点), "data": 任意 JSON}}`。
//! 条目有效当且仅当 `now - timestamp < duration`；过期条目不会被清理，
//! 直到同一个 key 被重新写入。文件损坏一律按未命中处理。

use crate::error::AppResult;
use crate::infrastructure::json_store;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::models::CategoryFilter;

/// 时间来源（秒，Unix 纪元起）
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}

/// 手动推进的时钟，测试用
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by.as_secs_f64();
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.lock().map(|n| *n).unwrap_or_default()
    }
}

/// 抓取结果的缓存键：回溯天数 + 查询日期（+ 非默认的分类组合）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub window_days: u32,
    pub issue_date: NaiveDate,
    pub filters: Vec<CategoryFilter>,
}

impl QueryKey {
    pub fn new(window_days: u32, issue_date: NaiveDate) -> Self {
        Self {
            window_days,
            issue_date,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: &[CategoryFilter]) -> Self {
        self.filters = filters.to_vec();
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "papers_{}_{}",
            self.window_days,
            self.issue_date.format("%Y-%m-%d")
        )?;
        for filter in &self.filters {
            write!(f, "_{}", filter.to_string().replace(' ', "-"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: f64,
    data: JsonValue,
}

type CacheTable = BTreeMap<String, CacheEntry>;

/// 带过期时间的键值缓存
pub struct TimeBoundedCache {
    path: PathBuf,
    duration: Duration,
    clock: Arc<dyn Clock>,
}

impl TimeBoundedCache {
    pub fn new(path: impl Into<PathBuf>, duration: Duration) -> Self {
        Self::with_clock(path, duration, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            duration,
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取未过期的值；缺失、过期、损坏都返回 `None`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut table = self.load_table()?;
        let entry = table.remove(key)?;

        let age = self.clock.now() - entry.timestamp;
        if age >= self.duration.as_secs_f64() {
            debug!("缓存已过期: {} ({:.0} 秒前写入)", key, age);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                debug!("缓存命中: {}", key);
                Some(value)
            }
            Err(e) => {
                debug!("缓存数据无法反序列化，按未命中处理: {} ({})", key, e);
                None
            }
        }
    }

    /// 写入（覆盖）一个条目并整表写回
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let mut table = self.load_table().unwrap_or_default();
        let data = serde_json::to_value(value).map_err(|e| crate::error::AppError::json(&self.path, e))?;
        table.insert(
            key.to_string(),
            CacheEntry {
                timestamp: self.clock.now(),
                data,
            },
        );
        json_store::write_json_atomic(&self.path, &table, false)?;
        debug!("缓存已写入: {}", key);
        Ok(())
    }

    fn load_table(&self) -> Option<CacheTable> {
        match json_store::read_json::<CacheTable>(&self.path) {
            Ok(table) => table,
            Err(e) => {
                debug!("缓存文件损坏，按空缓存处理: {}", e);
                None
            }
        }
    }
}
