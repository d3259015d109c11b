//! 可续跑的作业记录 - 基础设施层
//!
//! 一个 JSON 文件记录某个阶段已完成的条目：
//!
//! ```text
//! { "<section>": { "<key>": <entry>, ... }, "last_updated": "..." }
//! ```
//!
//! 记录文件是"是否已完成"的唯一依据。每完成一项就整文件写回一次，
//! 中途崩溃最多丢失正在处理的那一项。

use crate::error::{AppError, AppResult};
use crate::infrastructure::json_store;
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 下载记录：`papers/.download_log.json` 的 `papers` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub downloaded_at: String,
    pub title: String,
    pub directory: String,
}

/// 解析记录：`papers/.parse_log.json` 的 `parsed` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseEntry {
    pub parsed_at: String,
    pub title: String,
    pub output: String,
}

/// 摘要记录：摘要文件的 `summaries` 段，按标题索引
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub summary: String,
    pub generated_at: String,
}

/// 当前本地时间（ISO-8601）
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// 产物必须存在且非空，才能登记完成
pub fn verify_artifact(path: &Path) -> AppResult<()> {
    let meta = std::fs::metadata(path).map_err(|e| AppError::io(path, e))?;
    if meta.len() == 0 {
        return Err(AppError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "产物文件为空"),
        ));
    }
    Ok(())
}

/// 某一阶段的完成记录
#[derive(Debug)]
pub struct JobLog<E> {
    path: PathBuf,
    section: &'static str,
    stamp_last_updated: bool,
    /// 文件中本段之外的顶层字段，写回时原样保留
    extra: Map<String, JsonValue>,
    entries: BTreeMap<String, E>,
}

impl<E> JobLog<E>
where
    E: Serialize + DeserializeOwned,
{
    /// 打开记录文件
    ///
    /// # 参数
    /// - `path`: 记录文件路径（不存在视为空记录）
    /// - `section`: 条目所在的顶层字段名
    ///
    /// # 返回
    /// 文件存在但无法解析时返回错误，不会静默清空已有记录
    pub fn open(path: impl Into<PathBuf>, section: &'static str) -> AppResult<Self> {
        let path = path.into();
        let mut extra: Map<String, JsonValue> =
            json_store::read_json(&path)?.unwrap_or_default();

        let entries: BTreeMap<String, E> = match extra.remove(section) {
            Some(value) => serde_json::from_value(value).map_err(|e| AppError::json(&path, e))?,
            None => BTreeMap::new(),
        };

        debug!("已加载作业记录 {}: {} 条", path.display(), entries.len());

        Ok(Self {
            path,
            section,
            stamp_last_updated: false,
            extra,
            entries,
        })
    }

    /// 写回时附带 `last_updated`
    pub fn stamp_last_updated(mut self, enabled: bool) -> Self {
        self.stamp_last_updated = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_complete(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &BTreeMap<String, E> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 登记一项完成并立即写回
    pub fn record_completion(&mut self, key: impl Into<String>, entry: E) -> AppResult<()> {
        self.entries.insert(key.into(), entry);
        self.save()
    }

    /// 先校验产物，再登记完成
    pub fn record_verified(
        &mut self,
        key: impl Into<String>,
        entry: E,
        artifact: &Path,
    ) -> AppResult<()> {
        verify_artifact(artifact)?;
        self.record_completion(key, entry)
    }

    fn save(&self) -> AppResult<()> {
        let mut root = self.extra.clone();
        let section =
            serde_json::to_value(&self.entries).map_err(|e| AppError::json(&self.path, e))?;
        root.insert(self.section.to_string(), section);
        if self.stamp_last_updated {
            root.insert(
                "last_updated".to_string(),
                JsonValue::String(timestamp_now()),
            );
        }
        json_store::write_json_atomic(&self.path, &root, true)
    }
}
