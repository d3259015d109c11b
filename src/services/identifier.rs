//! arXiv ID 解析 - 业务能力层
//!
//! 论文数据来自抓取结果、分析结果或用户手写的 JSON，字段名并不统一。
//! 这里按固定优先级在各个候选字段中寻找 arXiv ID：
//!
//! 1. `url` / `pdf_url` / `entry_id` / `id` / `link`
//! 2. `links` 数组（字符串或带 `href` 的对象）
//! 3. `arxiv_id`（匹配不上时原样返回）

use crate::error::{AppError, AppResult};
use crate::models::PaperRecord;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

/// 依次尝试的 URL 字段
const URL_FIELDS: [&str; 5] = ["url", "pdf_url", "entry_id", "id", "link"];

/// 按优先级排列；带版本号的写法优先
const ID_PATTERNS: [&str; 6] = [
    r"arxiv\.org/abs/([0-9]+\.[0-9]+v[0-9]+)",
    r"arxiv\.org/abs/([0-9]+\.[0-9]+)",
    r"arxiv\.org/pdf/([0-9]+\.[0-9]+v[0-9]+)",
    r"arxiv\.org/pdf/([0-9]+\.[0-9]+)",
    r"^([0-9]{4}\.[0-9]+v[0-9]+)$",
    r"^([0-9]{4}\.[0-9]+)$",
];

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| ID_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

/// 从单个字符串中提取 arXiv ID
pub fn resolve_str(text: &str) -> Option<String> {
    let text = text.trim();
    patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 从 JSON 论文对象或单独的引用字符串中解析 arXiv ID
///
/// 字符串匹配不上任何模式时按 `arxiv_id` 的规则原样返回。
///
/// # 返回
/// 找不到时返回 `IdentifierNotFound`，错误信息中列出对象的全部字段名
pub fn resolve_value(paper: &JsonValue) -> AppResult<String> {
    if let JsonValue::String(reference) = paper {
        let reference = reference.trim();
        if !reference.is_empty() {
            return Ok(resolve_str(reference).unwrap_or_else(|| reference.to_string()));
        }
    }
    let fields = paper.as_object().cloned().unwrap_or_default();
    resolve_fields(&fields).ok_or_else(|| not_found(&fields))
}

/// 从抓取记录中解析 arXiv ID
pub fn resolve_record(paper: &PaperRecord) -> AppResult<String> {
    let mut fields = Map::new();
    fields.insert("title".to_string(), JsonValue::String(paper.title.clone()));
    fields.insert("link".to_string(), JsonValue::String(paper.link.clone()));
    resolve_fields(&fields).ok_or_else(|| AppError::IdentifierNotFound {
        title: paper.title.clone(),
        fields: "title, authors, published, summary, link, categories".to_string(),
    })
}

fn resolve_fields(fields: &Map<String, JsonValue>) -> Option<String> {
    let from_urls = URL_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name).and_then(JsonValue::as_str))
        .find_map(resolve_str);
    if from_urls.is_some() {
        return from_urls;
    }

    let from_links = fields
        .get("links")
        .and_then(JsonValue::as_array)
        .into_iter()
        .flatten()
        .filter_map(|link| match link {
            JsonValue::String(s) => Some(s.as_str()),
            JsonValue::Object(obj) => obj.get("href").and_then(JsonValue::as_str),
            _ => None,
        })
        .find_map(resolve_str);
    if from_links.is_some() {
        return from_links;
    }

    fields
        .get("arxiv_id")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| resolve_str(s).unwrap_or_else(|| s.to_string()))
}

fn not_found(fields: &Map<String, JsonValue>) -> AppError {
    let title = fields
        .get("title")
        .and_then(JsonValue::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    AppError::IdentifierNotFound {
        title,
        fields: names.join(", "),
    }
}
