//! arXiv 查询客户端
//!
//! 封装 arXiv export API 的分页查询、Atom 解析和发布日期过滤。
//! 所有请求都先经过共享的 [`RateLimiter`]。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::RateLimiter;
use crate::models::{CategoryFilter, PaperRecord};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 请求头中的 User-Agent
pub const USER_AGENT: &str = concat!("arxiv_fetcher/", env!("CARGO_PKG_VERSION"));

// ========== Atom 响应结构 ==========

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    published: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: String,
}

/// 合并连续空白（arXiv 的标题和摘要带硬换行）
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 解析 Atom 响应
///
/// # 参数
/// - `xml`: 响应正文
/// - `endpoint`: 用于错误信息的请求地址
///
/// # 返回
/// 按响应顺序排列的论文记录
pub fn parse_feed(xml: &str, endpoint: &str) -> AppResult<Vec<PaperRecord>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)
        .map_err(|e| AppError::malformed(endpoint, format!("Atom 解析失败: {}", e)))?;

    let mut papers = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        // arXiv 用一条特殊 entry 报告查询错误
        if entry.id.contains("/api/errors") {
            return Err(AppError::malformed(
                endpoint,
                format!("arXiv 返回错误: {}", normalize_whitespace(&entry.summary)),
            ));
        }

        let published = DateTime::parse_from_rfc3339(entry.published.trim())
            .map_err(|e| {
                AppError::malformed(
                    endpoint,
                    format!("发布时间格式错误 '{}': {}", entry.published, e),
                )
            })?
            .with_timezone(&Utc);

        papers.push(PaperRecord {
            title: normalize_whitespace(&entry.title),
            authors: entry
                .authors
                .into_iter()
                .map(|a| normalize_whitespace(&a.name))
                .collect(),
            published,
            summary: normalize_whitespace(&entry.summary),
            link: entry.id.trim().to_string(),
            categories: entry
                .categories
                .into_iter()
                .map(|c| c.term)
                .filter(|t| !t.is_empty())
                .collect(),
            combination: None,
        });
    }
    Ok(papers)
}

/// 只保留 `[today - window_days, today]` 内发布的论文（按 UTC 日期，两端包含）
pub fn filter_window(papers: Vec<PaperRecord>, window_days: u32, today: NaiveDate) -> Vec<PaperRecord> {
    let start = today - ChronoDuration::days(i64::from(window_days));
    papers
        .into_iter()
        .filter(|p| {
            let date = p.published_date();
            start <= date && date <= today
        })
        .collect()
}

// ========== 客户端 ==========

/// arXiv API 客户端
pub struct ArxivClient {
    http: reqwest::Client,
    api_url: String,
    page_size: usize,
    default_category: String,
    limiter: Arc<RateLimiter>,
}

impl ArxivClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - `config`: 提供 API 地址、分页大小、默认分类和超时
    /// - `limiter`: 与 PDF 下载共用的节流器
    pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::network(&config.arxiv_api_url, e))?;

        Ok(Self {
            http,
            api_url: config.arxiv_api_url.clone(),
            page_size: config.page_size.max(1),
            default_category: config.default_category.clone(),
            limiter,
        })
    }

    /// 抓取最近 `window_days` 天内发布的论文
    ///
    /// 每个分类组合独立查询，结果按 arXiv ID 去重（先出现的组合优先）。
    /// 任何一次请求失败都会让整次抓取失败，不返回部分结果。
    ///
    /// # 参数
    /// - `window_days`: 回溯天数
    /// - `max_results`: 每个分类组合最多取回的条数
    /// - `filters`: 分类组合；为空时查询默认分类
    pub async fn fetch_papers(
        &self,
        window_days: u32,
        max_results: usize,
        filters: &[CategoryFilter],
    ) -> AppResult<Vec<PaperRecord>> {
        let today = Utc::now().date_naive();
        let window_start = today - ChronoDuration::days(i64::from(window_days));

        let default_filter = [CategoryFilter::single(self.default_category.clone())];
        let filters = if filters.is_empty() {
            &default_filter[..]
        } else {
            filters
        };

        let mut seen = HashSet::new();
        let mut all_papers = Vec::new();

        for (index, filter) in filters.iter().enumerate() {
            let unknown = filter.unknown_codes();
            if !unknown.is_empty() {
                warn!("⚠️ 分类代码不在目录中: {}", unknown.join(", "));
            }

            info!(
                "[{}/{}] 🔍 查询 {} (最多 {} 条)",
                index + 1,
                filters.len(),
                filter,
                max_results
            );

            let fetched = self.query_filter(filter, max_results, window_start).await?;
            let fetched_count = fetched.len();
            let label = filter.to_string();

            let mut kept = 0;
            for mut paper in filter_window(fetched, window_days, today) {
                let key = paper.canonical_id().unwrap_or_else(|_| paper.link.clone());
                if !seen.insert(key) {
                    continue;
                }
                paper.combination = Some(label.clone());
                all_papers.push(paper);
                kept += 1;
            }

            info!(
                "[{}/{}] ✓ 取回 {} 条，窗口内新增 {} 条",
                index + 1,
                filters.len(),
                fetched_count,
                kept
            );
        }

        Ok(all_papers)
    }

    /// 单个分类组合的分页查询
    async fn query_filter(
        &self,
        filter: &CategoryFilter,
        max_results: usize,
        window_start: NaiveDate,
    ) -> AppResult<Vec<PaperRecord>> {
        let query = filter.search_query();
        let mut collected: Vec<PaperRecord> = Vec::new();
        let mut start = 0;

        while collected.len() < max_results {
            let count = self.page_size.min(max_results - collected.len());
            let page = self.fetch_page(&query, start, count).await?;
            let page_len = page.len();

            // 结果按提交时间倒序，最后一条早于窗口起点就不必再翻页
            let passed_window = page
                .last()
                .map(|p| p.published_date() < window_start)
                .unwrap_or(true);

            collected.extend(page);

            if page_len < count || passed_window {
                break;
            }
            start += page_len;
        }

        collected.truncate(max_results);
        Ok(collected)
    }

    async fn fetch_page(&self, query: &str, start: usize, count: usize) -> AppResult<Vec<PaperRecord>> {
        self.limiter.wait().await;

        debug!("请求 arXiv: query={} start={} max_results={}", query, start, count);

        let start_param = start.to_string();
        let count_param = count.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", query),
                ("start", start_param.as_str()),
                ("max_results", count_param.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(&self.api_url, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::network(&self.api_url, e))?;

        let papers = parse_feed(&body, &self.api_url)?;
        debug!("本页解析出 {} 条记录", papers.len());
        Ok(papers)
    }
}
