//! 流水线编排器 - 编排层
//!
//! ## 职责
//!
//! 按阶段调度 fetch → analyze → download → parse → summarize，
//! 每个阶段读取上一阶段落盘的结果。
//!
//! ## 核心功能
//!
//! 1. **资源所有者**：唯一创建 [`RateLimiter`] 的地方，同一个实例传给
//!    arXiv 查询和 PDF 下载
//! 2. **缓存**：fetch 先查 [`TimeBoundedCache`]
//! 3. **断点续跑**：打开作业记录交给各流程，单篇失败记录日志后继续
//! 4. **统计输出**：每个阶段结束打印完成 / 跳过 / 失败数量

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::clients::{ArxivClient, PdfClient};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{
    DownloadEntry, JobLog, ParseEntry, QueryKey, RateLimiter, SummaryEntry, TimeBoundedCache,
};
use crate::models::{CategoryFilter, PaperRecord};
use crate::orchestrator::selection::{self, Selection};
use crate::services::analyzer::{self, AnalysisOutcome};
use crate::services::{exporter, formatter, identifier, DocumentExtractor, RelevanceScorer, Summarizer};
use crate::utils::logging::{log_stage_start, print_stage_stats, truncate_text};
use crate::workflow::{
    DownloadFlow, ExtractFlow, ItemState, PaperCtx, ProcessResult, SummarizeFlow,
};

/// 允许的回溯天数
pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 30;

/// 下载记录的顶层字段
pub const DOWNLOAD_SECTION: &str = "papers";
/// 解析记录的顶层字段
pub const PARSE_SECTION: &str = "parsed";
/// 摘要记录的顶层字段
pub const SUMMARY_SECTION: &str = "summaries";

/// 阶段统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageStats {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 记录单篇结果；失败只计数和打日志
    ///
    /// # 参数
    /// - `running`: 本阶段进行中的状态，失败时据此得到对应的失败状态
    fn record(&mut self, running: ItemState, ctx: &PaperCtx, result: AppResult<ProcessResult>) {
        match result {
            Ok(ProcessResult::Completed) => self.completed += 1,
            Ok(ProcessResult::AlreadyDone) => self.skipped += 1,
            Err(e) => {
                let failed = running.finish(false).unwrap_or(running);
                error!("{} ❌ {} '{}': {}", ctx, failed, ctx.title, e);
                self.failed += 1;
            }
        }
    }

    fn print(&self, stage: &str) {
        print_stage_stats(stage, self.completed, self.skipped, self.failed, self.total);
    }
}

/// fetch 参数
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub days: u32,
    /// 为空时取配置中的 `max_results`
    pub max_results: Option<usize>,
    /// 为空时取配置中的分类组合
    pub filters: Vec<CategoryFilter>,
    pub use_cache: bool,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

/// fetch 结果
#[derive(Debug)]
pub struct FetchOutcome {
    pub papers: Vec<PaperRecord>,
    pub from_cache: bool,
    pub exported: Vec<PathBuf>,
}

/// 流水线编排器
pub struct PipelineOrchestrator {
    config: Config,
    limiter: Arc<RateLimiter>,
}

impl PipelineOrchestrator {
    /// 创建编排器
    ///
    /// # 返回
    /// 配置中的请求间隔无法使用时返回 `InvalidArgument`
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        let limiter = Arc::new(RateLimiter::from_secs_f64(config.api_delay_secs)?);
        Ok(Self { config, limiter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========== fetch ==========

    /// 抓取论文（先查缓存），然后导出或展示
    ///
    /// # 参数
    /// - `request`: 回溯天数、分类组合和导出选项
    ///
    /// # 返回
    /// 论文列表以及是否命中缓存
    pub async fn run_fetch(&self, request: FetchRequest) -> Result<FetchOutcome> {
        if !(MIN_DAYS..=MAX_DAYS).contains(&request.days) {
            bail!(AppError::InvalidArgument(format!(
                "回溯天数必须在 {} 到 {} 之间: {}",
                MIN_DAYS, MAX_DAYS, request.days
            )));
        }

        let filters = if request.filters.is_empty() {
            self.config.query_combinations.clone()
        } else {
            request.filters.clone()
        };
        let max_results = request.max_results.unwrap_or(self.config.max_results);

        let cache = TimeBoundedCache::new(
            &self.config.cache_file,
            Duration::from_secs(self.config.cache_duration_secs),
        );
        let key = QueryKey::new(request.days, Utc::now().date_naive())
            .with_filters(&filters)
            .to_string();

        let cached = if request.use_cache {
            cache.get::<Vec<PaperRecord>>(&key)
        } else {
            None
        };

        let (papers, from_cache) = match cached {
            Some(papers) => {
                info!("💾 命中缓存 {}: {} 篇论文", key, papers.len());
                (papers, true)
            }
            None => {
                info!("🌐 从 arXiv 抓取最近 {} 天的论文...", request.days);
                let client = ArxivClient::new(&self.config, self.limiter.clone())?;
                let papers = client
                    .fetch_papers(request.days, max_results, &filters)
                    .await
                    .context("从 arXiv 抓取论文失败")?;
                if let Err(e) = cache.set(&key, &papers) {
                    warn!("⚠️ 缓存写入失败: {}", e);
                }
                (papers, false)
            }
        };

        info!("✓ 共 {} 篇论文", papers.len());

        let mut exported = Vec::new();
        if let Some(path) = &request.export_json {
            let written = exporter::export_json(&papers, path, None)?;
            info!("📁 已导出 JSON: {}", written.display());
            exported.push(written);
        }
        if let Some(path) = &request.export_csv {
            let written = exporter::export_csv(&papers, path)?;
            info!("📁 已导出 CSV: {}", written.display());
            exported.push(written);
        }
        if exported.is_empty() {
            println!(
                "{}",
                formatter::render_papers(&papers, self.config.max_abstract_length)
            );
        }

        Ok(FetchOutcome {
            papers,
            from_cache,
            exported,
        })
    }

    // ========== analyze ==========

    /// 相关性分析
    ///
    /// # 参数
    /// - `scorer`: 评分能力
    /// - `input`: fetch 导出的 JSON
    /// - `output`: 相关论文输出路径
    /// - `min_relevance`: 阈值，必须在 [0, 1]
    pub async fn run_analyze(
        &self,
        scorer: &dyn RelevanceScorer,
        input: &Path,
        output: &Path,
        min_relevance: f64,
    ) -> Result<AnalysisOutcome> {
        if !(0.0..=1.0).contains(&min_relevance) {
            bail!(AppError::InvalidArgument(format!(
                "最低相关性必须在 0 到 1 之间: {}",
                min_relevance
            )));
        }

        let papers: Vec<PaperRecord> = exporter::read_paper_set(input)
            .with_context(|| format!("无法读取论文集: {}", input.display()))?;
        log_stage_start("相关性分析", papers.len());

        let outcome = analyzer::analyze_papers(scorer, &papers, min_relevance).await;
        let written = exporter::export_json(&outcome.relevant, output, Some(min_relevance))?;

        info!(
            "✅ 分析完成：{} 篇中有 {} 篇相关（{} 篇分析失败），已写入 {}",
            papers.len(),
            outcome.relevant.len(),
            outcome.failed,
            written.display()
        );
        Ok(outcome)
    }

    // ========== download ==========

    /// 下载 PDF
    ///
    /// # 参数
    /// - `input`: 分析结果 JSON（任意论文对象）
    /// - `output_dir`: 论文根目录，为空时取配置
    pub async fn run_download(&self, input: &Path, output_dir: Option<&Path>) -> Result<StageStats> {
        let papers: Vec<JsonValue> = exporter::read_paper_set(input)
            .with_context(|| format!("无法读取论文集: {}", input.display()))?;

        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.papers_dir.clone());
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("无法创建目录: {}", output_dir.display()))?;

        let mut log: JobLog<DownloadEntry> =
            JobLog::open(output_dir.join(".download_log.json"), DOWNLOAD_SECTION)?;
        let pdf_client = PdfClient::new(&self.config, self.limiter.clone())?;
        let flow = DownloadFlow::new(&pdf_client, &output_dir);

        log_stage_start("下载论文", papers.len());
        let mut stats = StageStats::new(papers.len());

        for (index, paper) in papers.iter().enumerate() {
            let title = paper
                .get("title")
                .and_then(JsonValue::as_str)
                .unwrap_or("Unknown");
            let arxiv_id = match identifier::resolve_value(paper) {
                Ok(id) => id,
                Err(e) => {
                    let ctx = PaperCtx::new(index + 1, papers.len(), "", title);
                    stats.record(ItemState::Downloading, &ctx, Err(e));
                    continue;
                }
            };

            let ctx = PaperCtx::new(index + 1, papers.len(), arxiv_id, title);
            let result = flow.run(paper, &ctx, &mut log).await;
            stats.record(ItemState::Downloading, &ctx, result);
        }

        stats.print("下载论文");
        info!("📂 论文保存在: {}", output_dir.display());
        Ok(stats)
    }

    // ========== parse ==========

    /// PDF 转 markdown
    ///
    /// # 参数
    /// - `extractor`: 解析后端
    /// - `selection`: 按标题或日期挑选
    /// - `force`: 忽略解析记录
    pub async fn run_parse(
        &self,
        extractor: &dyn DocumentExtractor,
        selection: &Selection,
        force: bool,
    ) -> Result<StageStats> {
        let downloads: JobLog<DownloadEntry> =
            JobLog::open(self.config.download_log_path(), DOWNLOAD_SECTION)?;
        let selected = selection::select_downloads(&downloads, selection);

        if selected.is_empty() {
            warn!("⚠️ 没有匹配的已下载论文");
            return Ok(StageStats::default());
        }

        let mut log: JobLog<ParseEntry> =
            JobLog::open(self.config.parse_log_path(), PARSE_SECTION)?;
        let flow = ExtractFlow::new(extractor, force);

        log_stage_start("解析论文", selected.len());
        let mut stats = StageStats::new(selected.len());

        for (index, (arxiv_id, entry)) in selected.iter().enumerate() {
            let ctx = PaperCtx::new(index + 1, selected.len(), arxiv_id.as_str(), entry.title.as_str());
            let result = flow.run(entry, &ctx, &mut log).await;
            stats.record(ItemState::Extracting, &ctx, result);
        }

        stats.print("解析论文");
        Ok(stats)
    }

    // ========== summarize ==========

    /// 生成摘要
    pub async fn run_summarize(
        &self,
        summarizer: &dyn Summarizer,
        selection: &Selection,
    ) -> Result<StageStats> {
        let folders =
            selection::select_summary_folders(&self.config.download_log_path(), selection)?;

        if folders.is_empty() {
            warn!("⚠️ 没有匹配的论文");
            return Ok(StageStats::default());
        }

        let mut log: JobLog<SummaryEntry> =
            JobLog::open(&self.config.summaries_file, SUMMARY_SECTION)?.stamp_last_updated(true);
        let flow = SummarizeFlow::new(
            summarizer,
            &self.config.papers_dir,
            self.config.summary_content_limit,
        );

        log_stage_start("生成摘要", folders.len());
        let mut stats = StageStats::new(folders.len());

        for (index, folder) in folders.iter().enumerate() {
            let ctx = PaperCtx::new(
                index + 1,
                folders.len(),
                folder.as_str(),
                truncate_text(folder, 80),
            );
            let result = flow.run(&ctx, &mut log).await;
            stats.record(ItemState::Summarizing, &ctx, result);
        }

        stats.print("生成摘要");
        info!(
            "📝 摘要保存在: {} (更新于 {})",
            self.config.summaries_file.display(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        Ok(stats)
    }

    // ========== categories ==========

    /// 分类目录文本
    pub fn show_categories(&self) -> String {
        formatter::render_categories()
    }
}
