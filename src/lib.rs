//! # arXiv Fetcher
//!
//! 抓取 arXiv 最新论文，经 LLM 筛选后下载、解析并生成摘要。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有文件与节流状态，只暴露能力
//! - `TimeBoundedCache` - 带过期时间的查询缓存
//! - `JobLog` - 可续跑的作业记录（下载 / 解析 / 摘要）
//! - `RateLimiter` - 所有 arXiv 请求共用的最小间隔
//!
//! ### ② 能力层（Clients / Services）
//! - `clients/` - arXiv API、PDF 下载、LLM、LlamaParse
//! - `services/` - ID 解析、相关性评分、摘要、PDF 转文本、导出、展示
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"在某个阶段的处理流程
//! - `DownloadFlow` / `ExtractFlow` / `SummarizeFlow`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 按阶段遍历论文，统计结果
//! - `orchestrator/selection` - 按标题或日期挑选已下载论文
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JobLog, RateLimiter, TimeBoundedCache};
pub use models::{Analysis, AnalyzedPaper, CategoryFilter, PaperRecord};
pub use orchestrator::{FetchRequest, PipelineOrchestrator, Selection};
pub use workflow::{ItemState, PaperCtx, ProcessResult};
