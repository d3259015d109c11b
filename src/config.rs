//! 程序配置
//!
//! 三层覆盖：内置默认值 ← `arxiv_fetcher.toml`（可选）← 环境变量。
//! 凭据只从环境变量读取，并在需要它的阶段开始时才校验。

use crate::error::{AppError, AppResult};
use crate::models::CategoryFilter;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "arxiv_fetcher.toml";

/// PDF 转文本后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserBackend {
    /// LlamaParse 云服务（需要 LLAMA_CLOUD_API_KEY）
    LlamaParse,
    /// 本地 pdf-extract
    Local,
}

impl FromStr for ParserBackend {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llama_parse" | "llamaparse" | "llama" => Ok(ParserBackend::LlamaParse),
            "local" | "pdf-extract" | "pdf_extract" => Ok(ParserBackend::Local),
            other => Err(AppError::InvalidArgument(format!(
                "未知的解析后端: {}",
                other
            ))),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- arXiv API ---
    pub arxiv_api_url: String,
    pub pdf_base_url: String,
    /// 两次请求之间的最小间隔（秒）
    pub api_delay_secs: f64,
    pub max_results: usize,
    /// 单页请求条数
    pub page_size: usize,
    pub default_category: String,
    /// 为空时只查询 `default_category`
    pub query_combinations: Vec<CategoryFilter>,
    pub request_timeout_secs: u64,

    // --- 缓存 ---
    pub cache_file: PathBuf,
    pub cache_duration_secs: u64,

    // --- 输出 ---
    pub max_abstract_length: usize,
    pub papers_dir: PathBuf,
    pub summaries_file: PathBuf,

    // --- LLM ---
    pub openai_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub summary_max_tokens: u32,
    /// 送入摘要模型的最大字符数
    pub summary_content_limit: usize,

    // --- 文档解析 ---
    pub parser_backend: ParserBackend,
    pub llama_cloud_api_key: Option<String>,
    pub llama_parse_base_url: String,
    pub llama_parse_poll_secs: u64,
    pub llama_parse_max_polls: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arxiv_api_url: "http://export.arxiv.org/api/query".to_string(),
            pdf_base_url: "https://arxiv.org/pdf".to_string(),
            api_delay_secs: 3.0,
            max_results: 100,
            page_size: 100,
            default_category: "cs.AI".to_string(),
            query_combinations: Vec::new(),
            request_timeout_secs: 60,
            cache_file: PathBuf::from(".arxiv_cache.json"),
            cache_duration_secs: 3600,
            max_abstract_length: 500,
            papers_dir: PathBuf::from("papers"),
            summaries_file: PathBuf::from("paper_summaries.json"),
            openai_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            summary_max_tokens: 600,
            summary_content_limit: 15000,
            parser_backend: ParserBackend::LlamaParse,
            llama_cloud_api_key: None,
            llama_parse_base_url: "https://api.cloud.llamaindex.ai/api/parsing".to_string(),
            llama_parse_poll_secs: 3,
            llama_parse_max_polls: 200,
        }
    }
}

/// TOML 文件中允许出现的字段（全部可选）
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    arxiv_api_url: Option<String>,
    pdf_base_url: Option<String>,
    api_delay_secs: Option<f64>,
    max_results: Option<usize>,
    page_size: Option<usize>,
    default_category: Option<String>,
    query_combinations: Option<Vec<CategoryFilter>>,
    request_timeout_secs: Option<u64>,
    cache_file: Option<PathBuf>,
    cache_duration_secs: Option<u64>,
    max_abstract_length: Option<usize>,
    papers_dir: Option<PathBuf>,
    summaries_file: Option<PathBuf>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    summary_max_tokens: Option<u32>,
    summary_content_limit: Option<usize>,
    parser_backend: Option<ParserBackend>,
    llama_parse_base_url: Option<String>,
    llama_parse_poll_secs: Option<u64>,
    llama_parse_max_polls: Option<usize>,
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载
    ///
    /// 配置文件路径取 `ARXIV_FETCHER_CONFIG`，否则为当前目录下的
    /// `arxiv_fetcher.toml`；文件不存在时跳过这一层。
    pub fn load() -> Result<Self> {
        let path = std::env::var("ARXIV_FETCHER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME));

        let base = if path.exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        let config = base.with_env();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载（未出现的字段使用默认值）
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let d = Self::default();
        let config = Self {
            arxiv_api_url: file.arxiv_api_url.unwrap_or(d.arxiv_api_url),
            pdf_base_url: file.pdf_base_url.unwrap_or(d.pdf_base_url),
            api_delay_secs: file.api_delay_secs.unwrap_or(d.api_delay_secs),
            max_results: file.max_results.unwrap_or(d.max_results),
            page_size: file.page_size.unwrap_or(d.page_size),
            default_category: file.default_category.unwrap_or(d.default_category),
            query_combinations: file.query_combinations.unwrap_or(d.query_combinations),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(d.request_timeout_secs),
            cache_file: file.cache_file.unwrap_or(d.cache_file),
            cache_duration_secs: file.cache_duration_secs.unwrap_or(d.cache_duration_secs),
            max_abstract_length: file.max_abstract_length.unwrap_or(d.max_abstract_length),
            papers_dir: file.papers_dir.unwrap_or(d.papers_dir),
            summaries_file: file.summaries_file.unwrap_or(d.summaries_file),
            openai_api_key: None,
            llm_api_base_url: file.llm_api_base_url.unwrap_or(d.llm_api_base_url),
            llm_model_name: file.llm_model_name.unwrap_or(d.llm_model_name),
            summary_max_tokens: file.summary_max_tokens.unwrap_or(d.summary_max_tokens),
            summary_content_limit: file
                .summary_content_limit
                .unwrap_or(d.summary_content_limit),
            parser_backend: file.parser_backend.unwrap_or(d.parser_backend),
            llama_cloud_api_key: None,
            llama_parse_base_url: file.llama_parse_base_url.unwrap_or(d.llama_parse_base_url),
            llama_parse_poll_secs: file.llama_parse_poll_secs.unwrap_or(d.llama_parse_poll_secs),
            llama_parse_max_polls: file.llama_parse_max_polls.unwrap_or(d.llama_parse_max_polls),
        };
        config.validate()?;
        Ok(config)
    }

    /// 只用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖当前值；无法解析的值保留原值
    pub fn with_env(self) -> Self {
        Self {
            arxiv_api_url: env_or("ARXIV_API_URL", self.arxiv_api_url),
            pdf_base_url: env_or("ARXIV_PDF_BASE_URL", self.pdf_base_url),
            api_delay_secs: env_parse("API_DELAY", self.api_delay_secs),
            max_results: env_parse("MAX_RESULTS", self.max_results),
            page_size: env_parse("PAGE_SIZE", self.page_size),
            default_category: env_or("DEFAULT_CATEGORY", self.default_category),
            query_combinations: self.query_combinations,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT", self.request_timeout_secs),
            cache_file: env_or("CACHE_FILE", self.cache_file.display().to_string()).into(),
            cache_duration_secs: env_parse("CACHE_DURATION", self.cache_duration_secs),
            max_abstract_length: env_parse("MAX_ABSTRACT_LENGTH", self.max_abstract_length),
            papers_dir: env_or("PAPERS_DIR", self.papers_dir.display().to_string()).into(),
            summaries_file: env_or("SUMMARIES_FILE", self.summaries_file.display().to_string())
                .into(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().or(self.openai_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", self.llm_model_name),
            summary_max_tokens: env_parse("SUMMARY_MAX_TOKENS", self.summary_max_tokens),
            summary_content_limit: env_parse("SUMMARY_CONTENT_LIMIT", self.summary_content_limit),
            parser_backend: env_parse("PARSER_BACKEND", self.parser_backend),
            llama_cloud_api_key: std::env::var("LLAMA_CLOUD_API_KEY")
                .ok()
                .or(self.llama_cloud_api_key),
            llama_parse_base_url: env_or("LLAMA_PARSE_BASE_URL", self.llama_parse_base_url),
            llama_parse_poll_secs: env_parse("LLAMA_PARSE_POLL_SECS", self.llama_parse_poll_secs),
            llama_parse_max_polls: env_parse("LLAMA_PARSE_MAX_POLLS", self.llama_parse_max_polls),
        }
    }

    /// 检查数值配置能否使用
    ///
    /// `api_delay_secs` 必须是有限值且能表示为 `Duration`（负数按 0 处理）
    pub fn validate(&self) -> AppResult<()> {
        let delay = self.api_delay_secs;
        if !delay.is_finite() || Duration::try_from_secs_f64(delay.max(0.0)).is_err() {
            return Err(AppError::InvalidArgument(format!(
                "api_delay_secs 必须是有限的秒数: {}",
                delay
            )));
        }
        Ok(())
    }

    /// 需要 LLM 的阶段在启动时调用
    pub fn require_openai_key(&self) -> AppResult<&str> {
        require(self.openai_api_key.as_deref(), "OPENAI_API_KEY")
    }

    /// LlamaParse 后端在启动时调用
    pub fn require_llama_key(&self) -> AppResult<&str> {
        require(self.llama_cloud_api_key.as_deref(), "LLAMA_CLOUD_API_KEY")
    }

    /// 下载记录文件路径
    pub fn download_log_path(&self) -> PathBuf {
        self.papers_dir.join(".download_log.json")
    }

    /// 解析记录文件路径
    pub fn parse_log_path(&self) -> PathBuf {
        self.papers_dir.join(".parse_log.json")
    }
}

fn require<'a>(value: Option<&'a str>, var_name: &str) -> AppResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingCredential {
            var_name: var_name.to_string(),
        }),
    }
}

fn env_or(name: &str, current: String) -> String {
    std::env::var(name).unwrap_or(current)
}

fn env_parse<T: FromStr>(name: &str, current: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(current)
}
