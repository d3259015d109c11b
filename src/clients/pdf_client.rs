//! PDF 下载客户端
//!
//! 与 [`ArxivClient`](super::ArxivClient) 共用同一个节流器。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::arxiv_client::USER_AGENT;

const PDF_MAGIC: &[u8] = b"%PDF";

/// PDF 下载客户端
pub struct PdfClient {
    http: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl PdfClient {
    pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::network(&config.pdf_base_url, e))?;

        Ok(Self {
            http,
            base_url: config.pdf_base_url.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    /// 论文 PDF 的地址
    pub fn pdf_url(&self, arxiv_id: &str) -> String {
        format!("{}/{}", self.base_url, arxiv_id)
    }

    /// 下载 PDF 内容
    ///
    /// # 参数
    /// - `arxiv_id`: 规范化的 arXiv ID
    ///
    /// # 返回
    /// PDF 字节；响应不是 PDF 时返回 `MalformedResponse`
    pub async fn download(&self, arxiv_id: &str) -> AppResult<Vec<u8>> {
        let url = self.pdf_url(arxiv_id);
        self.limiter.wait().await;

        debug!("下载 PDF: {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(&url, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::network(&url, e))?;

        if !bytes.starts_with(PDF_MAGIC) {
            return Err(AppError::malformed(
                &url,
                format!("响应不是 PDF 文件 ({} 字节)", bytes.len()),
            ));
        }

        debug!("PDF 下载完成: {} 字节", bytes.len());
        Ok(bytes.to_vec())
    }
}
