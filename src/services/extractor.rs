//! PDF 转文本 - 业务能力层
//!
//! 两种后端：
//! - `LlamaParseExtractor`：远程服务，输出 markdown
//! - `LocalPdfExtractor`：本地 `pdf-extract`，输出纯文本

use async_trait::async_trait;
use std::path::Path;

use crate::clients::LlamaParseClient;
use crate::config::{Config, ParserBackend};
use crate::error::{AppError, AppResult};

/// 文档转文本能力
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// 后端名称（日志用）
    fn name(&self) -> &'static str;

    async fn extract(&self, pdf_path: &Path) -> AppResult<String>;
}

/// LlamaParse 后端
pub struct LlamaParseExtractor {
    client: LlamaParseClient,
}

impl LlamaParseExtractor {
    pub fn new(client: LlamaParseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentExtractor for LlamaParseExtractor {
    fn name(&self) -> &'static str {
        "LlamaParse"
    }

    async fn extract(&self, pdf_path: &Path) -> AppResult<String> {
        self.client.parse_to_markdown(pdf_path).await
    }
}

/// 本地 pdf-extract 后端
#[derive(Debug, Default)]
pub struct LocalPdfExtractor;

#[async_trait]
impl DocumentExtractor for LocalPdfExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    async fn extract(&self, pdf_path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| AppError::io(pdf_path, e))?;

        // pdf-extract 是同步 CPU 密集操作
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| AppError::extraction(pdf_path, e.to_string()))?
        .map_err(|message| AppError::extraction(pdf_path, message))?;

        if text.trim().is_empty() {
            return Err(AppError::extraction(pdf_path, "未提取到任何文本"));
        }
        Ok(text)
    }
}

/// 按配置创建解析后端
///
/// # 返回
/// LlamaParse 后端缺少凭据时返回 `MissingCredential`
pub fn build_extractor(config: &Config) -> AppResult<Box<dyn DocumentExtractor>> {
    match config.parser_backend {
        ParserBackend::LlamaParse => Ok(Box::new(LlamaParseExtractor::new(
            LlamaParseClient::new(config)?,
        ))),
        ParserBackend::Local => Ok(Box::new(LocalPdfExtractor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection() {
        let local = Config {
            parser_backend: ParserBackend::Local,
            ..Config::default()
        };
        assert_eq!(build_extractor(&local).unwrap().name(), "pdf-extract");

        let remote = Config {
            parser_backend: ParserBackend::LlamaParse,
            llama_cloud_api_key: None,
            ..Config::default()
        };
        assert!(matches!(
            build_extractor(&remote),
            Err(AppError::MissingCredential { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_extractor_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(LocalPdfExtractor.extract(&path).await.is_err());
    }
}
