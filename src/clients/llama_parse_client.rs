//! LlamaParse REST 客户端
//!
//! 流程：上传 PDF → 轮询作业状态 → 取回 markdown 结果。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::arxiv_client::USER_AGENT;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

/// LlamaParse 客户端
pub struct LlamaParseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: usize,
}

impl LlamaParseClient {
    /// 创建客户端
    ///
    /// # 返回
    /// 未设置 `LLAMA_CLOUD_API_KEY` 时返回 `MissingCredential`
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.require_llama_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::network(&config.llama_parse_base_url, e))?;

        Ok(Self {
            http,
            base_url: config.llama_parse_base_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval: Duration::from_secs(config.llama_parse_poll_secs),
            max_polls: config.llama_parse_max_polls.max(1),
        })
    }

    /// 把一个 PDF 转成 markdown
    ///
    /// # 参数
    /// - `pdf_path`: 本地 PDF 路径
    ///
    /// # 返回
    /// 解析得到的 markdown 文本
    pub async fn parse_to_markdown(&self, pdf_path: &Path) -> AppResult<String> {
        let job_id = self.upload(pdf_path).await?;
        info!("📤 已上传，LlamaParse 作业: {}", job_id);

        self.wait_for_job(&job_id, pdf_path).await?;
        self.fetch_markdown(&job_id).await
    }

    async fn upload(&self, pdf_path: &Path) -> AppResult<String> {
        let endpoint = format!("{}/upload", self.base_url);
        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| AppError::io(pdf_path, e))?;

        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "paper.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| AppError::network(&endpoint, e))?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(&endpoint, e))?
            .json()
            .await
            .map_err(|e| AppError::malformed(&endpoint, e.to_string()))?;

        Ok(response.id)
    }

    async fn wait_for_job(&self, job_id: &str, pdf_path: &Path) -> AppResult<()> {
        let endpoint = format!("{}/job/{}", self.base_url, job_id);

        for attempt in 1..=self.max_polls {
            let status: JobStatus = self
                .http
                .get(&endpoint)
                .bearer_auth(&self.api_key)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| AppError::network(&endpoint, e))?
                .json()
                .await
                .map_err(|e| AppError::malformed(&endpoint, e.to_string()))?;

            match status.status.as_str() {
                "SUCCESS" => return Ok(()),
                "ERROR" | "CANCELED" | "CANCELLED" => {
                    return Err(AppError::extraction(
                        pdf_path,
                        status
                            .error_message
                            .unwrap_or_else(|| format!("LlamaParse 作业状态: {}", status.status)),
                    ))
                }
                other => {
                    debug!("作业 {} 状态 {} (第 {} 次轮询)", job_id, other, attempt);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(AppError::extraction(
            pdf_path,
            format!("LlamaParse 作业 {} 在 {} 次轮询后仍未完成", job_id, self.max_polls),
        ))
    }

    async fn fetch_markdown(&self, job_id: &str) -> AppResult<String> {
        let endpoint = format!("{}/job/{}/result/markdown", self.base_url, job_id);
        let result: MarkdownResult = self
            .http
            .get(&endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(&endpoint, e))?
            .json()
            .await
            .map_err(|e| AppError::malformed(&endpoint, e.to_string()))?;
        Ok(result.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config {
            llama_cloud_api_key: Some("llx-test".to_string()),
            llama_parse_base_url: server.uri(),
            llama_parse_poll_secs: 0,
            llama_parse_max_polls: 3,
            ..Config::default()
        }
    }

    fn write_pdf(dir: &Path) -> std::path::PathBuf {
        let pdf = dir.join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 test").unwrap();
        pdf
    }

    #[tokio::test]
    async fn test_upload_poll_and_fetch_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("authorization", "Bearer llx-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-1", "status": "PENDING"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-1", "status": "SUCCESS"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/job-1/result/markdown"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"markdown": "# Title\n\nBody"})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = LlamaParseClient::new(&config_for(&server)).unwrap();
        let markdown = client.parse_to_markdown(&write_pdf(dir.path())).await.unwrap();
        assert_eq!(markdown, "# Title\n\nBody");
    }

    #[tokio::test]
    async fn test_job_error_is_extraction_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-2"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/job-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ERROR", "error_message": "bad pdf"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = LlamaParseClient::new(&config_for(&server)).unwrap();
        let err = client.parse_to_markdown(&write_pdf(dir.path())).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
        assert!(err.to_string().contains("bad pdf"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_polls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-3"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/job-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING"})))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = LlamaParseClient::new(&config_for(&server)).unwrap();
        assert!(client.parse_to_markdown(&write_pdf(dir.path())).await.is_err());
    }

    #[test]
    fn test_requires_llama_key() {
        assert!(matches!(
            LlamaParseClient::new(&Config::default()),
            Err(AppError::MissingCredential { .. })
        ));
    }
}
