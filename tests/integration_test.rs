use arxiv_fetcher::clients::ArxivClient;
use arxiv_fetcher::config::{Config, ParserBackend};
use arxiv_fetcher::error::{AppError, AppResult};
use arxiv_fetcher::infrastructure::{DownloadEntry, JobLog, RateLimiter, SummaryEntry};
use arxiv_fetcher::models::{Analysis, PaperRecord};
use arxiv_fetcher::orchestrator::{selection, FetchRequest, PipelineOrchestrator, Selection};
use arxiv_fetcher::services::exporter;
use arxiv_fetcher::services::{DocumentExtractor, RelevanceScorer, Summarizer};
use async_trait::async_trait;
use chrono::{Duration, Local, SecondsFormat, Utc};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ========== 测试工具 ==========

fn atom_entry(id: &str, title: &str, days_ago: i64) -> String {
    let published = (Utc::now() - Duration::days(days_ago)).to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}</id>
    <published>{published}</published>
    <title>{title}</title>
    <summary>About {title}.</summary>
    <author><name>A</name></author>
    <author><name>B</name></author>
    <category term="cs.AI"/>
  </entry>"#
    )
}

fn atom_feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  {}
</feed>"#,
        entries.join("\n")
    )
}

fn test_config(dir: &Path, server: &MockServer) -> Config {
    Config {
        arxiv_api_url: format!("{}/api/query", server.uri()),
        pdf_base_url: format!("{}/pdf", server.uri()),
        api_delay_secs: 0.0,
        cache_file: dir.join(".arxiv_cache.json"),
        papers_dir: dir.join("papers"),
        summaries_file: dir.join("paper_summaries.json"),
        parser_backend: ParserBackend::Local,
        ..Config::default()
    }
}

async fn mount_feed(server: &MockServer, expected_calls: u64) {
    let feed = atom_feed(&[
        atom_entry("2401.11111v1", "Fresh Agents", 1),
        atom_entry("2401.22222v1", "Stale Agents", 10),
    ]);
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "cat:cs.AI"))
        .and(query_param("sortBy", "submittedDate"))
        .and(query_param("sortOrder", "descending"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_pdf(server: &MockServer, id: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/pdf/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 fake pdf".to_vec()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

struct KeywordScorer;

#[async_trait]
impl RelevanceScorer for KeywordScorer {
    async fn score(&self, paper: &PaperRecord) -> AppResult<Analysis> {
        let relevant = paper.title.contains("Agents");
        Ok(Analysis {
            is_relevant: relevant,
            relevance_score: if relevant { 0.9 } else { 0.1 },
            practical_applications: "stub".to_string(),
            thought_leadership_value: "stub".to_string(),
            key_insights: vec!["stub".to_string()],
        })
    }
}

struct EchoExtractor;

#[async_trait]
impl DocumentExtractor for EchoExtractor {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn extract(&self, pdf_path: &Path) -> AppResult<String> {
        Ok(format!("# Parsed {}", pdf_path.display()))
    }
}

struct LengthSummarizer;

#[async_trait]
impl Summarizer for LengthSummarizer {
    async fn summarize(&self, content: &str) -> AppResult<String> {
        Ok(format!("{} chars", content.chars().count()))
    }
}

// ========== fetch ==========

#[tokio::test]
async fn test_fetch_keeps_only_in_window_entries() {
    let server = MockServer::start().await;
    mount_feed(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);

    let client = ArxivClient::new(&config, Arc::new(RateLimiter::from_secs_f64(0.0).unwrap())).unwrap();
    let papers = client.fetch_papers(7, 50, &[]).await.unwrap();

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Fresh Agents");
    assert_eq!(papers[0].combination.as_deref(), Some("cs.AI"));
}

#[tokio::test]
async fn test_fetch_server_error_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);

    let client = ArxivClient::new(&config, Arc::new(RateLimiter::from_secs_f64(0.0).unwrap())).unwrap();
    let err = client.fetch_papers(7, 50, &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Network { .. }));
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_feed(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = PipelineOrchestrator::new(test_config(dir.path(), &server)).unwrap();

    let request = FetchRequest {
        days: 7,
        use_cache: true,
        export_json: Some(dir.path().join("papers_export")),
        ..Default::default()
    };

    let first = orchestrator.run_fetch(request.clone()).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.exported, vec![dir.path().join("papers_export.json")]);

    let second = orchestrator.run_fetch(request).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.papers, first.papers);
}

// ========== download ==========

#[tokio::test]
async fn test_download_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_pdf(&server, "2401.12345v1", 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);
    let papers_dir = config.papers_dir.clone();
    let orchestrator = PipelineOrchestrator::new(config).unwrap();

    let input = dir.path().join("analyzed.json");
    std::fs::write(
        &input,
        serde_json::to_string(&json!({
            "metadata": {"paper_count": 2},
            "papers": [
                {"title": "Agents: In the Loop", "link": "http://arxiv.org/abs/2401.12345v1", "analysis": {"relevance_score": 0.9}},
                {"title": "No Identifier Here", "summary": "missing"}
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    let first = orchestrator.run_download(&input, None).await.unwrap();
    assert_eq!(first.completed, 1);
    assert_eq!(first.failed, 1);

    let second = orchestrator.run_download(&input, None).await.unwrap();
    assert_eq!(second.completed, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.failed, 1);

    let dirs: Vec<_> = std::fs::read_dir(&papers_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    assert_eq!(dirs.len(), 1);

    let paper_dir = papers_dir.join("Agents_ In the Loop");
    assert!(paper_dir.join("paper.pdf").exists());
    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(paper_dir.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["analysis"]["relevance_score"], 0.9);

    let log: JobLog<DownloadEntry> = JobLog::open(papers_dir.join(".download_log.json"), "papers").unwrap();
    assert_eq!(log.len(), 1);
    assert!(log.is_complete("2401.12345v1"));
}

#[tokio::test]
async fn test_non_pdf_response_is_not_logged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf/2401.99999"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);
    let papers_dir = config.papers_dir.clone();
    let orchestrator = PipelineOrchestrator::new(config).unwrap();

    let input = dir.path().join("analyzed.json");
    std::fs::write(
        &input,
        r#"{"papers": [{"title": "Blocked", "arxiv_id": "2401.99999"}]}"#,
    )
    .unwrap();

    let stats = orchestrator.run_download(&input, None).await.unwrap();
    assert_eq!(stats.failed, 1);

    let log: JobLog<DownloadEntry> = JobLog::open(papers_dir.join(".download_log.json"), "papers").unwrap();
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_blank_title_downloads_into_id_folder() {
    let server = MockServer::start().await;
    mount_pdf(&server, "2401.12345v1", 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);
    let papers_dir = config.papers_dir.clone();
    let orchestrator = PipelineOrchestrator::new(config).unwrap();

    let input = dir.path().join("analyzed.json");
    std::fs::write(
        &input,
        r#"{"papers": [{"title": "  ", "link": "http://arxiv.org/abs/2401.12345v1"}]}"#,
    )
    .unwrap();

    let stats = orchestrator.run_download(&input, None).await.unwrap();
    assert_eq!(stats.completed, 1);
    assert!(!papers_dir.join("paper.pdf").exists());
    assert!(!papers_dir.join("metadata.json").exists());
    assert!(papers_dir.join("2401_12345v1").join("paper.pdf").exists());

    let today = Selection::Date(Local::now().date_naive());
    let folders = selection::select_summary_folders(&papers_dir.join(".download_log.json"), &today).unwrap();
    assert_eq!(folders, vec!["2401_12345v1".to_string()]);
}

#[tokio::test]
async fn test_download_missing_input_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = PipelineOrchestrator::new(test_config(dir.path(), &server)).unwrap();
    assert!(orchestrator
        .run_download(&dir.path().join("absent.json"), None)
        .await
        .is_err());
}

// ========== 全流程 ==========

#[tokio::test]
async fn test_stub_pipeline_end_to_end() {
    let server = MockServer::start().await;
    mount_pdf(&server, "2401.00001v1", 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);
    let summaries_file = config.summaries_file.clone();
    let orchestrator = PipelineOrchestrator::new(config).unwrap();

    // fetch 的导出结果
    let published = Utc::now();
    let papers = vec![
        PaperRecord {
            title: "Agents for Everyone".to_string(),
            authors: vec!["A".to_string()],
            published,
            summary: "s".to_string(),
            link: "http://arxiv.org/abs/2401.00001v1".to_string(),
            categories: vec!["cs.AI".to_string()],
            combination: None,
        },
        PaperRecord {
            title: "Quantum Soup".to_string(),
            authors: vec!["B".to_string()],
            published,
            summary: "s".to_string(),
            link: "http://arxiv.org/abs/2401.00002v1".to_string(),
            categories: vec!["quant-ph".to_string()],
            combination: None,
        },
    ];
    let fetched = exporter::export_json(&papers, &dir.path().join("fetched.json"), None).unwrap();

    // analyze
    let analyzed_path = dir.path().join("analyzed.json");
    let outcome = orchestrator
        .run_analyze(&KeywordScorer, &fetched, &analyzed_path, 0.7)
        .await
        .unwrap();
    assert_eq!(outcome.analyzed, 2);
    assert_eq!(outcome.relevant.len(), 1);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&analyzed_path).unwrap()).unwrap();
    assert_eq!(raw["metadata"]["min_relevance_score"], 0.7);
    assert_eq!(raw["papers"][0]["analysis"]["is_relevant"], true);

    // download
    let downloaded = orchestrator.run_download(&analyzed_path, None).await.unwrap();
    assert_eq!(downloaded.completed, 1);

    // parse（按今天的下载日期）
    let today = Selection::Date(Local::now().date_naive());
    let parsed = orchestrator.run_parse(&EchoExtractor, &today, false).await.unwrap();
    assert_eq!(parsed.completed, 1);
    let parsed_again = orchestrator.run_parse(&EchoExtractor, &today, false).await.unwrap();
    assert_eq!(parsed_again.skipped, 1);

    // summarize
    let summarized = orchestrator.run_summarize(&LengthSummarizer, &today).await.unwrap();
    assert_eq!(summarized.completed, 1);
    let summarized_again = orchestrator.run_summarize(&LengthSummarizer, &today).await.unwrap();
    assert_eq!(summarized_again.skipped, 1);

    let summaries: JobLog<SummaryEntry> = JobLog::open(&summaries_file, "summaries").unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(summaries.is_complete("Agents for Everyone"));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summaries_file).unwrap()).unwrap();
    assert!(raw["last_updated"].is_string());
}

#[tokio::test]
async fn test_summarize_titles_with_missing_markdown_continues() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &server);
    let ready = config.papers_dir.join("Ready Paper");
    std::fs::create_dir_all(&ready).unwrap();
    std::fs::write(ready.join("parsed_paper.md"), "content").unwrap();
    let orchestrator = PipelineOrchestrator::new(config).unwrap();

    let selection = Selection::Titles(vec!["Missing Paper".to_string(), "Ready Paper".to_string()]);
    let stats = orchestrator
        .run_summarize(&LengthSummarizer, &selection)
        .await
        .unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.completed, 1);
}
