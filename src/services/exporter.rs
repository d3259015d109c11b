//! 论文集导出 / 导入
//!
//! JSON：`{"metadata": {...}, "papers": [...]}`
//! CSV：`title,authors,published,categories,summary,link`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::infrastructure::json_store;
use crate::models::{PaperRecord, PaperSet};

/// 缺少扩展名时补上
pub fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
    let matches = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false);
    if matches {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

/// 导出为 JSON
///
/// # 参数
/// - `papers`: 论文（抓取记录或分析结果）
/// - `path`: 输出路径，缺少 `.json` 时自动补上
/// - `min_relevance`: 分析阶段的阈值，写入 metadata
///
/// # 返回
/// 实际写入的路径
pub fn export_json<T: Serialize + Clone>(
    papers: &[T],
    path: &Path,
    min_relevance: Option<f64>,
) -> AppResult<PathBuf> {
    let path = ensure_extension(path, "json");
    let mut set = PaperSet::new(papers.to_vec());
    set.metadata.min_relevance_score = min_relevance;
    json_store::write_json_atomic(&path, &set, true)?;
    Ok(path)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    authors: String,
    published: String,
    categories: String,
    summary: &'a str,
    link: &'a str,
}

/// 导出为 CSV
pub fn export_csv(papers: &[PaperRecord], path: &Path) -> AppResult<PathBuf> {
    let path = ensure_extension(path, "csv");
    let mut writer = csv::Writer::from_writer(Vec::new());

    for paper in papers {
        writer
            .serialize(CsvRow {
                title: &paper.title,
                authors: paper.authors.join("; "),
                published: paper.published_date().format("%Y-%m-%d").to_string(),
                categories: paper.categories.join(", "),
                summary: &paper.summary,
                link: &paper.link,
            })
            .map_err(|e| AppError::io(&path, e.into()))?;
    }

    // 没有数据行时 serialize 不会写表头
    let bytes = if papers.is_empty() {
        b"title,authors,published,categories,summary,link\n".to_vec()
    } else {
        writer
            .into_inner()
            .map_err(|e| AppError::io(&path, e.into_error()))?
    };

    json_store::write_bytes_atomic(&path, &bytes)?;
    Ok(path)
}

#[derive(Deserialize)]
struct PapersOnly<T> {
    papers: Vec<T>,
}

/// 读取导出的 JSON 论文集（忽略 metadata）
///
/// # 返回
/// 文件不存在时返回 `FileNotFound`
pub fn read_paper_set<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let set: PapersOnly<T> = json_store::read_required_json(path)?;
    Ok(set.papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::fixtures;

    #[test]
    fn test_extension_added_only_when_missing() {
        assert_eq!(ensure_extension(Path::new("out"), "json"), PathBuf::from("out.json"));
        assert_eq!(
            ensure_extension(Path::new("out.JSON"), "json"),
            PathBuf::from("out.JSON")
        );
        assert_eq!(
            ensure_extension(Path::new("papers.v2"), "csv"),
            PathBuf::from("papers.v2.csv")
        );
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sample = fixtures::sample();
        let second = fixtures::paper("Second", "2401.00002", sample.published);
        let papers = vec![sample, second];

        let written = export_json(&papers, &dir.path().join("papers"), None).unwrap();
        assert_eq!(written, dir.path().join("papers.json"));

        let back: Vec<PaperRecord> = read_paper_set(&written).unwrap();
        assert_eq!(back, papers);

        let raw: serde_json::Value = json_store::read_json(&written).unwrap().unwrap();
        assert_eq!(raw["metadata"]["paper_count"], 2);
        assert_eq!(raw["metadata"]["export_format_version"], "1.0");
        assert!(raw["metadata"].get("min_relevance_score").is_none());
    }

    #[test]
    fn test_csv_joins_lists() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&[fixtures::sample()], &dir.path().join("papers.csv")).unwrap();

        let mut reader = csv::Reader::from_path(&written).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["title", "authors", "published", "categories", "summary", "link"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "A; B");
        assert_eq!(&row[2], "2024-01-22");
        assert_eq!(&row[3], "cs.AI, cs.HC");
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&[], &dir.path().join("empty")).unwrap();
        let content = std::fs::read_to_string(written).unwrap();
        assert!(content.starts_with("title,authors"));
    }

    #[test]
    fn test_missing_input_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result: AppResult<Vec<PaperRecord>> = read_paper_set(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(AppError::FileNotFound { .. })));
    }
}
