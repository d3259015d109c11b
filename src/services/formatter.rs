//! 控制台展示
//!
//! 论文按产生它的分类组合分组，每组一张表：标题、作者、日期、分类、摘要。

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::category::sorted_catalog;
use crate::models::PaperRecord;
use crate::utils::logging::truncate_text;

const TITLE_WIDTH: usize = 100;
const AUTHORS_WIDTH: usize = 50;
const UNGROUPED: &str = "未标注分类组合";

/// 论文表的列
pub const PAPER_COLUMNS: [&str; 5] = ["Title", "Authors", "Published", "Categories", "Abstract"];

/// 按分类组合分组，保持组首次出现的顺序
pub fn group_by_combination(papers: &[PaperRecord]) -> Vec<(&str, Vec<&PaperRecord>)> {
    let mut groups: Vec<(&str, Vec<&PaperRecord>)> = Vec::new();
    for paper in papers {
        let label = paper.combination.as_deref().unwrap_or(UNGROUPED);
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(paper),
            None => groups.push((label, vec![paper])),
        }
    }
    groups
}

/// 单篇论文在表中的一行（已截断）
pub fn paper_row(paper: &PaperRecord, max_abstract_length: usize) -> [String; 5] {
    [
        truncate_text(&paper.title, TITLE_WIDTH),
        truncate_text(&paper.authors.join(", "), AUTHORS_WIDTH),
        paper.published_date().to_string(),
        paper.categories.join(", "),
        truncate_text(&paper.summary, max_abstract_length),
    ]
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

/// 一个分类组合的论文表
pub fn papers_table(papers: &[&PaperRecord], max_abstract_length: usize) -> Table {
    let mut table = new_table(&PAPER_COLUMNS);
    for paper in papers {
        let [title, authors, published, categories, summary] = paper_row(paper, max_abstract_length);
        table.add_row(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new(authors).fg(Color::Green),
            Cell::new(published).fg(Color::Yellow),
            Cell::new(categories).fg(Color::Magenta),
            Cell::new(summary),
        ]);
    }
    table
}

/// 渲染论文列表
///
/// # 参数
/// - `papers`: 论文
/// - `max_abstract_length`: 摘要最多显示的字符数（含省略号）
pub fn render_papers(papers: &[PaperRecord], max_abstract_length: usize) -> String {
    if papers.is_empty() {
        return "📭 没有找到符合条件的论文\n".to_string();
    }

    let mut out = format!("📚 共找到 {} 篇论文\n", papers.len());
    for (label, members) in group_by_combination(papers) {
        out.push_str(&format!("\n🏷️  {} ({} 篇)\n", label, members.len()));
        out.push_str(&papers_table(&members, max_abstract_length).to_string());
        out.push('\n');
    }
    out
}

/// 渲染分类目录（按代码排序）
pub fn render_categories() -> String {
    let catalog = sorted_catalog();
    let mut table = new_table(&["Code", "Description"]);
    for (code, description) in &catalog {
        table.add_row(vec![
            Cell::new(code).fg(Color::Cyan),
            Cell::new(description).fg(Color::Green),
        ]);
    }
    format!("arXiv 分类目录 ({} 个)\n{}", catalog.len(), table)
}
