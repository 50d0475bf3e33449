//! Terminal rendering of search results.

use comfy_table::{Attribute, Cell, Table};
use unicode_width::UnicodeWidthChar;

use crate::models::{Article, SearchResult};

const TITLE_WIDTH: usize = 60;
const AUTHORS_WIDTH: usize = 32;

/// Truncate text to fit within the specified display width.
///
/// Wide characters count double; an ellipsis is appended when the text was cut.
///
/// ```
/// use scholar_aggregator::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let width = |c: char| c.width().unwrap_or(1);
    if text.chars().map(width).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        if used + width(c) > budget {
            break;
        }
        used += width(c);
        truncated.push(c);
    }

    format!("{}...", truncated.trim_end())
}

/// Compact author line: first two names, then "et al."
fn author_summary(article: &Article) -> String {
    match article.authors.as_slice() {
        [] => String::from("-"),
        [one] => one.clone(),
        [first, second] => format!("{}, {}", first, second),
        [first, second, ..] => format!("{}, {} et al.", first, second),
    }
}

/// Render articles as a table with title, authors, date and source columns
pub fn render_table(result: &SearchResult) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Title", "Authors", "Date", "Source"]);

    for (i, article) in result.articles.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_with_ellipsis(&article.title, TITLE_WIDTH))
                .add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&author_summary(article), AUTHORS_WIDTH)),
            Cell::new(&article.pubdate),
            Cell::new(article.source.to_string()),
        ]);
    }

    table.to_string()
}
