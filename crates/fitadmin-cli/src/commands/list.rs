use fitadmin_core::listing::{load_content_rows, paginate, ContentFilter, ContentRow, Page, PAGE_SIZE};
use fitadmin_core::routes::Route;

use crate::commands::common::Console;
use crate::error::CliError;

pub async fn run_list(
    console: &Console,
    filter: ContentFilter,
    page: usize,
    as_json: bool,
) -> Result<(), CliError> {
    console.enter(Route::ContentList)?;
    let store = console.store()?;
    let rows = load_content_rows(&store, filter).await;
    let page = paginate(&rows, page, PAGE_SIZE);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        for line in format_row_lines(&page.items) {
            println!("{line}");
        }
        println!("{}", page_footer(&page, filter));
    }

    Ok(())
}

pub fn format_row_lines(rows: &[ContentRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let id = row.id.as_deref().unwrap_or("-");
            let image = if row.image_url.is_some() { "img" } else { "" };
            format!(
                "{:>3}  {:<8}  {:<10}  {:<40}  {:>2} steps  {image}",
                row.index,
                row.kind,
                id,
                truncate(&row.name, 40),
                row.step_count
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn page_footer(page: &Page<ContentRow>, filter: ContentFilter) -> String {
    if page.total_items == 0 {
        return format!("No content ({filter})");
    }
    format!(
        "Page {} of {} ({} items, {filter})",
        page.page, page.total_pages, page.total_items
    )
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate("Squats", 10), "Squats");
        assert_eq!(truncate("Very long block name", 10), "Very lo...");
    }
}
