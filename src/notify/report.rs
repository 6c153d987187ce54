//! Email rendering for diff reports and run failures.

use chrono::{DateTime, Utc};

use crate::models::ProductEntry;
use crate::pipeline::DiffReport;
use crate::utils::html_escape;

/// Subject line of a change report.
pub fn report_subject(prefix: &str, report: &DiffReport) -> String {
    format!(
        "{} Update: {} New, {} Removed",
        prefix,
        report.added_count(),
        report.removed_count()
    )
}

/// HTML body of a change report covering every category.
pub fn report_body(prefix: &str, report: &DiffReport, now: DateTime<Utc>) -> String {
    let mut body = format!(
        "<h2>{} Update</h2>\n<p>Date: {}</p>\n",
        html_escape(prefix),
        format_time(now)
    );

    for category in &report.categories {
        let name = html_escape(&category.category.name);
        body.push_str(&format!(
            "<h3>New in {} ({}):</h3>\n{}",
            name,
            category.diff.added.len(),
            entry_list(&category.diff.added)
        ));
        body.push_str(&format!(
            "<h3>No longer in {} ({}):</h3>\n{}",
            name,
            category.diff.removed.len(),
            entry_list(&category.diff.removed)
        ));
    }

    body
}

/// Subject line of a failure email.
pub fn error_subject(prefix: &str) -> String {
    format!("{prefix} Monitor Error")
}

/// HTML body of a failure email.
pub fn error_body(prefix: &str, message: &str, now: DateTime<Utc>) -> String {
    format!(
        "<h2>{} Monitor Error</h2>\n<p>Date: {}</p>\n<p>Error Message: {}</p>\n\
         <p>Please check the website and the monitor service.</p>\n",
        html_escape(prefix),
        format_time(now),
        html_escape(message)
    )
}

fn entry_list(entries: &[ProductEntry]) -> String {
    let items: String = entries
        .iter()
        .map(|entry| {
            let stock = entry
                .stock_status
                .as_deref()
                .map(|s| format!(" ({})", html_escape(s)))
                .unwrap_or_default();
            format!(
                "<li><a href=\"{}\">{}</a> - {}{}</li>\n",
                html_escape(&entry.url),
                html_escape(&entry.title),
                html_escape(&entry.price),
                stock
            )
        })
        .collect();
    format!("<ul>\n{items}</ul>\n")
}

fn format_time(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
