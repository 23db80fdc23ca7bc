//! Markdown export of the accessible sites
//!
//! Produces a human-readable table of every site in the stored set.

use crate::output::stats::summarize;
use crate::storage::AccessibleSiteSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `set` to `output_path`
pub fn generate_markdown_summary(set: &AccessibleSiteSet, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(set);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the accessible sites as markdown
pub fn format_markdown_summary(set: &AccessibleSiteSet) -> String {
    let summary = summarize(set);
    let mut md = String::new();

    md.push_str("# Accessible Onion Sites\n\n");

    md.push_str(&format!("- **Total**: {}\n", summary.total_sites));
    if let Some(ts) = summary.last_updated {
        md.push_str(&format!("- **Last Updated**: {}\n", ts.to_rfc3339()));
    }
    if let Some(mean) = summary.mean_response_secs {
        md.push_str(&format!("- **Mean Response Time**: {:.2}s\n", mean));
    }
    md.push('\n');

    if set.is_empty() {
        md.push_str("_No accessible sites recorded._\n");
        return md;
    }

    md.push_str("| Domain | Title | Response Time | Tested At |\n");
    md.push_str("|--------|-------|---------------|-----------|\n");
    for entry in set.entries() {
        md.push_str(&format!(
            "| [{}]({}) | {} | {:.2}s | {} |\n",
            entry.address(),
            entry.entry.url,
            escape_cell(&entry.entry.text),
            entry.response_time_secs,
            entry.tested_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    md
}

/// Keeps link text from breaking the table layout
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}
