//! End-of-run summary for a crawl pass

use crate::crawler::CrawlReport;

/// Renders a crawl report as plain text
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("Site: {}\n", report.site));
    out.push_str(&format!("Listing: {}\n", report.listing_url));
    out.push_str(&format!(
        "Matches: {} listed, {} stored, {} failed\n",
        report.listed,
        report.stored,
        report.failures.len()
    ));
    out.push_str(&format!(
        "Batches: {} in {:.1}s\n",
        report.batches,
        report.elapsed.as_secs_f64()
    ));

    if !report.mismatches.is_empty() {
        out.push_str(&format!(
            "\nSkipped listing entries ({}):\n",
            report.mismatches.len()
        ));
        for mismatch in &report.mismatches {
            out.push_str(&format!("  - entry {}: {}\n", mismatch.entry, mismatch.detail));
        }
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("\nFailed matches ({}):\n", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!("  - [{}] {}\n", failure.stage, failure.url));
            out.push_str(&format!("      {}\n", failure.error));
        }
    }

    out
}

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_report(report));
}
