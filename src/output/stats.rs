//! Fetch statistics reporting
//!
//! This module renders the counters collected by the content fetcher and a
//! short summary of a finished crawl.

use super::OutputResult;
use crate::crawler::{CrawlReport, FetchStatistics};
use std::io::Write;

/// Writes fetch statistics in a formatted manner
///
/// # Arguments
///
/// * `out` - Destination for the report
/// * `stats` - The statistics to display
pub fn write_statistics(out: &mut impl Write, stats: &FetchStatistics) -> OutputResult<()> {
    writeln!(out, "=== Fetch Statistics ===\n")?;

    writeln!(out, "Overview:")?;
    writeln!(out, "  Pages requested: {}", stats.requested)?;
    writeln!(out, "  Pages with content: {}", stats.succeeded)?;
    writeln!(out, "  Pages without content: {}", stats.failed)?;
    if stats.crashed_chunks > 0 {
        writeln!(out, "  Crashed chunks: {}", stats.crashed_chunks)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Elapsed: {:.2}s ({:.2} pages/s)",
        stats.elapsed.as_secs_f64(),
        stats.pages_per_second()
    )?;

    let success_rate = if stats.requested > 0 {
        (stats.succeeded as f64 / stats.requested as f64) * 100.0
    } else {
        0.0
    };
    writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        success_rate, stats.succeeded, stats.requested
    )?;

    Ok(())
}

/// Writes a one-block summary of a crawl report
pub fn write_report_summary(out: &mut impl Write, report: &CrawlReport) -> OutputResult<()> {
    writeln!(out, "=== Crawl of {} ===\n", report.domain)?;

    if let Some(error) = &report.error {
        writeln!(out, "Error: {}", error)?;
        return Ok(());
    }

    let source = if report.from_cache { "cache" } else { "network" };
    writeln!(out, "Source: {}", source)?;
    writeln!(out, "Links found: {}", report.bundle.links.len())?;
    writeln!(out, "Conventional tree nodes: {}", report.bundle.conventional_tree.len())?;
    writeln!(out, "Enhanced tree nodes: {}", report.bundle.enhanced_tree.len())?;
    writeln!(out, "Pages with content: {}", report.bundle.pages.len())?;

    if let Some(stats) = &report.stats {
        writeln!(out)?;
        write_statistics(out, stats)?;
    }

    Ok(())
}
