//! Report generation and formatting

use prettytable::{format, Cell, Row, Table};

use crate::model::{InjectedSource, Ticket};
use crate::pipeline::PipelineReport;
use crate::proportion::ProportionReport;

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    let header_cells: Vec<Cell> = headers.iter().map(|header| Cell::new(header)).collect();
    table.add_row(Row::new(header_cells));

    for row in rows {
        let data_cells: Vec<Cell> = row.iter().map(|cell| Cell::new(cell)).collect();
        table.add_row(Row::new(data_cells));
    }

    // 2-space indent under section titles
    let table_output = table.to_string();
    let mut result = String::new();
    for line in table_output.lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }

    result
}

/// Stage counts of a pipeline run
pub fn format_summary(report: &PipelineReport) -> String {
    let rows: Vec<Vec<String>> = [
        ("Releases", report.releases.to_string()),
        ("Releases without date", report.releases_rejected.to_string()),
        ("Tickets reported by tracker", report.tickets_reported.to_string()),
        ("Tickets retrieved", report.tickets.to_string()),
        ("Malformed ticket records", report.malformed_tickets.to_string()),
        ("Tickets not returned by paging", report.tickets_unreturned.to_string()),
        ("Tickets without fix version", report.fix_unknown.len().to_string()),
        ("Commits scanned", report.link.commits_scanned.to_string()),
        ("Commits without reference", report.link.commits_without_reference.to_string()),
        ("Commit attachments", report.link.attachments.to_string()),
        ("Fix versions inferred", report.link.fix_versions_inferred.to_string()),
        ("Opening versions resolved", report.opening.resolved.to_string()),
        ("Injected versions from affected", report.injected.derived.to_string()),
        ("Earliest affected is baseline", report.injected.earliest_is_baseline.to_string()),
        ("Baseline release", report.baseline.clone().unwrap_or_else(|| "-".to_string())),
    ]
    .into_iter()
    .map(|(label, value)| vec![label.to_string(), value])
    .collect();

    format_compact_table(&["Stage", "Count"], &rows)
}

/// One row per proportion run
pub fn format_proportion_table(reports: &[ProportionReport]) -> String {
    let rows: Vec<Vec<String>> = reports
        .iter()
        .map(|r| {
            vec![
                r.strategy.to_string(),
                format!("{:.3}", r.proportion.value),
                r.proportion.samples.to_string(),
                r.proportion.baseline_excluded.to_string(),
                r.forced.to_string(),
                r.estimated.to_string(),
                r.skipped.to_string(),
                r.non_estimable.len().to_string(),
            ]
        })
        .collect();

    format_compact_table(
        &["Strategy", "Proportion", "Samples", "Excluded", "Forced", "Estimated", "Skipped", "Not estimable"],
        &rows,
    )
}

/// Versions of every ticket, in retrieval order
pub fn format_ticket_table(tickets: &[Ticket]) -> String {
    let name = |release: Option<&crate::model::Release>| release.map(|r| r.name.clone()).unwrap_or_else(|| "-".to_string());

    let rows: Vec<Vec<String>> = tickets
        .iter()
        .map(|t| {
            vec![
                t.key.clone(),
                t.issue_date.format("%Y-%m-%d").to_string(),
                name(t.opening()),
                name(t.injected()),
                injected_source_label(t.injected_source()).to_string(),
                name(t.fixed()),
                t.associated_commits().len().to_string(),
            ]
        })
        .collect();

    format_compact_table(&["Ticket", "Created", "OV", "IV", "IV source", "FV", "Commits"], &rows)
}

/// Comma-separated ticket keys under a title, or nothing when empty
pub fn format_key_listing(title: &str, keys: &[String]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    format!("{} ({}):\n  {}\n", title, keys.len(), keys.join(", "))
}

/// Print the full run report on stdout
pub fn display_pipeline_report(report: &PipelineReport) {
    println!("Defect dataset summary:");
    print!("{}", format_summary(report));

    if !report.proportions.is_empty() {
        println!();
        println!("Proportion runs:");
        print!("{}", format_proportion_table(&report.proportions));
    }

    let listings = [
        ("Tickets without fix version", &report.fix_unknown),
        ("Tickets without fix version or commits", &report.link.unresolved),
        ("Tickets with commits after the last release", &report.link.no_release_after_commit),
        ("Tickets without opening version", &report.opening.missing),
        ("Tickets without a release before the earliest affected version", &report.injected.not_derivable),
    ];
    for (title, keys) in listings {
        let listing = format_key_listing(title, keys);
        if !listing.is_empty() {
            println!();
            print!("{}", listing);
        }
    }
}

fn injected_source_label(source: Option<InjectedSource>) -> &'static str {
    match source {
        Some(InjectedSource::AffectedVersions) => "affected",
        Some(InjectedSource::ForcedBaseline) => "baseline",
        Some(InjectedSource::Estimated) => "estimated",
        None => "-",
    }
}
