use std::io::{self, Write};

use ferroscreen_core::{Candidate, EnrichedCandidate};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::report::{Dashboard, Section, SectionKind};

pub fn render(dashboard: &Dashboard, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(dashboard)?
            } else {
                serde_json::to_string(dashboard)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => render_tables(&mut out, dashboard)?,
    }

    Ok(())
}

fn render_tables(out: &mut impl Write, dashboard: &Dashboard) -> io::Result<()> {
    writeln!(out, "{}", dashboard.notice)?;

    for section in &dashboard.sections {
        writeln!(out)?;
        render_section(out, section)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", dashboard.footer)
}

fn render_section(out: &mut impl Write, section: &Section) -> io::Result<()> {
    writeln!(out, "== {} ({}) ==", section.title, section.criteria)?;

    if !section.unfiltered.is_empty() {
        writeln!(out, "Candidates:")?;
        let (headers, rows) = candidate_table(section.kind, &section.unfiltered);
        write_table(out, &headers, &rows)?;
    }

    if let Some(run) = &section.run {
        writeln!(
            out,
            "Checked {} of {} candidates with {} API calls; {} passed.",
            run.checked,
            run.total,
            run.calls_made,
            run.accepted.len()
        )?;
        if !run.accepted.is_empty() {
            let (headers, rows) = accepted_table(section.kind, &run.accepted);
            write_table(out, &headers, &rows)?;
        }
    }

    for warning in &section.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}

fn candidate_table(kind: SectionKind, candidates: &[Candidate]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    match kind {
        SectionKind::Gainers => (
            vec!["Symbol", "Price", "Change %", "Volume"],
            candidates.iter().map(mover_row).collect(),
        ),
        SectionKind::Earnings => (
            vec!["Symbol", "Name", "Report date", "Fiscal end", "EPS estimate"],
            candidates.iter().map(calendar_row).collect(),
        ),
    }
}

fn accepted_table(
    kind: SectionKind,
    accepted: &[EnrichedCandidate],
) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let (mut headers, _) = candidate_table(kind, &[]);
    headers.push("Evidence");

    let rows = accepted
        .iter()
        .map(|enriched| {
            let mut row = match kind {
                SectionKind::Gainers => mover_row(&enriched.candidate),
                SectionKind::Earnings => calendar_row(&enriched.candidate),
            };
            row.push(
                enriched
                    .payloads
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            row
        })
        .collect();
    (headers, rows)
}

fn mover_row(candidate: &Candidate) -> Vec<String> {
    vec![
        candidate.symbol.to_string(),
        optional(candidate.price.map(|price| format!("${price:.2}"))),
        optional(candidate.change_percent.map(|change| format!("{change:.2}%"))),
        optional(candidate.volume.map(|volume| volume.to_string())),
    ]
}

fn calendar_row(candidate: &Candidate) -> Vec<String> {
    vec![
        candidate.symbol.to_string(),
        optional(candidate.name.clone()),
        optional(candidate.report_date.map(|date| date.to_string())),
        optional(candidate.fiscal_date_ending.map(|date| date.to_string())),
        optional(candidate.eps_estimate.map(|estimate| estimate.to_string())),
    ]
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| String::from("-"))
}

fn write_table(out: &mut impl Write, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    writeln!(out, "{}", line(headers.to_vec()))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("  ")
    )?;
    for row in rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}
