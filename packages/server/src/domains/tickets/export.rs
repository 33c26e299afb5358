//! CSV report export.
//!
//! A pure projection of report rows into spreadsheet-friendly CSV, keeping
//! the quirks the front desk relies on: a `sep=;` preamble so spreadsheet
//! apps pick the right separator, a UTF-8 BOM, CRLF line endings, and the
//! ticket code wrapped as `="P001"` so leading zeros survive the import.

use chrono::{DateTime, FixedOffset, Utc};

use super::models::Ticket;

const SEPARATOR: char = ';';
const HEADER: &str = "Number;Category;Status;Drawn;Called;Served;Station;Agent";

/// Renders report rows as a CSV document, timestamps in the given timezone.
pub fn report_csv(tickets: &[Ticket], timezone: FixedOffset) -> String {
    let mut lines = Vec::with_capacity(tickets.len() + 2);
    lines.push(format!("sep={SEPARATOR}"));
    lines.push(HEADER.to_string());

    for ticket in tickets {
        let fields = [
            // ="P001" keeps spreadsheet apps from eating the leading zeros
            format!("=\"{}\"", ticket.code()),
            ticket.category.to_string(),
            ticket.status.to_string(),
            format_timestamp(Some(ticket.drawn_at), timezone),
            format_timestamp(ticket.called_at, timezone),
            format_timestamp(ticket.served_at, timezone),
            ticket.station.clone().unwrap_or_default(),
            ticket.agent.clone().unwrap_or_default(),
        ];

        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        lines.push(row.join(&SEPARATOR.to_string()));
    }

    // BOM so Excel detects UTF-8
    format!("\u{feff}{}", lines.join("\r\n"))
}

fn format_timestamp(at: Option<DateTime<Utc>>, timezone: FixedOffset) -> String {
    match at {
        Some(at) => at
            .with_timezone(&timezone)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
