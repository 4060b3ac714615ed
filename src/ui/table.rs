//! Console tables for plain-mode results and the measurement history.

use super::format::{best_unit, format_ms};
use crate::history::MeasurementRecord;
use crate::meta::ConnectionInfo;
use crate::speedtest::MeasurementReport;
use crossterm::style::Stylize;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};

/// Box-drawn borders with a rule under the header and none between rows.
fn box_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[LinePosition::Top], LineSeparator::new('─', '┬', '┌', '┐'))
        .separators(&[LinePosition::Title], LineSeparator::new('─', '┼', '├', '┤'))
        .separators(&[LinePosition::Bottom], LineSeparator::new('─', '┴', '└', '┘'))
        .padding(1, 1)
        .build()
}

/// A bordered table with centered cells and alternating green rows.
pub struct TextTable {
    table: Table,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Table::new();
        table.set_format(box_format());
        table.set_titles(Row::new(
            headers
                .into_iter()
                .map(|h| Cell::new(h.as_ref()).style_spec("bc"))
                .collect(),
        ));
        Self { table }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        let style = if self.table.len() % 2 == 0 { "cFG" } else { "cFg" };
        self.table.add_row(Row::new(
            row.iter().map(|cell| Cell::new(cell).style_spec(style)).collect(),
        ));
    }

    /// Rendered lines without colors: top border, header, rule, rows, bottom border.
    pub fn lines(&self) -> Vec<String> {
        self.table.to_string().lines().map(str::to_string).collect()
    }

    pub fn print(&self, title: Option<&str>, caption: Option<&str>) {
        let width = self
            .lines()
            .first()
            .map(|l| l.chars().count())
            .unwrap_or(0);

        if let Some(title) = title {
            println!("{}", format!("{:^w$}", title, w = width).italic());
        }
        self.table.printstd();
        if let Some(caption) = caption {
            println!("{}", format!("{:^w$}", caption, w = width).dim());
        }
    }
}

pub fn print_connection_info(info: &ConnectionInfo) {
    println!("  IP: {}", info.client_ip.as_str().bold().blue());
    println!("  AS: {}", info.as_identity().bold().blue());
    println!();
}

pub fn report_table(report: &MeasurementReport) -> TextTable {
    let mut table = TextTable::new(["Download Speed", "Upload Speed", "Ping", "Jitter"]);
    table.add_row(vec![
        best_unit(report.download_speed_bps),
        best_unit(report.upload_speed_bps),
        format_ms(report.latency_ms),
        format_ms(report.jitter_ms),
    ]);
    table
}

pub fn history_table(records: &[MeasurementRecord]) -> TextTable {
    let mut table = TextTable::new([
        "Date",
        "IP",
        "AS",
        "Download Speed",
        "Upload Speed",
        "Latency",
    ]);
    for record in records {
        table.add_row(vec![
            record.formatted_date(),
            record.ip.clone(),
            record.as_identity.clone(),
            best_unit(record.download_speed as f64),
            best_unit(record.upload_speed as f64),
            format_ms(record.latency as f64),
        ]);
    }
    table
}
