//! Time-series charts of stored measurements.

use super::theme::{Palette, Theme};
use crate::history::MeasurementRecord;
use anyhow::Result;
use chrono::{Local, TimeZone};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    DefaultTerminal, Frame,
};
use std::time::Duration;

/// Chart-ready series derived from the stored records.
pub struct HistoryView {
    pub download: Vec<(f64, f64)>,
    pub upload: Vec<(f64, f64)>,
    pub latency: Vec<(f64, f64)>,
    pub palette: Palette,
}

impl HistoryView {
    /// Speeds are converted to Mb/s; x is the epoch timestamp.
    pub fn new(records: &[MeasurementRecord], theme: Theme) -> Self {
        let mut sorted: Vec<&MeasurementRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.timestamp);

        Self {
            download: series(&sorted, |r| r.download_speed as f64 / 1e6),
            upload: series(&sorted, |r| r.upload_speed as f64 / 1e6),
            latency: series(&sorted, |r| r.latency as f64),
            palette: theme.palette(),
        }
    }

    fn time_bounds(&self) -> [f64; 2] {
        let first = self.latency.first().map(|p| p.0).unwrap_or(0.0);
        let last = self.latency.last().map(|p| p.0).unwrap_or(0.0);
        if last > first {
            [first, last]
        } else {
            [first - 1.0, first + 1.0]
        }
    }
}

fn series(
    records: &[&MeasurementRecord],
    value: impl Fn(&MeasurementRecord) -> f64,
) -> Vec<(f64, f64)> {
    records
        .iter()
        .map(|r| (r.timestamp as f64, value(*r)))
        .collect()
}

pub fn run_history_view(terminal: &mut DefaultTerminal, view: &HistoryView) -> Result<()> {
    loop {
        terminal.draw(|frame| draw_history(frame, view))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }
    }
}

pub fn draw_history(frame: &mut Frame, view: &HistoryView) {
    let palette = view.palette;
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background)),
        area,
    );

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Percentage(55),
        Constraint::Min(6),
        Constraint::Length(1),
    ])
    .split(area);

    frame.render_widget(
        Paragraph::new("NetSpeedMonitor")
            .style(Style::default().fg(palette.text).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[0],
    );

    draw_speed_chart(frame, chunks[1], view);
    draw_latency_chart(frame, chunks[2], view);

    frame.render_widget(
        Paragraph::new("q quit")
            .style(Style::default().fg(palette.muted))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn draw_speed_chart(frame: &mut Frame, area: Rect, view: &HistoryView) {
    let palette = view.palette;
    let max = view
        .download
        .iter()
        .chain(view.upload.iter())
        .map(|p| p.1)
        .fold(0.0, f64::max);

    let datasets = vec![
        Dataset::default()
            .name("Download")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.download))
            .data(&view.download),
        Dataset::default()
            .name("Upload")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.upload))
            .data(&view.upload),
    ];

    draw_chart(frame, area, view, datasets, " Speed (Mb/s) ", max);
}

fn draw_latency_chart(frame: &mut Frame, area: Rect, view: &HistoryView) {
    let max = view.latency.iter().map(|p| p.1).fold(0.0, f64::max);

    let datasets = vec![Dataset::default()
        .name("Latency")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(view.palette.latency))
        .data(&view.latency)];

    draw_chart(frame, area, view, datasets, " Latency (ms) ", max);
}

fn draw_chart(
    frame: &mut Frame,
    area: Rect,
    view: &HistoryView,
    datasets: Vec<Dataset>,
    title: &str,
    max: f64,
) {
    let palette = view.palette;
    let [start, end] = view.time_bounds();
    let y_max = (max * 1.1).max(1.0);

    let x_labels = vec![
        Span::styled(date_label(start), Style::default().fg(palette.muted)),
        Span::styled(date_label((start + end) / 2.0), Style::default().fg(palette.muted)),
        Span::styled(date_label(end), Style::default().fg(palette.muted)),
    ];
    let y_labels = vec![
        Span::styled("0", Style::default().fg(palette.muted)),
        Span::styled(format!("{:.0}", y_max / 2.0), Style::default().fg(palette.muted)),
        Span::styled(format!("{:.0}", y_max), Style::default().fg(palette.muted)),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(Line::from(Span::styled(
                    title.to_string(),
                    Style::default().fg(palette.text),
                ))),
        )
        .x_axis(
            Axis::default()
                .title(Span::styled("Date", Style::default().fg(palette.muted)))
                .style(Style::default().fg(palette.border))
                .bounds([start, end])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(palette.border))
                .bounds([0.0, y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

fn date_label(timestamp: f64) -> String {
    Local
        .timestamp_opt(timestamp as i64, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn record(timestamp: i64, down: u64, latency: u64) -> MeasurementRecord {
        MeasurementRecord {
            timestamp,
            ip: "192.0.2.1".to_string(),
            as_identity: "AS1 Test".to_string(),
            download_speed: down,
            upload_speed: down / 2,
            latency,
        }
    }

    #[test]
    fn test_view_converts_and_sorts() {
        let records = vec![
            record(200, 50_000_000, 20),
            record(100, 100_000_000, 10),
        ];
        let view = HistoryView::new(&records, Theme::Contrast);

        assert_eq!(view.download, vec![(100.0, 100.0), (200.0, 50.0)]);
        assert_eq!(view.upload, vec![(100.0, 50.0), (200.0, 25.0)]);
        assert_eq!(view.latency, vec![(100.0, 10.0), (200.0, 20.0)]);
        assert_eq!(view.time_bounds(), [100.0, 200.0]);
    }

    #[test]
    fn test_draw_history_renders_titles() {
        let records = vec![
            record(1_700_000_000, 90_000_000, 12),
            record(1_700_086_400, 95_000_000, 9),
        ];
        let view = HistoryView::new(&records, Theme::DarkMinimal);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw_history(frame, &view)).unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("NetSpeedMonitor"));
        assert!(rendered.contains("Speed (Mb/s)"));
        assert!(rendered.contains("Latency (ms)"));
    }
}
