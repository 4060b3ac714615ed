use super::format::{format_bytes, format_speed};
use crate::app::{App, Panel, StageProgress};
use crate::speedtest::{Direction, TestPhase};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

const ACCENT: Color = Color::Rgb(100, 149, 237);
const DOWNLOAD: Color = Color::Rgb(134, 194, 156);
const DOWNLOAD_DIM: Color = Color::Rgb(80, 120, 90);
const UPLOAD: Color = Color::Rgb(147, 180, 220);
const UPLOAD_DIM: Color = Color::Rgb(90, 110, 140);
const LATENCY: Color = Color::Rgb(220, 180, 130);
const ERROR: Color = Color::Rgb(220, 110, 110);
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BORDER_ACTIVE: Color = Color::Rgb(100, 100, 110);

const SEPARATOR: &str = "  ·  ";

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);

    if app.expanded {
        match app.selected_panel {
            Panel::Download => {
                draw_throughput_expanded(frame, chunks[1], &throughput_view(app, Direction::Download))
            }
            Panel::Upload => {
                draw_throughput_expanded(frame, chunks[1], &throughput_view(app, Direction::Upload))
            }
            Panel::Ping => draw_latency_expanded(frame, chunks[1], app),
        }
    } else {
        let panels = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(chunks[1]);
        draw_throughput_panel(
            frame,
            panels[0],
            &throughput_view(app, Direction::Download),
            app.selected_panel == Panel::Download,
        );
        draw_throughput_panel(
            frame,
            panels[1],
            &throughput_view(app, Direction::Upload),
            app.selected_panel == Panel::Upload,
        );
        draw_latency_panel(frame, panels[2], app, app.selected_panel == Panel::Ping);
    }

    draw_message(frame, chunks[2], app);
    draw_help(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(inner);
    let columns = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(20),
    ])
    .split(rows[0]);

    frame.render_widget(
        Paragraph::new("netsmon")
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        columns[0],
    );

    let (status, color) = phase_status(app.phase);
    frame.render_widget(centered(status, Style::default().fg(color)), columns[1]);

    frame.render_widget(
        Paragraph::new(phase_indicator(app.phase)).alignment(Alignment::Right),
        columns[2],
    );

    if let Some(info) = &app.connection {
        let connection = Line::from(vec![
            Span::styled("IP ", Style::default().fg(TEXT_MUTED)),
            Span::styled(info.client_ip.clone(), Style::default().fg(ACCENT)),
            Span::styled(SEPARATOR, Style::default().fg(TEXT_MUTED)),
            Span::styled(info.as_identity(), Style::default().fg(ACCENT)),
        ]);
        frame.render_widget(centered(connection, Style::default()), rows[1]);
    }
}

fn phase_status(phase: TestPhase) -> (&'static str, Color) {
    match phase {
        TestPhase::Idle => ("Ready", TEXT_MUTED),
        TestPhase::Connecting => ("Getting your internet information...", LATENCY),
        TestPhase::Ping => ("Measuring latency...", LATENCY),
        TestPhase::Download => ("Testing download...", DOWNLOAD),
        TestPhase::Upload => ("Testing upload...", UPLOAD),
        TestPhase::Complete => ("Complete", ACCENT),
        TestPhase::Failed => ("Failed", ERROR),
    }
}

/// `ping / down / up`, with the active phase highlighted. Download and upload
/// stages alternate, so both count as done only once the run completes.
fn phase_indicator(phase: TestPhase) -> Line<'static> {
    let steps = [
        (TestPhase::Ping, "ping"),
        (TestPhase::Download, "down"),
        (TestPhase::Upload, "up"),
    ];

    let mut spans = Vec::with_capacity(steps.len() * 2);
    for (i, (step, label)) in steps.into_iter().enumerate() {
        let done = match phase {
            TestPhase::Complete => true,
            TestPhase::Download | TestPhase::Upload => step == TestPhase::Ping,
            _ => false,
        };
        let style = if phase == step {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else if done {
            Style::default().fg(TEXT_SECONDARY)
        } else {
            Style::default().fg(TEXT_MUTED)
        };

        if i > 0 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
        spans.push(Span::styled(label, style));
    }

    Line::from(spans)
}

/// What a download or upload panel shows.
struct ThroughputView<'a> {
    title: &'static str,
    color: Color,
    dim_color: Color,
    mbps: f64,
    stage: String,
    progress: f64,
    samples: &'a [f64],
}

fn throughput_view(app: &App, direction: Direction) -> ThroughputView<'_> {
    let (title, color, dim_color, stage, samples, final_bps) = match direction {
        Direction::Download => (
            "Download",
            DOWNLOAD,
            DOWNLOAD_DIM,
            app.download_stage.as_ref(),
            app.download_samples.as_slice(),
            app.report.as_ref().map(|r| r.download_speed_bps),
        ),
        Direction::Upload => (
            "Upload",
            UPLOAD,
            UPLOAD_DIM,
            app.upload_stage.as_ref(),
            app.upload_samples.as_slice(),
            app.report.as_ref().map(|r| r.upload_speed_bps),
        ),
    };

    let mbps = match final_bps {
        Some(bps) => bps / 1_000_000.0,
        None => samples.last().copied().unwrap_or(0.0),
    };
    let progress = if app.phase == TestPhase::Complete {
        1.0
    } else {
        stage.map(StageProgress::ratio).unwrap_or(0.0)
    };

    ThroughputView {
        title,
        color,
        dim_color,
        mbps,
        stage: stage_line(stage),
        progress,
        samples,
    }
}

fn panel_block(title: &str, color: Color, selected: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if selected { BORDER_ACTIVE } else { BORDER }))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(if selected { color } else { TEXT_SECONDARY }),
        ))
}

fn centered(text: impl Into<Line<'static>>, style: Style) -> Paragraph<'static> {
    Paragraph::new(text.into())
        .style(style)
        .alignment(Alignment::Center)
}

fn draw_throughput_panel(frame: &mut Frame, area: Rect, view: &ThroughputView, selected: bool) {
    let block = panel_block(view.title, view.color, selected);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .split(inner);

    frame.render_widget(
        centered(
            format_speed(view.mbps),
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        rows[0],
    );
    draw_ladder(frame, rows[1], rows[2], view);
    draw_sparkline(frame, rows[3], view.samples, view.color);
}

fn draw_throughput_expanded(frame: &mut Frame, area: Rect, view: &ThroughputView) {
    let block = panel_block(view.title, view.color, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(4),
    ])
    .split(inner);

    let stats = SampleStats::of(view.samples);
    let summary = summary_line(
        format_speed(view.mbps),
        [
            format!("avg {}", format_speed(stats.mean)),
            format!("max {}", format_speed(stats.max)),
            format!("min {}", format_speed(stats.min)),
            format!("{} samples", view.samples.len()),
        ],
    );
    frame.render_widget(centered(summary, Style::default()), rows[0]);

    draw_ladder(frame, rows[1], rows[2], view);
    draw_detailed_chart(frame, rows[3], view.samples, view.color, "Mbps");
}

/// Headline value followed by muted details.
fn summary_line<const N: usize>(headline: String, details: [String; N]) -> Line<'static> {
    let mut spans = vec![Span::styled(
        headline,
        Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
    )];
    for detail in details {
        spans.push(Span::styled(SEPARATOR, Style::default().fg(TEXT_MUTED)));
        spans.push(Span::styled(detail, Style::default().fg(TEXT_MUTED)));
    }
    Line::from(spans)
}

/// Ladder progress bar with the stage description underneath.
fn draw_ladder(frame: &mut Frame, bar_area: Rect, label_area: Rect, view: &ThroughputView) {
    draw_progress_bar(frame, bar_area, view.progress, view.color, view.dim_color);
    frame.render_widget(
        centered(view.stage.clone(), Style::default().fg(TEXT_MUTED)),
        label_area,
    );
}

fn latency_value(app: &App) -> f64 {
    match &app.report {
        Some(report) => report.latency_ms,
        None => app.ping_samples.last().copied().unwrap_or(0.0),
    }
}

fn jitter_text(app: &App) -> String {
    match &app.report {
        Some(report) => format!("jitter {:.1} ms", report.jitter_ms),
        None => "jitter —".to_string(),
    }
}

fn draw_latency_panel(frame: &mut Frame, area: Rect, app: &App, selected: bool) {
    let block = panel_block("Latency", LATENCY, selected);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .split(inner);

    let latency = latency_value(app);
    let value = if latency > 0.0 {
        format!("{:.0} ms", latency)
    } else {
        "—".to_string()
    };
    frame.render_widget(
        centered(value, Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        rows[0],
    );
    frame.render_widget(centered(jitter_text(app), Style::default().fg(TEXT_MUTED)), rows[1]);
    draw_sparkline(frame, rows[2], &app.ping_samples, LATENCY);
}

fn draw_latency_expanded(frame: &mut Frame, area: Rect, app: &App) {
    let block = panel_block("Latency", LATENCY, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(2), Constraint::Min(4)]).split(inner);

    let stats = SampleStats::of(&app.ping_samples);
    let summary = summary_line(
        format!("{:.0} ms", latency_value(app)),
        [
            jitter_text(app),
            format!("avg {:.0}", stats.mean),
            format!("max {:.0}", stats.max),
            format!("min {:.0}", stats.min),
        ],
    );
    frame.render_widget(centered(summary, Style::default()), rows[0]);

    draw_detailed_chart(frame, rows[1], &app.ping_samples, LATENCY, "ms");
}

fn draw_progress_bar(frame: &mut Frame, area: Rect, ratio: f64, color: Color, dim_color: Color) {
    if area.width < 4 {
        return;
    }

    let width = (area.width - 2) as usize;
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64) as usize).min(width);

    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("━".repeat(filled), Style::default().fg(color)),
        Span::styled("━".repeat(width - filled), Style::default().fg(dim_color)),
        Span::raw(" "),
    ]);
    frame.render_widget(Paragraph::new(bar), area);
}

fn indexed(data: &[f64]) -> Vec<(f64, f64)> {
    data.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect()
}

fn draw_sparkline(frame: &mut Frame, area: Rect, data: &[f64], color: Color) {
    if data.is_empty() || area.width < 4 || area.height < 2 {
        return;
    }

    let stats = SampleStats::of(data);
    let pad = (stats.max - stats.min).max(1.0) * 0.1;
    let points = indexed(data);

    let chart = Chart::new(vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)])
    .x_axis(Axis::default().bounds([0.0, data.len() as f64]))
    .y_axis(Axis::default().bounds([stats.min - pad, stats.max + pad]));

    frame.render_widget(chart, area);
}

/// Samples plus a flat mean line, with a labelled y axis.
fn draw_detailed_chart(frame: &mut Frame, area: Rect, data: &[f64], color: Color, unit: &str) {
    if data.is_empty() || area.width < 10 || area.height < 3 {
        return;
    }

    let stats = SampleStats::of(data);
    let pad = (stats.max - stats.min).max(0.1) * 0.1;
    let y_min = (stats.min - pad).max(0.0);
    let y_max = stats.max + pad;

    let points = indexed(data);
    let mean_line = [(0.0, stats.mean), (data.len() as f64, stats.mean)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(TEXT_MUTED))
            .data(&mean_line),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(BORDER))
                .bounds([0.0, data.len() as f64]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(BORDER))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{:.0}", y_min), Style::default().fg(TEXT_MUTED)),
                    Span::styled(
                        format!("{:.0} {}", y_max, unit),
                        Style::default().fg(TEXT_MUTED),
                    ),
                ]),
        );

    frame.render_widget(chart, area);
}

fn draw_message(frame: &mut Frame, area: Rect, app: &App) {
    let Some(message) = &app.message else {
        return;
    };

    let color = if app.phase == TestPhase::Failed {
        ERROR
    } else {
        TEXT_SECONDARY
    };
    frame.render_widget(centered(message.clone(), Style::default().fg(color)), area);
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.expanded {
        "esc close · q quit"
    } else if app.is_running() {
        "tab select · space expand · esc cancel · q quit"
    } else {
        "enter run again · tab select · space expand · q quit"
    };
    frame.render_widget(centered(help, Style::default().fg(TEXT_MUTED)), area);
}

fn stage_line(stage: Option<&StageProgress>) -> String {
    match stage {
        None => String::new(),
        Some(p) if p.stopped => format!(
            "stopped before {} (patience)",
            format_bytes(p.stage.payload_bytes)
        ),
        Some(p) => format!(
            "stage {}/{} · {} × {}",
            p.stage.index + 1,
            p.ladder_len,
            format_bytes(p.stage.payload_bytes),
            p.stage.probe_count()
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SampleStats {
    mean: f64,
    min: f64,
    max: f64,
}

impl SampleStats {
    /// All zeros for an empty slice.
    fn of(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        Self {
            mean: data.iter().sum::<f64>() / data.len() as f64,
            min: data.iter().copied().fold(f64::INFINITY, f64::min),
            max: data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
