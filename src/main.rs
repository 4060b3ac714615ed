use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::Event;
use netsmon::app::{poll_event, run_and_report, App, AppAction, TestUpdate};
use netsmon::history::{MeasurementRecord, MeasurementStore};
use netsmon::logging::{init_file_logging, init_logging};
use netsmon::meta::fetch_connection_info;
use netsmon::settings::{Cli, Mode, Settings};
use netsmon::speedtest::{HttpProbe, SpeedTest, TestPhase};
use netsmon::ui::history::{run_history_view, HistoryView};
use netsmon::ui::table::{history_table, print_connection_info, report_table};
use netsmon::ui::draw_ui;
use ratatui::DefaultTerminal;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = Settings::from_cli(Cli::parse())?;

    match settings.mode {
        Mode::Measure { live: true } => {
            init_file_logging(&settings.log_level, &settings.log_file())?;
            let mut terminal = ratatui::init();
            terminal.clear()?;

            let result = run_app(&mut terminal, settings).await;

            ratatui::restore();
            result.map(|_| ExitCode::SUCCESS)
        }
        Mode::Measure { live: false } => {
            init_logging(&settings.log_level);
            run_plain(settings).await.map(|_| ExitCode::SUCCESS)
        }
        Mode::List => {
            init_logging(&settings.log_level);
            list_measurements(&settings)
        }
        Mode::Visualize => {
            init_logging(&settings.log_level);
            visualize(&settings)
        }
    }
}

async fn run_app(terminal: &mut DefaultTerminal, settings: Settings) -> Result<()> {
    let mut app = App::new();
    let mut test_rx: Option<mpsc::Receiver<TestUpdate>> = None;
    let mut start_requested = true;

    loop {
        if start_requested {
            start_requested = false;
            app.reset_for_new_test();

            let (tx, rx) = mpsc::channel(64);
            let (cancel_tx, cancel_rx) = mpsc::channel(1);

            app.set_cancel_tx(cancel_tx);
            test_rx = Some(rx);

            tokio::spawn(run_and_report(tx, cancel_rx, settings.clone()));
        }

        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Handle test updates
        if let Some(rx) = test_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(update) => app.handle_update(update),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        if app.is_running() {
                            app.phase = TestPhase::Idle;
                        }
                        test_rx = None;
                        break;
                    }
                }
            }
        }

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(30))? {
            if let Some(action) = app.handle_key_event(key) {
                match action {
                    AppAction::Quit => {
                        app.cancel_test();
                        break;
                    }
                    AppAction::StartTest => start_requested = true,
                    AppAction::CancelTest => {
                        app.cancel_test();
                        test_rx = None;
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn run_plain(settings: Settings) -> Result<()> {
    let probe = HttpProbe::new(&settings.server, settings.timeout)?;

    let info = fetch_connection_info(probe.client(), &settings.server).await?;
    print_connection_info(&info);

    let engine = SpeedTest::new(probe, settings.engine.clone());
    let report = engine.run_standard_test().await?;

    let now = Local::now();
    report_table(&report).print(None, Some(&now.format("%d/%m/%Y %H:%M:%S").to_string()));

    let store = MeasurementStore::new(&settings.data_dir);
    store.append(MeasurementRecord::new(now, &info, &report))?;
    Ok(())
}

fn load_history(settings: &Settings) -> Result<Option<Vec<MeasurementRecord>>> {
    let store = MeasurementStore::new(&settings.data_dir);
    if !store.exists() {
        eprintln!("Measurements file not found.");
        return Ok(None);
    }

    let records = store.load()?;
    if records.is_empty() {
        eprintln!("Measurements file is empty.");
    }
    Ok(Some(records))
}

fn list_measurements(settings: &Settings) -> Result<ExitCode> {
    let Some(records) = load_history(settings)? else {
        return Ok(ExitCode::FAILURE);
    };
    if !records.is_empty() {
        history_table(&records).print(Some("Measurements"), None);
    }
    Ok(ExitCode::SUCCESS)
}

fn visualize(settings: &Settings) -> Result<ExitCode> {
    let Some(records) = load_history(settings)? else {
        return Ok(ExitCode::FAILURE);
    };
    match records.len() {
        0 => return Ok(ExitCode::SUCCESS),
        1 => {
            eprintln!("Can't visualize single measurement.");
            return Ok(ExitCode::SUCCESS);
        }
        count => info!(count, theme = ?settings.theme, "Opening history charts"),
    }

    let view = HistoryView::new(&records, settings.theme);
    let mut terminal = ratatui::init();
    let result = run_history_view(&mut terminal, &view).context("History view failed");
    ratatui::restore();

    result.map(|_| ExitCode::SUCCESS)
}
