//! netsmon - internet speed monitor
//!
//! Measures latency, jitter and download/upload throughput against an HTTP
//! speed endpoint, keeps a history of results and renders it in the terminal.

pub mod app;
pub mod history;
pub mod logging;
pub mod meta;
pub mod settings;
pub mod speedtest;
pub mod ui;
