//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod equity_csv;
pub mod file_config_adapter;
pub mod paper_venue;
pub mod text_report;
