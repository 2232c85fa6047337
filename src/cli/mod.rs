//! CLI subcommand implementations for the regscout binary.

pub mod doctor;
pub mod output;
pub mod scrape_cmd;
pub mod session_cmd;
