pub mod handler;

use clap::{Args, ValueEnum};

#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of most recent days to show
    #[arg(long, default_value_t = 30)]
    pub limit: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Aligned, coloured columns
    Table,
    /// Pretty-printed JSON array
    Json,
    /// `date,price` with a header row
    Csv,
}
