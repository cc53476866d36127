pub mod handler;

use clap::Args;

#[derive(Debug, Args)]
pub struct TriggerArgs {
    /// Request method, e.g. POST or OPTIONS
    #[arg(long)]
    pub method: String,
}
