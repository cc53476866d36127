pub mod handler;

use clap::Args;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Workbook URL, overrides the configured source
    #[arg(long)]
    pub source_url: Option<String>,

    /// Reconcile against the stored dates without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the trigger response body instead of a summary
    #[arg(long)]
    pub json: bool,
}
