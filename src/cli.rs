use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Normalized financial metrics per reporting period", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build the period table for a company name or stock code
    #[command(alias = "a")]
    Analyze {
        query: String,
        /// Include EBITDA, FFO and FOCF rows
        #[arg(long)]
        extended: bool,
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
        /// Write every period to the financial cache
        #[arg(long)]
        persist: bool,
        /// Persist and request an underwriting opinion for the latest period
        #[arg(long)]
        opinion: bool,
        /// Quarterly periods to include (defaults to QUARTERS)
        #[arg(long)]
        quarters: Option<usize>,
        /// Annual periods to include (defaults to ANNUAL_YEARS)
        #[arg(long)]
        years: Option<usize>,
    },
    /// Inspect the financial cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Underwriting opinion on the latest cached period of a company
    Opinion { query: String },
    /// Show which listed company a query resolves to
    Resolve { query: String },
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum CacheCommand {
    /// List cached companies
    List,
    /// Latest cached period of a company, with pre-screen flags
    Show { query: String },
}
