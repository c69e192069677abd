//! Command-line surface.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};

use tortilla_core::{Money, Quantity};

#[derive(Debug, Parser)]
#[command(name = "tortilla", about = "Tortilla shop sales ledger", version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the ledger and credential files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Operator name; selects the ledger and stamps new sales
    #[arg(long, short, global = true)]
    pub user: Option<String>,

    /// Operator password
    #[arg(long, global = true, env = "TORTILLA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print structured JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a sale and print its receipt
    Sell(SellArgs),

    /// Print the receipt of a stored sale
    Receipt(IndexArgs),

    /// List stored sales, newest first
    List(ListArgs),

    /// Delete one sale by its index
    Delete(IndexArgs),

    /// Delete every sale of the current user
    DeleteAll(ConfirmArgs),

    /// Totals for one day
    Daily(DayArgs),

    /// Totals for the Monday..Sunday week containing a date
    Weekly(DayArgs),

    /// Headline numbers over all sales or a date range
    Overview(RangeArgs),

    /// Write a daily or weekly report file
    Report(ReportCommand),

    /// Export every sale as CSV
    Export(OutputArgs),

    /// Import sales from CSV files
    Import(ImportArgs),

    /// Manage operator accounts
    User(UserCommand),

    /// Write the effective configuration to the config file
    InitConfig,
}

#[derive(Debug, Args)]
pub struct SellArgs {
    /// Tortillas in kg (steps of 0.5)
    #[arg(long, default_value = "0")]
    pub tortilla: Quantity,

    #[arg(long, default_value = "0")]
    pub totopos: Quantity,

    #[arg(long, default_value = "0")]
    pub cacahuates: Quantity,

    #[arg(long, default_value = "0")]
    pub mix: Quantity,

    #[arg(long, default_value = "0")]
    pub salted_chips: Quantity,

    /// Special item units, priced with --special-price
    #[arg(long, default_value = "0")]
    pub special: Quantity,

    #[arg(long, default_value = "0")]
    pub special_price: Money,

    #[arg(long)]
    pub frequent: bool,

    /// Apply the supplier tortilla rate
    #[arg(long)]
    pub supplier: bool,

    /// Amount tendered; exact total when omitted
    #[arg(long)]
    pub payment: Option<Money>,

    /// Sale date (today when omitted)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Sale time (now when omitted)
    #[arg(long)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Index shown by `list`
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only this date
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub date: Option<NaiveDate>,

    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct DayArgs {
    /// Defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.from.zip(self.to)
    }
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Directory to write into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Print to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Args)]
pub struct ReportCommand {
    #[command(subcommand)]
    pub command: ReportSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportSubcommand {
    Daily {
        #[command(flatten)]
        day: DayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    Weekly {
        #[command(flatten)]
        day: DayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV files with the exported column layout
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UserCommand {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum UserSubcommand {
    /// Create an account or replace its password and role (admin only)
    Add {
        username: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        admin: bool,
    },

    /// List accounts (admin only)
    List,

    /// Delete an account (admin only)
    Remove { username: String },

    /// Change the current operator's own password
    Passwd {
        #[arg(long)]
        new_password: String,
    },

    /// Show who is logged in and their role
    Check,
}
