use clap::{Args, Parser, Subcommand};

/// Encode, validate and project recurrence rules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging on stderr
    #[clap(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a rule from its fields and print its RRULE text
    Encode(EncodeCommand),
    /// Decode RRULE text and show its fields
    Decode(DecodeCommand),
    /// Check an RRULE for problems
    Validate(ValidateCommand),
    /// List occurrences inside a time window
    Between(BetweenCommand),
    /// Show the most recent occurrence at or before a boundary
    Last(LastCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct EncodeCommand {
    /// Frequency: yearly, monthly, weekly, daily, hourly or minutely
    #[clap(short, long, default_value = "daily")]
    pub freq: String,
    /// Repeat every N periods (1-12)
    #[clap(short, long, default_value = "1")]
    pub interval: String,
    /// Monthly rules: "date" or "nth-day"
    #[clap(long)]
    pub monthly_option: Option<String>,
    /// Monthly by date: day of the month (1-28)
    #[clap(long)]
    pub date_of_month: Option<String>,
    /// Monthly by nth day: weekday code (SU, MO, TU, WE, TH, FR, SA)
    #[clap(long)]
    pub day_of_month: Option<String>,
    /// Monthly by nth day: 1-4 for first..fourth, -1 last, -2 second to last
    #[clap(long, allow_hyphen_values = true)]
    pub nth: Option<String>,
    /// Weekly rules: weekday code
    #[clap(long)]
    pub day_of_week: Option<String>,
    /// Hourly rules: minute of the hour (0-59)
    #[clap(long)]
    pub minute: Option<String>,
}

impl EncodeCommand {
    /// The command line as a rule attribute set.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("frequency", self.freq.clone()),
            ("interval", self.interval.clone()),
        ];
        let optional = [
            ("monthly_option", &self.monthly_option),
            ("date_of_month", &self.date_of_month),
            ("day_of_month", &self.day_of_month),
            ("nth_day_of_month", &self.nth),
            ("day_of_week", &self.day_of_week),
            ("minute_of_hour", &self.minute),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                attributes.push((key, value.clone()));
            }
        }
        attributes
    }
}

#[derive(Parser, Debug, Clone)]
pub struct DecodeCommand {
    /// RRULE text, e.g. "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO"
    pub rule: String,
    /// Print JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    /// RRULE text
    pub rule: String,
}

/// Zone options shared by the projection commands.
#[derive(Args, Debug, Clone)]
pub struct ZoneArgs {
    /// IANA time zone (defaults to the configured or system zone)
    #[clap(long)]
    pub tz: Option<String>,
    /// Print JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct BetweenCommand {
    /// RRULE text
    pub rule: String,
    /// The first (defining) occurrence
    #[clap(short, long)]
    pub anchor: String,
    /// Window start (inclusive)
    #[clap(long)]
    pub from: String,
    /// Window end (inclusive)
    #[clap(long)]
    pub to: String,
    /// Print at most N occurrences
    #[clap(short, long)]
    pub limit: Option<usize>,
    #[command(flatten)]
    pub zone: ZoneArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct LastCommand {
    /// RRULE text
    pub rule: String,
    /// The first (defining) occurrence
    #[clap(short, long)]
    pub anchor: String,
    /// Boundary (inclusive)
    #[clap(short, long)]
    pub before: String,
    #[command(flatten)]
    pub zone: ZoneArgs,
}
