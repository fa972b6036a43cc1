use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ledger_engine::entities::{CategoryKind, Named};
use ledger_engine::relative_date::weekday_name;
use ledger_engine::{
    match_entities, parse_relative_date, plan_tool_request, resolve_date_query_with_options,
    Catalog, MatchOutcome, ResolveOptions, ToolRequest, WeekStartDay,
};

#[derive(Parser)]
#[command(
    name = "ledger-resolve",
    version,
    about = "Resolve date phrases, entity names and assistant tool requests"
)]
struct Cli {
    /// Anchor date (YYYY-MM-DD); defaults to today in --timezone
    #[arg(long, global = true, env = "LEDGER_ANCHOR")]
    anchor: Option<String>,

    /// IANA timezone used to pick today's date when no anchor is given
    #[arg(long, global = true, env = "LEDGER_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,

    /// Log resolution steps to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a date phrase to a day or a range
    Dates {
        #[arg(long, value_enum, env = "LEDGER_WEEK_START", default_value_t = WeekStart::Monday)]
        week_start: WeekStart,
        /// The phrase (remaining args are joined with spaces)
        text: Vec<String>,
    },
    /// Parse a single date ("next friday", "13/02/2024")
    ParseDate {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Match a name against candidate records
    Match {
        /// JSON array of records, or "-" for stdin
        #[arg(long)]
        candidates: PathBuf,
        /// Only consider categories of this kind
        #[arg(long, value_enum)]
        kind: Option<Kind>,
        /// Only consider records owned by this account
        #[arg(long)]
        account: Option<String>,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Resolve a tool request's dates and names
    Plan {
        /// JSON tool request, or "-" for stdin
        #[arg(long)]
        request: PathBuf,
        /// JSON catalog of categories, vendors, clients and tax rates
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Only use catalog records owned by this account
        #[arg(long)]
        account: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekStart {
    Monday,
    Sunday,
}

impl From<WeekStart> for WeekStartDay {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Monday => WeekStartDay::Monday,
            WeekStart::Sunday => WeekStartDay::Sunday,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Income,
    Expense,
}

impl From<Kind> for CategoryKind {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Income => CategoryKind::Income,
            Kind::Expense => CategoryKind::Expense,
        }
    }
}

/// A candidate record as read from a file: any entity with an id and name.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<CategoryKind>,
}

impl Named for Record {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    outcome: MatchOutcome,
    exact_match: Option<&'a Record>,
    similar_candidates: Vec<&'a Record>,
}

#[derive(Serialize)]
struct ParsedDate {
    date: String,
    weekday: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let anchor = resolve_anchor(cli.anchor.as_deref(), &cli.timezone)?;
    debug!(%anchor, timezone = %cli.timezone, "using anchor date");

    match cli.command {
        Command::Dates { week_start, text } => {
            let options = ResolveOptions {
                week_start: week_start.into(),
            };
            let result = resolve_date_query_with_options(&text.join(" "), anchor, &options);
            print_json(&result, cli.compact)?;
            if !result.success {
                bail!(
                    "{}",
                    result.error.as_deref().unwrap_or("date resolution failed")
                );
            }
        }
        Command::ParseDate { text } => {
            let date = parse_relative_date(&text.join(" "), anchor)?;
            let output = ParsedDate {
                date: date.to_string(),
                weekday: weekday_name(date),
            };
            print_json(&output, cli.compact)?;
        }
        Command::Match {
            candidates,
            kind,
            account,
            text,
        } => {
            let records: Vec<Record> = serde_json::from_str(&read_input(&candidates)?)
                .with_context(|| format!("invalid candidates in {}", candidates.display()))?;
            let kind = kind.map(CategoryKind::from);
            let eligible = records.iter().filter(|r| {
                kind.is_none_or(|k| r.kind == Some(k))
                    && account
                        .as_deref()
                        .is_none_or(|a| r.account_id.as_deref() == Some(a))
            });
            let result = match_entities(eligible, &text.join(" "));
            let output = MatchOutput {
                outcome: result.outcome(),
                exact_match: result.exact_match,
                similar_candidates: result.similar_candidates,
            };
            print_json(&output, cli.compact)?;
        }
        Command::Plan {
            request,
            catalog,
            account,
        } => {
            let tool: ToolRequest = serde_json::from_str(&read_input(&request)?)
                .with_context(|| format!("invalid tool request in {}", request.display()))?;
            let mut catalog: Catalog = match catalog {
                Some(path) => serde_json::from_str(&read_input(&path)?)
                    .with_context(|| format!("invalid catalog in {}", path.display()))?,
                None => Catalog::default(),
            };
            if let Some(account) = account {
                catalog = catalog.scoped(&account);
            }
            let plan = plan_tool_request(&tool, &catalog, anchor)?;
            print_json(&plan, cli.compact)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// The explicit anchor, or today's date in `timezone`.
fn resolve_anchor(anchor: Option<&str>, timezone: &str) -> Result<NaiveDate> {
    if let Some(text) = anchor {
        return NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid anchor date '{text}', expected YYYY-MM-DD"));
    }
    let tz: Tz = timezone
        .parse()
        .map_err(|_| anyhow!("invalid timezone: '{timezone}'"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

/// Read a file, or stdin when the path is "-".
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}
