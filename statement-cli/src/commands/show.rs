//! Show command - fetch a statement and print its ledger

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use statement_core::services::{
    Column, DisclosureMode, FilterCriteria, Ledger, SortKey, StatementSession,
};
use statement_core::{AccountProfile, AccountRole, LoadState, Money, StatementEntry};

use super::get_context;
use crate::output;

/// Silent retries after a transport abort
const TRANSIENT_RETRIES: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(750);

/// Options shared by `show` and `demo`
#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Column filter: `description=rent`, `date=2024-12-01..2024-12-31`, `debit=100..`
    #[arg(long = "filter", short = 'f')]
    pub filters: Vec<String>,
    /// Sort key, repeatable: `date`, `-credit`, `balance:desc`
    #[arg(long = "sort", short = 's')]
    pub sort: Vec<String>,
    /// Number of pages to reveal
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub page: usize,
    /// Show the whole table and allow combined filters
    #[arg(long)]
    pub all: bool,
    /// Move a column: `FROM:TO` on-screen positions
    #[arg(long = "move-column")]
    pub move_column: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ViewArgs {
    pub fn disclosure_mode(&self) -> DisclosureMode {
        if self.all {
            DisclosureMode::Full
        } else {
            DisclosureMode::Paged
        }
    }
}

pub async fn run(role: &str, key: &str, hash: &str, args: ViewArgs) -> Result<()> {
    let role = AccountRole::from_str(role)?;
    let ctx = get_context()?;
    let session = ctx.session(args.disclosure_mode());
    load_and_present(&session, role, key, hash, &args).await
}

/// Load with silent retries on transport aborts, then print
pub async fn load_and_present(
    session: &StatementSession,
    role: AccountRole,
    key: &str,
    hash: &str,
    args: &ViewArgs,
) -> Result<()> {
    let spinner = output::spinner("Loading statement...", args.json);

    let mut state = session.load_statement(key, hash, role).await?;
    let mut attempts = 0;
    while state == LoadState::TransientlyFailed && attempts < TRANSIENT_RETRIES {
        attempts += 1;
        debug!(attempt = attempts, "retrying after transport abort");
        tokio::time::sleep(RETRY_DELAY).await;
        state = session.refresh().await?;
    }
    spinner.finish_and_clear();

    match state {
        LoadState::Loaded => {}
        LoadState::Failed { message } => bail!(message),
        _ => bail!("Could not reach the statement API. Check your connection and try again."),
    }

    apply_view_args(session, args)?;

    if args.json {
        print_json(session, role)
    } else {
        print_statement(session, role, args);
        Ok(())
    }
}

fn apply_view_args(session: &StatementSession, args: &ViewArgs) -> Result<()> {
    if !args.all && args.filters.len() > 1 {
        bail!("The paged view filters one column at a time; add --all to combine filters");
    }
    for spec in &args.filters {
        let (column, criteria) = parse_filter(spec)?;
        session.apply_filter(column, criteria)?;
    }

    let keys = args
        .sort
        .iter()
        .map(|s| SortKey::from_str(s))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !keys.is_empty() {
        session.apply_sort(keys);
    }

    if let Some(spec) = &args.move_column {
        let (from, to) = spec
            .split_once(':')
            .context("--move-column expects FROM:TO")?;
        let from: usize = from.trim().parse().context("invalid FROM position")?;
        let to: usize = to.trim().parse().context("invalid TO position")?;
        session.reorder_column(from, to)?;
    }

    // Pages beyond the first
    for _ in 1..args.page.max(1) {
        if !session.has_more() {
            break;
        }
        session.load_more();
    }
    Ok(())
}

/// Parse `column=value` into a column filter
///
/// Text columns take the value as a substring. Date and numeric columns
/// take `a..b`, `a..` or `..b`; a bare date means that exact day and a bare
/// number means exactly that amount.
pub fn parse_filter(spec: &str) -> Result<(Column, FilterCriteria)> {
    let (column, value) = spec
        .split_once('=')
        .with_context(|| format!("filter '{}' should look like column=value", spec))?;
    let column = Column::from_str(column)?;
    let value = value.trim();

    let criteria = match column {
        Column::Date => {
            let (start, end) = match value.split_once("..") {
                Some((s, e)) => (parse_opt(s, parse_day)?, parse_opt(e, parse_day)?),
                None => (Some(parse_day(value)?), None),
            };
            FilterCriteria::DateRange { start, end }
        }
        Column::Debit | Column::Credit | Column::Balance => {
            let (min, max) = match value.split_once("..") {
                Some((lo, hi)) => (parse_opt(lo, parse_amount)?, parse_opt(hi, parse_amount)?),
                None => {
                    let exact = parse_amount(value)?;
                    (Some(exact), Some(exact))
                }
            };
            FilterCriteria::Range { min, max }
        }
        Column::Description | Column::Kind | Column::Reference => FilterCriteria::Text(value.to_string()),
    };
    Ok((column, criteria))
}

fn parse_opt<T>(value: &str, parse: fn(&str) -> Result<T>) -> Result<Option<T>> {
    let value = value.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_amount(value: &str) -> Result<Decimal> {
    Decimal::from_str(&value.trim().replace(',', ""))
        .with_context(|| format!("invalid amount '{}'", value))
}

// =============================================================================
// Rendering
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatementOutput {
    role: AccountRole,
    profile: Option<AccountProfile>,
    current_balance: Money,
    paid_in: Money,
    paid_out: Money,
    total_rows: usize,
    rows: Vec<StatementEntry>,
    has_more: bool,
}

fn print_json(session: &StatementSession, role: AccountRole) -> Result<()> {
    let ledger = session.ledger();
    let out = StatementOutput {
        role,
        profile: session.profile(),
        current_balance: ledger.current_balance,
        paid_in: ledger.paid_in,
        paid_out: ledger.paid_out,
        total_rows: session.view().len(),
        rows: session.visible_rows(),
        has_more: session.has_more(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_statement(session: &StatementSession, role: AccountRole, args: &ViewArgs) {
    let ledger = session.ledger();
    if let Some(profile) = session.profile() {
        print_header(&profile, role, &ledger);
    }

    let rows = session.visible_rows();
    let total = session.view().len();
    if rows.is_empty() {
        output::info(if ledger.is_empty() {
            "No transactions"
        } else {
            "No transactions match the filter"
        });
        return;
    }

    let columns = session.columns();
    let mut table = output::create_table();
    table.set_header(columns.iter().map(|c| header_label(*c)).collect::<Vec<_>>());
    for entry in &rows {
        table.add_row(columns.iter().map(|c| cell_text(entry, *c)).collect::<Vec<_>>());
    }
    let numeric: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Column::Debit | Column::Credit | Column::Balance))
        .map(|(i, _)| i)
        .collect();
    output::align_right(&mut table, &numeric);
    println!("{}", table);

    if session.has_more() {
        println!(
            "{}",
            format!(
                "Showing {} of {} rows. Use --page {} or --all to see more.",
                rows.len(),
                total,
                args.page.max(1) + 1
            )
            .dimmed()
        );
    } else {
        println!("{}", format!("{} rows", rows.len()).dimmed());
    }
}

fn print_header(profile: &AccountProfile, role: AccountRole, ledger: &Ledger) {
    println!("{} {}", profile.name.bold(), format!("({})", role.label()).dimmed());

    let mut table = output::create_table();
    if let Some(number) = &profile.account_number {
        let label = match role {
            AccountRole::Client => "Account number",
            AccountRole::Supplier => "VAT number",
        };
        table.add_row(vec![label, number.as_str()]);
    }
    if let Some(phone) = &profile.phone {
        table.add_row(vec!["Phone", phone.as_str()]);
    }
    if let Some(company) = &profile.company {
        table.add_row(vec!["Company", company.as_str()]);
    }
    if let Some(address) = &profile.address {
        table.add_row(vec!["Address", address.as_str()]);
    }

    let balance = output::format_money(ledger.current_balance);
    let balance = match &profile.currency {
        Some(currency) => format!("{} {}", balance, currency),
        None => balance,
    };
    table.add_row(vec!["Current balance", balance.as_str()]);
    table.add_row(vec!["Paid in", output::format_money(ledger.paid_in).as_str()]);
    table.add_row(vec!["Paid out", output::format_money(ledger.paid_out).as_str()]);

    println!("{}", table);
    println!();
}

fn header_label(column: Column) -> &'static str {
    match column {
        Column::Date => "Date",
        Column::Description => "Description",
        Column::Kind => "Type",
        Column::Reference => "Reference",
        Column::Debit => "Debit",
        Column::Credit => "Credit",
        Column::Balance => "Balance",
    }
}

fn cell_text(entry: &StatementEntry, column: Column) -> String {
    match column {
        Column::Date => entry.date.to_string(),
        Column::Description => entry.description.clone(),
        Column::Kind => entry.kind.clone().unwrap_or_default(),
        Column::Reference => entry.reference.clone().unwrap_or_default(),
        Column::Debit => output::money_cell(entry.debit),
        Column::Credit => output::money_cell(entry.credit),
        Column::Balance => entry.balance.map(output::format_money).unwrap_or_default(),
    }
}
