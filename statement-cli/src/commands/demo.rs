//! Demo command - show the built-in demo statement

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;

use statement_core::adapters::analytics::TracingAnalytics;
use statement_core::adapters::demo::{DEMO_ACCESS_HASH, DEMO_ACCOUNT_KEY};
use statement_core::{AccountRole, StatementContext};

use super::get_statement_dir;
use super::show::{load_and_present, ViewArgs};
use crate::output;

pub async fn run(role: &str, args: ViewArgs) -> Result<()> {
    let role = AccountRole::from_str(role)?;
    let statement_dir = get_statement_dir()?;
    let ctx = StatementContext::demo(&statement_dir, Arc::new(TracingAnalytics))?;
    let session = ctx.session(args.disclosure_mode());

    if !args.json {
        output::warning("Demo statement - no key or hash given, nothing was fetched");
    }
    load_and_present(&session, role, DEMO_ACCOUNT_KEY, DEMO_ACCESS_HASH, &args).await
}
