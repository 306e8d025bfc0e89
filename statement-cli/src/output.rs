//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Right-align the given columns of a table
pub fn align_right(table: &mut Table, columns: &[usize]) {
    for index in columns {
        if let Some(column) = table.column_mut(*index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

/// Spinner on stderr while a load is in flight; hidden when `quiet`
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Format money with thousands separators and two decimals
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{}", grouped, frac_part)
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

/// Money cell, blank for zero
pub fn money_cell(amount: Decimal) -> String {
    if amount.is_zero() {
        String::new()
    } else {
        format_money(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(379950, 2)), "3,799.50");
        assert_eq!(format_money(Decimal::new(-12005, 1)), "-1,200.50");
        assert_eq!(format_money(Decimal::new(15, 0)), "15.00");
        assert_eq!(format_money(Decimal::new(1234567891, 3)), "1,234,567.89");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_money_cell_blank_for_zero() {
        assert_eq!(money_cell(Decimal::ZERO), "");
        assert_eq!(money_cell(Decimal::new(300, 0)), "300.00");
    }
}
