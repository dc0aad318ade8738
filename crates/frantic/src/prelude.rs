pub use anstream::eprintln as aeprintln;
pub use anstream::println as aprintln;
pub use color_eyre::eyre::{eyre, Result};

/// Clean-bordered table pre-seeded with a header row, for result listings.
pub fn results_table(headers: &[&str]) -> prettytable::Table {
    let mut table = prettytable::Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_CLEAN);
    table.add_row(prettytable::Row::new(
        headers.iter().map(|h| prettytable::Cell::new(h)).collect(),
    ));
    table
}

/// Render integer cents as dollars. Zero cents means the price is unknown
/// and renders as a dash.
pub fn format_usd(cents: u32) -> String {
    if cents == 0 {
        "—".to_string()
    } else {
        format!("{:.2}", cents as f64 / 100.0)
    }
}
