use crate::prelude::*;
use frantic_core::search::editor;
use frantic_core::{SearchResult, TreeNode};

#[derive(Debug, clap::Parser)]
#[command(name = "search")]
#[command(about = "Run a query against the local card catalog")]
pub struct App {
    /// Query terms, Scryfall-flavored (e.g. `t:creature c:green pow>=4`)
    #[clap(value_name = "QUERY", required = true)]
    pub query: Vec<String>,

    /// Number of rows to display
    #[clap(short, long, default_value = "25")]
    pub limit: usize,

    /// Number of rows to skip (after ordering)
    #[clap(long, default_value = "0")]
    pub offset: usize,

    /// Show the per-subexpression match-count breakdown
    #[clap(long)]
    pub breakdown: bool,

    /// Show the result histograms
    #[clap(long)]
    pub histograms: bool,

    /// Output format (pretty table or JSON)
    #[clap(long, default_value = "pretty")]
    pub format: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let mut engine = global.load_engine().await?;

    // Close dangling quotes/parens the same way the UI does before parsing.
    let query = editor::seal(&app.query.join(" "));
    let result = engine.search(&query);

    if app.format == "json" {
        aprintln!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_results(&engine, &result, &app);

    if app.breakdown {
        aprintln!("\nBreakdown:");
        print_breakdown(&result.breakdown, 1);
    }

    if app.histograms {
        print_histograms(&result);
    }

    Ok(())
}

fn print_results(engine: &frantic_core::SearchEngine, result: &SearchResult, app: &App) {
    let columns = &engine.cards().columns;

    if result.unique_prints {
        let printings = &engine
            .printings()
            .expect("unique_prints implies printings")
            .columns;
        let rows = result.printing_indices.as_deref().unwrap_or(&[]);

        aprintln!("{} printings\n", rows.len());
        let mut table = results_table(&["Name", "Set", "CN", "Rarity", "USD"]);
        for p in rows.iter().skip(app.offset).take(app.limit) {
            let face = printings.canonical_face_ref[*p as usize] as usize;
            table.add_row(prettytable::row![
                columns.combined_name[face],
                printings.set_code(*p).to_uppercase(),
                printings.collector_number[*p as usize],
                format!("{:?}", printings.rarity[*p as usize]),
                format_usd(printings.price_usd[*p as usize]),
            ]);
        }
        table.printstd();
        return;
    }

    aprintln!("{} cards\n", result.indices.len());
    let mut table = results_table(&["Name", "Cost", "Type", "MV"]);
    for f in result.indices.iter().skip(app.offset).take(app.limit) {
        let f = *f as usize;
        table.add_row(prettytable::row![
            columns.combined_name[f],
            columns.mana_cost[f],
            columns.type_line[f],
            columns.mana_value[f],
        ]);
    }
    table.printstd();
}

fn print_breakdown(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.error {
        Some(error) => aprintln!("{indent}{} — {} matches ({:?})", node.label, node.count, error),
        None => aprintln!("{indent}{} — {} matches", node.label, node.count),
    }
    for child in &node.children {
        print_breakdown(child, depth + 1);
    }
}

fn print_histograms(result: &SearchResult) {
    let histograms = &result.histograms;

    aprintln!("\nColor identity:");
    let colors = &histograms.color_identity;
    for (label, count) in [
        ("colorless", colors.colorless),
        ("white", colors.white),
        ("blue", colors.blue),
        ("black", colors.black),
        ("red", colors.red),
        ("green", colors.green),
        ("multicolor", colors.multicolor),
    ] {
        aprintln!("  {label:<10} {count}");
    }

    aprintln!("\nMana value:");
    for (mv, count) in histograms.mana_value.buckets.iter().enumerate() {
        let label = if mv == 7 {
            "7+".to_string()
        } else {
            mv.to_string()
        };
        aprintln!("  {label:<3} {count}");
    }

    aprintln!("\nCard type:");
    let types = &histograms.card_type;
    for (label, count) in [
        ("legendary", types.legendary),
        ("creature", types.creature),
        ("instant", types.instant),
        ("sorcery", types.sorcery),
        ("artifact", types.artifact),
        ("enchantment", types.enchantment),
        ("planeswalker", types.planeswalker),
        ("land", types.land),
    ] {
        aprintln!("  {label:<12} {count}");
    }
}
