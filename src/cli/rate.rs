use super::ui;
use crate::core::rate::ExchangeRateQuery;
use crate::swap::Swap;
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Resolves one query and prints the answer as a single-row table.
pub async fn run(swap: &Swap, query: ExchangeRateQuery) -> Result<()> {
    let pb = ui::new_spinner(format!("Resolving {query}"));
    let result = swap.query(&query).await;
    pb.finish_and_clear();

    let rate = result.with_context(|| format!("Failed to resolve {query}"))?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Date"),
        ui::header_cell("Provider"),
    ]);
    table.add_row(vec![
        Cell::new(rate.pair.to_string()),
        ui::rate_cell(rate.value),
        Cell::new(rate.date.format("%Y-%m-%d").to_string()),
        Cell::new(&rate.provider),
    ]);
    println!("{table}");
    Ok(())
}
