use super::ui;
use crate::core::config::SwapConfig;
use crate::core::error::BuildError;
use crate::providers::registry::SERVICES;
use crate::swap::Swap;
use comfy_table::{Cell, Color};

/// Prints every known service with its place in the built chain.
pub fn run(config: &SwapConfig, swap: &Swap) -> Result<(), BuildError> {
    println!("{}", ui::style_text("Services", ui::StyleType::Title));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Service"),
        ui::header_cell("Type"),
        ui::header_cell("Required"),
        ui::header_cell("Chain"),
    ]);

    for descriptor in SERVICES {
        let position = swap.services().iter().position(|s| s == descriptor.name);
        let configured = config.services.get(descriptor.name).is_some();
        let required = if descriptor.required.is_empty() {
            Cell::new("-").fg(Color::DarkGrey)
        } else {
            Cell::new(descriptor.required.join(", "))
        };
        table.add_row(vec![
            Cell::new(descriptor.name),
            Cell::new(descriptor.type_name()),
            required,
            ui::status_cell(position, configured),
        ]);
    }
    println!("{table}");

    let cache = match config.cache_ref()? {
        Some(cache) => match config.cache_ttl(&cache) {
            Some(ttl) if ttl < 0 => format!("{} (bypassed)", cache.store),
            Some(ttl) if ttl > 0 => format!("{} ({ttl}s)", cache.store),
            _ => format!("{} (store default)", cache.store),
        },
        None => "off".to_string(),
    };
    println!(
        "{} {}",
        ui::style_text("Cache:", ui::StyleType::Label),
        ui::style_text(&cache, ui::StyleType::Subtle)
    );
    Ok(())
}
