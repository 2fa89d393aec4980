//! Products command - look up the catalog the way the agent does.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::knowledge::{KnowledgeStore, ProductFilter};
use anyhow::Result;

/// Run the products command.
pub fn run_products(
    name: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    settings: &Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Products, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if settings.sources.products_file.is_none() {
        Output::warning("No products file configured (sources.products_file).");
        return Ok(());
    }

    let store = KnowledgeStore::new(settings.sources.clone());
    store.load();

    let filter = ProductFilter {
        name,
        min_price,
        max_price,
    };
    let products = store.filter_products(&filter);

    if filter.is_empty() {
        Output::header(&format!("Products ({})", products.len()));
    } else {
        Output::header(&format!(
            "Matching products ({} of {})",
            products.len(),
            store.get_all_products().len()
        ));
    }

    if products.is_empty() {
        Output::info("No products found.");
        return Ok(());
    }

    for product in &products {
        Output::product(product);
    }

    Ok(())
}
