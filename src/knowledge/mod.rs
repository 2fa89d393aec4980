//! In-memory knowledge used to ground the agent's answers.
//!
//! The store is filled once from up to three optional sources and is
//! read-only afterwards, so it can be shared between concurrent turns
//! without locking:
//!
//! - a CSV table of products (`sources.products_file`)
//! - a document describing products and services (`sources.document_file`)
//! - a plain text file about the company (`sources.text_file`)

mod documents;
mod products;

pub use documents::{read_document_text, read_narrative_text};
pub use products::{normalize_column, parse_products, ProductFilter, ProductRecord};

use crate::config::SourceSettings;
use crate::error::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info};

/// Free-text knowledge inserted into the system prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeText {
    /// Text extracted from the products/services document.
    pub document_text: String,
    /// Narrative text about the company.
    pub narrative_text: String,
}

#[derive(Debug, Default)]
struct KnowledgeState {
    products: Vec<ProductRecord>,
    text: KnowledgeText,
}

/// Write-once store of product records and reference text.
#[derive(Debug)]
pub struct KnowledgeStore {
    sources: SourceSettings,
    state: OnceLock<KnowledgeState>,
}

impl KnowledgeStore {
    /// Create a store that loads from the given sources on first use.
    pub fn new(sources: SourceSettings) -> Self {
        Self {
            sources,
            state: OnceLock::new(),
        }
    }

    /// Create an already loaded store.
    pub fn from_parts(products: Vec<ProductRecord>, text: KnowledgeText) -> Self {
        let state = OnceLock::new();
        let _ = state.set(KnowledgeState { products, text });
        Self {
            sources: SourceSettings::default(),
            state,
        }
    }

    /// Load every configured source. Calling it again is a no-op.
    ///
    /// A failing source is logged and left empty; the others still load.
    pub fn load(&self) {
        self.state();
    }

    /// Whether the sources have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.state.get().is_some()
    }

    /// All products in source order.
    pub fn get_all_products(&self) -> &[ProductRecord] {
        &self.state().products
    }

    /// Products matching every set filter, in source order.
    pub fn filter_products(&self, filter: &ProductFilter) -> Vec<ProductRecord> {
        self.state()
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    /// Free-text knowledge.
    pub fn text(&self) -> &KnowledgeText {
        &self.state().text
    }

    fn state(&self) -> &KnowledgeState {
        self.state.get_or_init(|| load_sources(&self.sources))
    }
}

fn load_sources(sources: &SourceSettings) -> KnowledgeState {
    info!("Loading knowledge sources...");

    let products = load_source("products", sources.products_path(), |path| {
        parse_products(File::open(path)?)
    })
    .unwrap_or_default();

    let document_text =
        load_source("document", sources.document_path(), read_document_text).unwrap_or_default();

    let narrative_text =
        load_source("text", sources.text_path(), read_narrative_text).unwrap_or_default();

    info!(
        "Knowledge sources loaded: {} products, {} chars of document text, {} chars of company text",
        products.len(),
        document_text.len(),
        narrative_text.len()
    );

    KnowledgeState {
        products,
        text: KnowledgeText {
            document_text,
            narrative_text,
        },
    }
}

/// Load one optional source, logging instead of failing.
fn load_source<T, F>(label: &str, path: Option<PathBuf>, load: F) -> Option<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let path = path?;

    if !path.is_file() {
        info!("{} source not found: {}", label, path.display());
        return None;
    }

    match load(&path) {
        Ok(value) => {
            info!("{} source loaded from {}", label, path.display());
            Some(value)
        }
        Err(e) => {
            error!("Failed to load {} source {}: {}", label, path.display(), e);
            None
        }
    }
}
