//! Product records loaded from a CSV table.

use crate::error::{LuchError, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::io::Read;
use tracing::warn;

/// A single product row.
///
/// `name` and `price` are required; every other column is kept as-is under
/// its normalized column name, in source order. Whole prices serialize as
/// integers, so a price of 20 reads back as `20` rather than `20.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(serialize_with = "serialize_price")]
    pub price: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProductRecord {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            fields: Map::new(),
        }
    }
}

/// Largest magnitude at which every whole `f64` is still an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if price.fract() == 0.0 && price.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*price as i64)
    } else {
        serializer.serialize_f64(*price)
    }
}

/// Optional product filters, combined with AND.
///
/// Price bounds are exclusive: a product priced exactly at a bound is left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.min_price.is_none() && self.max_price.is_none()
    }

    /// Check a product against every set filter.
    pub fn matches(&self, product: &ProductRecord) -> bool {
        if let Some(name) = &self.name {
            if !product.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price <= min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price >= max {
                return false;
            }
        }
        true
    }
}

/// Normalize a column header: trimmed, lowercased, spaces replaced by `_`.
pub fn normalize_column(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Parse products from CSV data with a header row.
///
/// Rows without a name or with a non-numeric price are skipped. When two
/// headers normalize to the same name, the first column wins.
pub fn parse_products<R: Read>(reader: R) -> Result<Vec<ProductRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_column).collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LuchError::Source(format!("product table has no '{}' column", name)))
    };
    let name_idx = column("name")?;
    let price_idx = column("price")?;

    // Extra columns, minus the required ones and any repeated header
    let mut seen: HashSet<&str> = HashSet::from(["name", "price"]);
    let mut extra_columns = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if idx == name_idx || idx == price_idx {
            continue;
        }
        if !seen.insert(header.as_str()) {
            warn!("Ignoring duplicate product column '{}' (column {})", header, idx + 1);
            continue;
        }
        extra_columns.push((idx, header));
    }

    let mut products = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let name = record.get(name_idx).unwrap_or_default();
        if name.is_empty() {
            warn!("Skipping product on line {}: empty name", line);
            continue;
        }

        let raw_price = record.get(price_idx).unwrap_or_default();
        let Some(price) = parse_price(raw_price) else {
            warn!("Skipping product '{}' on line {}: invalid price '{}'", name, line, raw_price);
            continue;
        };

        let fields: Map<String, Value> = extra_columns
            .iter()
            .map(|(idx, header)| (header.to_string(), cell_value(record.get(*idx).unwrap_or_default())))
            .collect();

        products.push(ProductRecord {
            name: name.to_string(),
            price,
            fields,
        });
    }

    Ok(products)
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Convert a CSV cell to the closest JSON value.
fn cell_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    match raw.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
