use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::parse_int_prefix;

pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

/// Fixed per-category image pools. A product gets `pool[id % pool.len()]`.
pub const IMAGE_POOLS: &[(&str, &[&str])] = &[
    (
        "Clothes",
        &[
            "https://picsum.photos/seed/clothes1/600/400",
            "https://picsum.photos/seed/clothes2/600/400",
            "https://picsum.photos/seed/fashion1/600/400",
            "https://picsum.photos/seed/fashion2/600/400",
            "https://picsum.photos/seed/apparel/600/400",
        ],
    ),
    (
        "Electronics",
        &[
            "https://picsum.photos/seed/tech1/600/400",
            "https://picsum.photos/seed/tech2/600/400",
            "https://picsum.photos/seed/gadget1/600/400",
            "https://picsum.photos/seed/gadget2/600/400",
            "https://picsum.photos/seed/electronic/600/400",
        ],
    ),
    (
        "Shoes",
        &[
            "https://picsum.photos/seed/shoes1/600/400",
            "https://picsum.photos/seed/shoes2/600/400",
            "https://picsum.photos/seed/footwear1/600/400",
            "https://picsum.photos/seed/footwear2/600/400",
            "https://picsum.photos/seed/sneakers/600/400",
        ],
    ),
    (
        "Miscellaneous",
        &[
            "https://picsum.photos/seed/misc1/600/400",
            "https://picsum.photos/seed/misc2/600/400",
            "https://picsum.photos/seed/various1/600/400",
            "https://picsum.photos/seed/various2/600/400",
            "https://picsum.photos/seed/random/600/400",
        ],
    ),
    (
        "Furniture",
        &[
            "https://picsum.photos/seed/furniture1/600/400",
            "https://picsum.photos/seed/furniture2/600/400",
            "https://picsum.photos/seed/home1/600/400",
            "https://picsum.photos/seed/home2/600/400",
            "https://picsum.photos/seed/decor/600/400",
        ],
    ),
];

#[derive(Debug, Error)]
pub enum ImagesError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON array of products in {path}")]
    NotAnArray { path: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixReport {
    pub backup: PathBuf,
    pub replaced: usize,
}

pub fn pool_for(category: &str) -> &'static [&'static str] {
    IMAGE_POOLS
        .iter()
        .find(|(name, _)| *name == category)
        .or_else(|| IMAGE_POOLS.iter().find(|(name, _)| *name == FALLBACK_CATEGORY))
        .map(|(_, pool)| *pool)
        .unwrap_or(&[])
}

/// Deterministic pick for one product.
pub fn image_for(product_id: u64, category: &str) -> Option<&'static str> {
    let pool = pool_for(category);
    if pool.is_empty() {
        return None;
    }
    Some(pool[(product_id % pool.len() as u64) as usize])
}

fn product_id(product: &Value) -> u64 {
    match product.get("id") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => parse_int_prefix(s)
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        _ => 0,
    }
}

/// Rewrites every product's `images` to a single pooled URL. Returns how
/// many products were touched.
pub fn normalize_products(products: &mut [Value]) -> usize {
    let mut replaced = 0;
    for product in products.iter_mut() {
        let category = product
            .get("category")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string();
        let id = product_id(product);
        let (Some(url), Some(object)) = (image_for(id, &category), product.as_object_mut())
        else {
            continue;
        };
        object.insert(
            "images".to_string(),
            Value::Array(vec![Value::String(url.to_string())]),
        );
        replaced += 1;
    }
    replaced
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

fn to_pretty_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    if value.serialize(&mut ser).is_err() {
        return b"[]".to_vec();
    }
    out
}

/// Backs the document up next to itself, then normalizes it in place.
pub fn fix_images_file(path: &Path) -> Result<FixReport, ImagesError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ImagesError::Read {
        path: display.clone(),
        source,
    })?;
    let mut doc: Value = serde_json::from_str(&raw).map_err(|source| ImagesError::Parse {
        path: display.clone(),
        source,
    })?;

    let backup = backup_path(path);
    std::fs::write(&backup, to_pretty_json(&doc)).map_err(|source| ImagesError::Write {
        path: backup.display().to_string(),
        source,
    })?;

    let products = match &mut doc {
        Value::Array(items) => items,
        Value::Object(map) => match map.get_mut("products") {
            Some(Value::Array(items)) => items,
            _ => return Err(ImagesError::NotAnArray { path: display }),
        },
        _ => return Err(ImagesError::NotAnArray { path: display }),
    };
    let replaced = normalize_products(products);

    std::fs::write(path, to_pretty_json(&doc)).map_err(|source| ImagesError::Write {
        path: display.clone(),
        source,
    })?;
    log::info!("normalized images for {replaced} products in {display}");
    Ok(FixReport { backup, replaced })
}
