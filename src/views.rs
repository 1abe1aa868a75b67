// Presentation views: stored entities plus their derived list fields.
//
// The catalog stores list-valued attributes as comma-separated text. Views
// split them for rendering without touching the stored record.

use serde::Serialize;

use crate::db::{Map, Operator};

/// Split a comma-separated column into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// URL slug for a catalog name: lower-cased, spaces replaced by dashes.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatorView {
    #[serde(flatten)]
    pub operator: Operator,
    pub slug: String,
    pub secondary_gadgets_list: Vec<String>,
    pub synergy_list: Vec<String>,
    pub counter_list: Vec<String>,
}

impl From<Operator> for OperatorView {
    fn from(operator: Operator) -> Self {
        Self {
            slug: slugify(&operator.name),
            secondary_gadgets_list: split_list(&operator.secondary_gadgets),
            synergy_list: split_list(&operator.synergy_examples),
            counter_list: split_list(&operator.counter_examples),
            operator,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    #[serde(flatten)]
    pub map: Map,
    pub slug: String,
    pub defender_sites_list: Vec<String>,
}

impl From<Map> for MapView {
    fn from(map: Map) -> Self {
        Self {
            slug: slugify(&map.name),
            defender_sites_list: split_list(&map.defender_sites),
            map,
        }
    }
}
