//! Strapi REST query construction.
//!
//! Queries are built as nested JSON trees (the same shape the `qs` package
//! accepts) and flattened into bracketed query pairs, e.g.
//! `populate[blocks][on][layout.hero-section][populate][image][fields][0]=url`.

use serde_json::{Value, json};

use crate::model::Summary;

pub const PAGE_SIZE: u32 = 4;

pub const HERO_SECTION: &str = "layout.hero-section";
pub const FEATURES_SECTION: &str = "layout.features-section";

pub fn build_home_page_query() -> Value {
    json!({
        "populate": {
            "blocks": {
                "on": {
                    HERO_SECTION: {
                        "populate": {
                            "image": { "fields": ["url", "alternativeText"] },
                            "link": { "populate": true },
                        },
                    },
                    FEATURES_SECTION: {
                        "populate": {
                            "feature": { "populate": true },
                        },
                    },
                },
            },
        },
    })
}

pub fn build_global_query() -> Value {
    json!({
        "populate": [
            "header.logoText",
            "header.ctaButton",
            "footer.logoText",
            "footer.socialLink",
        ],
    })
}

pub fn build_metadata_query() -> Value {
    json!({ "fields": ["title", "description"] })
}

/// Single summaries are addressed by path; nothing extra to select.
pub fn build_summary_query() -> Value {
    json!({})
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummariesQuery {
    pub search: String,
    pub page: u32,
}

pub fn build_summaries_query(search: &str, page: u32) -> SummariesQuery {
    SummariesQuery {
        search: search.to_owned(),
        page: page.max(1),
    }
}

impl SummariesQuery {
    pub const SORT: &'static str = "createdAt:desc";
    pub const SEARCH_FIELDS: [&'static str; 2] = ["title", "summary"];

    pub fn to_value(&self) -> Value {
        let or = Self::SEARCH_FIELDS
            .iter()
            .map(|field| json!({ *field: { "$containsi": self.search } }))
            .collect::<Vec<_>>();

        json!({
            "sort": [Self::SORT],
            "filters": { "$or": or },
            "pagination": {
                "pageSize": PAGE_SIZE,
                "page": self.page,
            },
        })
    }

    /// Local evaluation of the `$or`/`$containsi` filter this query sends.
    pub fn matches(&self, summary: &Summary) -> bool {
        let needle = self.search.to_lowercase();
        [summary.title.as_str(), summary.summary.as_str()]
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
    }
}

/// Flattens a query tree into `qs`-style pairs (indexed arrays, bracketed keys).
pub fn to_query_pairs(query: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    match query {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(key.clone(), value, &mut pairs);
            }
        }
        Value::Null => {}
        other => {
            tracing::warn!(query = %other, "query root must be an object; ignoring");
        }
    }
    pairs
}

fn flatten_into(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(format!("{prefix}[{key}]"), child, pairs);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_into(format!("{prefix}[{idx}]"), child, pairs);
            }
        }
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Bool(b) => pairs.push((prefix, b.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        // qs skips null values entirely.
        Value::Null => {}
    }
}
