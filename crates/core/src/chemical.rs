//! Agrochemical product matches and the shapes derived from them.
//!
//! A [`ChemicalSearchResult`] is what the resolver hands to the data bundle.
//! A [`ChemicalContext`] is the trimmed form that is allowed into a
//! conversation's context frame: products carry only `{id, name, score}`.

use serde::{Deserialize, Serialize};

/// One product returned by the product index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalMatch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChemicalMatch {
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The frame-safe `{id, name, score}` projection.
    pub fn trimmed(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            score: self.score,
            description: None,
        }
    }
}

/// Outcome of a chemical resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalSearchResult {
    /// Human-readable summary enumerating product names
    #[serde(default)]
    pub answer: String,
    pub success: bool,
    #[serde(default)]
    pub products: Vec<ChemicalMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<ChemicalMatch>,
}

impl ChemicalSearchResult {
    /// A successful resolution for `query`.
    pub fn found(query: &str, products: Vec<ChemicalMatch>, best_match: Option<ChemicalMatch>) -> Self {
        Self {
            answer: summarize(&format!("Found {} products matching \"{query}\"", products.len()), &products),
            success: true,
            products,
            best_match,
        }
    }

    /// Nothing matched and there was nothing in context to fall back on.
    pub fn not_found(query: &str) -> Self {
        Self {
            answer: format!("No products found matching \"{query}\". Please try again."),
            success: false,
            products: Vec::new(),
            best_match: None,
        }
    }

    /// Re-present a frame's chemical context as a result, without searching.
    pub fn carried_over(context: &ChemicalContext) -> Self {
        Self {
            answer: summarize(
                &format!("{} products from earlier in the conversation", context.products.len()),
                &context.products,
            ),
            success: context.success,
            products: context.products.clone(),
            best_match: context.best_match.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn summarize(headline: &str, products: &[ChemicalMatch]) -> String {
    let lines: Vec<String> = products.iter().map(|p| format!("- {}", p.name)).collect();
    format!("{headline}:\n{}", lines.join("\n"))
}

/// The trimmed chemical entry stored in a context frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalContext {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<ChemicalMatch>,
    #[serde(default)]
    pub products: Vec<ChemicalMatch>,
}

impl ChemicalContext {
    /// Trim a search result for storage. The best match falls back to the
    /// first product when the result did not name one.
    pub fn from_result(result: &ChemicalSearchResult) -> Self {
        let best_match = result
            .best_match
            .clone()
            .or_else(|| result.products.first().cloned());
        Self {
            success: result.success,
            best_match,
            products: result.products.iter().map(ChemicalMatch::trimmed).collect(),
        }
    }
}
