use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    Add,
    Remove,
    Search,
    /// Nothing actionable was recognised.
    None,
}

impl IntentAction {
    /// Parses one of the three actionable labels. `None` is never produced here.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "search" => Some(Self::Search),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Search => "search",
            Self::None => "none",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured search constraints. Every field is optional and the set is conjunctive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl SearchFilters {
    pub fn with_brand(brand: impl Into<String>) -> Self {
        Self { brand: Some(brand.into()), ..Self::default() }
    }

    pub fn with_max_price(max_price: Decimal) -> Self {
        Self { max_price: Some(max_price), ..Self::default() }
    }

    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self { tags: [tag.into()].into_iter().collect(), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.category.is_none()
            && self.size.is_none()
            && self.tags.is_empty()
    }
}

/// A cart command extracted from one utterance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    pub item: Option<String>,
    /// Always at least 1. Meaningless for searches.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
}

impl Intent {
    pub fn none() -> Self {
        Self { action: IntentAction::None, item: None, quantity: 1, filters: None }
    }

    pub fn add(item: impl Into<String>, quantity: u32) -> Self {
        Self { action: IntentAction::Add, item: Some(item.into()), quantity: quantity.max(1), filters: None }
    }

    pub fn remove(item: impl Into<String>) -> Self {
        Self { action: IntentAction::Remove, item: Some(item.into()), quantity: 1, filters: None }
    }

    pub fn search(item: impl Into<String>, filters: Option<SearchFilters>) -> Self {
        Self { action: IntentAction::Search, item: Some(item.into()), quantity: 1, filters }
    }

    /// The item name when the intent can be acted on.
    pub fn actionable_item(&self) -> Option<&str> {
        if !self.action.is_actionable() {
            return None;
        }
        self.item.as_deref().filter(|item| !item.trim().is_empty())
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::none()
    }
}
