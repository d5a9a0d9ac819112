use serde::{Deserialize, Serialize};

pub const FALLBACK_CATEGORY: &str = "Other";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(category: &str, keywords: &[&str]) -> Self {
        Self {
            category: category.to_owned(),
            keywords: keywords.iter().map(|keyword| (*keyword).to_owned()).collect(),
        }
    }
}

/// Assigns a shopping-list aisle to free-text item names.
///
/// Rules are checked in order and the first rule with a keyword contained in
/// the lower-cased name wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemCategorizer {
    rules: Vec<CategoryRule>,
}

impl ItemCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn categorize(&self, name: &str) -> &str {
        let lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| lower.contains(keyword.as_str())))
            .map(|rule| rule.category.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

impl Default for ItemCategorizer {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new("Dairy", &["milk", "cheese", "yogurt", "butter", "cream"]),
            CategoryRule::new(
                "Produce",
                &[
                    "apple", "banana", "orange", "lettuce", "tomato", "onion", "garlic", "spinach",
                    "carrot", "potato",
                ],
            ),
            CategoryRule::new("Bakery", &["bread", "bun", "bagel", "tortilla"]),
            CategoryRule::new(
                "Meat & Seafood",
                &["chicken", "beef", "pork", "fish", "salmon", "shrimp"],
            ),
            CategoryRule::new("Snacks", &["chips", "cookies", "crackers", "popcorn", "candy"]),
            CategoryRule::new("Beverages", &["juice", "soda", "water", "coffee", "tea"]),
            CategoryRule::new(
                "Pantry",
                &["rice", "pasta", "bean", "flour", "sugar", "oil", "salt", "pepper"],
            ),
            CategoryRule::new("Frozen", &["frozen", "ice cream", "peas", "fries"]),
            CategoryRule::new("Household", &["soap", "detergent", "paper", "towel", "foil"]),
        ])
    }
}
