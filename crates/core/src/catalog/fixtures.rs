//! Deterministic demo catalog used when no catalog file is configured.

use rust_decimal::Decimal;

use super::CatalogIndex;
use crate::domain::product::Product;

/// Builds a product with empty size and description.
pub fn product(name: &str, brand: &str, category: &str, price: Decimal, tags: &[&str]) -> Product {
    Product {
        name: name.to_owned(),
        brand: brand.to_owned(),
        category: category.to_owned(),
        price,
        size: String::new(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        description: String::new(),
    }
}

fn item(
    name: &str,
    brand: &str,
    category: &str,
    price_cents: i64,
    size: &str,
    tags: &[&str],
    description: &str,
) -> Product {
    Product {
        size: size.to_owned(),
        description: description.to_owned(),
        ..product(name, brand, category, Decimal::new(price_cents, 2), tags)
    }
}

pub fn demo_catalog() -> CatalogIndex {
    let products = vec![
        item("Organic Bananas", "Dole", "Food - Produce", 59, "1 lb", &["organic", "fresh", "fruit"], "Sweet organic bananas, sold by the pound"),
        item("Gala Apples", "Stemilt", "Food - Produce", 199, "3 lb bag", &["fresh", "fruit"], "Crisp gala apples"),
        item("Organic Apples", "Honeycrisp Farms", "Food - Produce", 449, "2 lb bag", &["organic", "fresh", "fruit"], "Organic honeycrisp apples"),
        item("Baby Spinach", "Earthbound Farm", "Food - Produce", 399, "5 oz", &["organic", "fresh", "vegetable"], "Pre-washed organic baby spinach"),
        item("Whole Milk", "Horizon", "Food - Dairy", 499, "1 gal", &["organic", "dairy"], "Organic whole milk"),
        item("Greek Yogurt", "Chobani", "Food - Dairy", 129, "5.3 oz", &["dairy", "protein"], "Plain non-fat greek yogurt"),
        item("Cheddar Cheese", "Tillamook", "Food - Dairy", 549, "8 oz", &["dairy"], "Sharp cheddar block"),
        item("Sourdough Bread", "La Brea", "Food - Bakery", 549, "24 oz", &["fresh", "bakery"], "Fresh baked sourdough loaf"),
        item("Chicken Breast", "Perdue", "Food - Meat", 899, "1.5 lb", &["protein", "fresh"], "Boneless skinless chicken breast"),
        item("Atlantic Salmon", "Blue Harbor", "Food - Seafood", 1299, "1 lb", &["protein", "fresh", "seafood"], "Farm-raised salmon fillet"),
        item("Potato Chips", "Lay's", "Food - Snacks", 429, "8 oz", &["snack"], "Classic salted potato chips"),
        item("Sparkling Water", "LaCroix", "Food - Beverages", 499, "12 pack", &["beverage", "sparkling"], "Lime flavored sparkling water"),
        item("Cold Brew Coffee", "Stumptown", "Food - Beverages", 599, "10.5 oz", &["beverage", "caffeine"], "Ready to drink cold brew"),
        item("Spaghetti", "Barilla", "Food - Pasta", 189, "16 oz", &["pantry"], "Durum wheat spaghetti"),
        item("Frozen Peas", "Birds Eye", "Food - Frozen", 249, "12 oz", &["frozen", "vegetable"], "Sweet garden peas"),
        item("Whitening Toothpaste", "Colgate", "Health", 399, "4.8 oz", &["oral care"], "Fluoride whitening toothpaste"),
        item("Sensitive Toothpaste", "Sensodyne", "Health", 699, "4 oz", &["oral care", "sensitive"], "Toothpaste for sensitive teeth"),
        item("Running Shoes", "Nike", "Clothing - Footwear", 11999, "10", &["athletic", "running"], "Lightweight road running shoes"),
        item("Training Shoes", "Adidas", "Clothing - Footwear", 8999, "10", &["athletic", "training"], "Cross training shoes"),
        item("Hoodie", "Nike", "Clothing - Tops", 5999, "M", &["athletic", "cotton"], "Fleece pullover hoodie"),
        item("Wireless Earbuds", "Sony", "Audio", 12999, "one size", &["wireless", "bluetooth"], "Noise cancelling earbuds"),
        item("Bluetooth Speaker", "JBL", "Electronics", 7999, "portable", &["wireless", "bluetooth"], "Waterproof portable speaker"),
        item("Paper Towels", "Bounty", "Home", 1899, "6 rolls", &["household", "paper"], "Select-a-size paper towels"),
        item("Dish Soap", "Dawn", "Kitchen", 349, "19.4 oz", &["household", "cleaning"], "Grease fighting dish soap"),
        item("Dog Food", "Purina", "Pets", 2499, "15 lb", &["pet", "dog"], "Adult dry dog food"),
    ];

    CatalogIndex { products }
}
