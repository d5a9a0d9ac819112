use std::collections::BTreeMap;

/// Static grouping of category labels into broad buckets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryRelationTable {
    groups: BTreeMap<String, Vec<String>>,
}

impl CategoryRelationTable {
    pub fn new(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Distinct categories that share at least one group.
    pub fn are_related(&self, left: &str, right: &str) -> bool {
        if left == right {
            return false;
        }
        self.groups.values().any(|members| {
            members.iter().any(|member| member == left) && members.iter().any(|member| member == right)
        })
    }

    /// The grocery/retail grouping the demo catalog is labelled with.
    pub fn retail_defaults() -> Self {
        let food = [
            "Produce", "Dairy", "Meat", "Snacks", "Beverages", "Pantry", "Frozen", "Bakery",
            "Prepared Meals", "Condiments", "Baking", "Grains", "Pasta", "Soups", "Canned Goods",
            "Breakfast", "Meal Kits", "Salads", "Meat Substitutes", "Meats", "Seafood", "Desserts",
            "Spices", "Baking Goods", "Prepared Foods", "Frozen Meals", "Frozen Foods", "Vegetable",
            "Vegetables",
        ]
        .iter()
        .map(|suffix| format!("Food - {suffix}"))
        .collect::<Vec<_>>();
        let clothing = ["Outerwear", "Activewear", "Tops", "Bottoms", "Dresses", "Footwear", "Accessories"]
            .iter()
            .map(|suffix| format!("Clothing - {suffix}"))
            .collect::<Vec<_>>();

        let mut groups = BTreeMap::new();
        groups.insert("Food".to_owned(), food);
        groups.insert("Clothing".to_owned(), clothing);
        for (group, members) in [
            ("Electronics", &["Electronics", "Computers", "Audio", "Photography", "Wearable Tech", "Smart Home"][..]),
            ("Home", &["Home", "Kitchen", "Home Appliances", "Garden", "Office"][..]),
            ("Health", &["Health", "Fitness", "Beauty"][..]),
            ("Outdoor", &["Outdoor", "Sports", "Bicycles", "Automotive"][..]),
            ("Toys", &["Toys"][..]),
            ("Pets", &["Pets"][..]),
            ("Storage", &["Storage"][..]),
        ] {
            groups.insert(group.to_owned(), members.iter().map(|member| (*member).to_owned()).collect());
        }

        Self { groups }
    }
}
