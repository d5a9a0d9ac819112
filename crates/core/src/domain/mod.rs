pub mod cart;
pub mod categorizer;
pub mod intent;
pub mod product;
