pub mod grocery;
pub mod recipe;
