use serde::{Deserialize, Serialize};

use crate::models::recipe::{Category, Recipe};

/// Top-level page selector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Recipes,
    Grocery,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub category: Category,
    pub label: &'static str,
    pub recipes: Vec<Recipe>,
}

/// Case-insensitive substring match on the title. An empty search matches everything.
pub fn matches_search(recipe: &Recipe, search: &str) -> bool {
    recipe.title.to_lowercase().contains(&search.to_lowercase())
}

/// One section per category, always in category order, each holding the
/// recipes that match `search` and carry that tag. Recipe order is the
/// order of `recipes`.
pub fn build_sections(recipes: &[Recipe], search: &str) -> Vec<Section> {
    let matching: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| matches_search(r, search))
        .collect();

    Category::ALL
        .into_iter()
        .map(|category| Section {
            category,
            label: category.label(),
            recipes: matching
                .iter()
                .filter(|r| r.has_tag(category))
                .map(|r| (*r).clone())
                .collect(),
        })
        .collect()
}
