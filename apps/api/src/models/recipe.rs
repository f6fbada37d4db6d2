use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Meal categories. Declaration order is the display order of the recipe sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Dessert,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snack,
        Category::Dessert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Snack => "snack",
            Category::Dessert => "dessert",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Lunch => "Lunch",
            Category::Dinner => "Dinner",
            Category::Snack => "Snacks",
            Category::Dessert => "Desserts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Deduplicates the chosen tags into display order.
/// An empty selection means "every category".
pub fn normalize_tags(tags: &[Category]) -> Vec<Category> {
    if tags.is_empty() {
        return Category::ALL.to_vec();
    }
    Category::ALL
        .into_iter()
        .filter(|c| tags.contains(c))
        .collect()
}

/// Raw row from the `recipes` table.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub youtube_url: String,
    pub video_id: String,
    pub thumbnail_url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored recipe record, in the wire shape the page consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub youtube_url: String,
    pub video_id: String,
    pub thumbnail_url: String,
    pub title: String,
    pub tags: Vec<Category>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn has_tag(&self, category: Category) -> bool {
        self.tags.contains(&category)
    }
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        // Unknown tag strings are skipped rather than failing the whole list.
        let tags: Vec<Category> = row.tags.iter().filter_map(|t| Category::parse(t)).collect();
        Self {
            id: row.id,
            youtube_url: row.youtube_url,
            video_id: row.video_id,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            tags,
            created_at: row.created_at,
        }
    }
}

/// A recipe about to be appended. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub youtube_url: String,
    pub video_id: String,
    /// Ignored on input over HTTP; rebuilt from `video_id`.
    #[serde(default)]
    pub thumbnail_url: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<Category>,
}

impl NewRecipe {
    pub fn tag_strings(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_means_every_category() {
        assert_eq!(normalize_tags(&[]), Category::ALL.to_vec());
    }

    #[test]
    fn test_normalize_dedupes_and_orders() {
        let tags = normalize_tags(&[Category::Dessert, Category::Breakfast, Category::Dessert]);
        assert_eq!(tags, vec![Category::Breakfast, Category::Dessert]);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Category::parse("Dinner"), Some(Category::Dinner));
        assert_eq!(Category::parse(" snack "), Some(Category::Snack));
        assert_eq!(Category::parse("brunch"), None);
    }

    #[test]
    fn test_row_conversion_skips_unknown_tags() {
        let row = RecipeRow {
            id: Uuid::new_v4(),
            youtube_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
            thumbnail_url: "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string(),
            title: "Pancakes".to_string(),
            tags: vec!["breakfast".to_string(), "brunch".to_string()],
            created_at: Utc::now(),
        };
        let recipe = Recipe::from(row);
        assert_eq!(recipe.tags, vec![Category::Breakfast]);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let recipe = NewRecipe {
            youtube_url: "u".to_string(),
            video_id: "v".to_string(),
            thumbnail_url: "t".to_string(),
            title: "x".to_string(),
            tags: vec![Category::Lunch],
        };
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["youtubeUrl"], "u");
        assert_eq!(json["videoId"], "v");
        assert_eq!(json["thumbnailUrl"], "t");
        assert_eq!(json["tags"][0], "lunch");
    }
}
