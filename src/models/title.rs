use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a movie or TV series that can be watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Unique identifier for the title
    pub id: Uuid,
    /// Display name of the movie or series
    pub name: String,
    /// Kind of content
    pub category: Category,
}

/// Kind of content a title belongs to
///
/// Variants are declared in lexical order of their names so the derived
/// `Ord` doubles as the category tie-break order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    Series,
}

impl Category {
    /// Plural noun used in user-facing explanations
    pub fn plural_label(&self) -> &'static str {
        match self {
            Category::Movie => "movies",
            Category::Series => "TV series",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Movie => write!(f, "movie"),
            Category::Series => write!(f, "series"),
        }
    }
}

impl Title {
    /// Creates a new title
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
        }
    }
}
