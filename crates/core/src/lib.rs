//! Core domain types for the AI Keşif Rehberi catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

mod session;

pub use session::{
    AuthError, AuthEvent, FAVORITES_KEY, FIELD_OF_WORK_KEY, FIRST_NAME_KEY, LAST_NAME_KEY,
    Metadata, Profile, Session, SessionHandler, SessionListeners, SessionProvider, Subscription,
    favorites_metadata,
};

/// Classification attached to every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Metin,
    #[serde(rename = "Görsel")]
    Gorsel,
    Video,
    Ses,
    Kodlama,
    #[serde(rename = "Eğitim")]
    Egitim,
    #[serde(rename = "Araştırma")]
    Arastirma,
    Matematik,
    Verimlilik,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Metin,
        Category::Gorsel,
        Category::Video,
        Category::Ses,
        Category::Kodlama,
        Category::Egitim,
        Category::Arastirma,
        Category::Matematik,
        Category::Verimlilik,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Metin => "Metin",
            Category::Gorsel => "Görsel",
            Category::Video => "Video",
            Category::Ses => "Ses",
            Category::Kodlama => "Kodlama",
            Category::Egitim => "Eğitim",
            Category::Arastirma => "Araştırma",
            Category::Matematik => "Matematik",
            Category::Verimlilik => "Verimlilik",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().to_lowercase() == wanted)
            .ok_or("unknown category")
    }
}

/// Category selection used for filtering; `All` is the "Tümü" chip and is
/// never attached to a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub const ALL_LABEL: &'static str = "Tümü";

    /// Chips in display order, "Tümü" first.
    pub const CHIPS: [CategoryFilter; 10] = [
        CategoryFilter::All,
        CategoryFilter::Only(Category::Metin),
        CategoryFilter::Only(Category::Gorsel),
        CategoryFilter::Only(Category::Video),
        CategoryFilter::Only(Category::Ses),
        CategoryFilter::Only(Category::Kodlama),
        CategoryFilter::Only(Category::Egitim),
        CategoryFilter::Only(Category::Arastirma),
        CategoryFilter::Only(Category::Matematik),
        CategoryFilter::Only(Category::Verimlilik),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => Self::ALL_LABEL,
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }

    pub fn next(self) -> Self {
        let idx = self.chip_index();
        Self::CHIPS[(idx + 1) % Self::CHIPS.len()]
    }

    pub fn prev(self) -> Self {
        let idx = self.chip_index();
        Self::CHIPS[(idx + Self::CHIPS.len() - 1) % Self::CHIPS.len()]
    }

    pub fn chip_index(&self) -> usize {
        Self::CHIPS
            .iter()
            .position(|chip| chip == self)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().to_lowercase() == Self::ALL_LABEL.to_lowercase() {
            return Ok(CategoryFilter::All);
        }
        value.parse::<Category>().map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub long_description: String,
    pub category: Category,
    pub url: String,
    pub image_url: String,
    #[serde(default)]
    pub is_popular: bool,
}

/// Account snapshot derived from the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub field_of_work: String,
    pub is_registered: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Tool ids the signed-in user marked as favorite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FavoritesSet(BTreeSet<String>);

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Flips membership and reports whether `id` is now a favorite.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err("unknown theme"),
        }
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 72;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub remember_session: bool,
    pub password_min_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            remember_session: true,
            password_min_len: MIN_PASSWORD_LEN,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.password_min_len = self
            .password_min_len
            .clamp(MIN_PASSWORD_LEN, MAX_PASSWORD_LEN);
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
    }
}
