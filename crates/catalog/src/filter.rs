use aikesif_core::{CategoryFilter, FavoritesSet, Tool};

/// Inputs that decide which tools are visible.
#[derive(Debug, Clone, Copy)]
pub struct FilterCriteria<'a> {
    pub category: CategoryFilter,
    pub query: &'a str,
    pub favorites_only: bool,
    pub favorites: &'a FavoritesSet,
}

/// Stable filter: the result keeps the relative order of `tools`.
pub fn filter_tools<'a>(tools: &'a [Tool], criteria: &FilterCriteria<'_>) -> Vec<&'a Tool> {
    let query = criteria.query.to_lowercase();
    tools
        .iter()
        .filter(|tool| criteria.category.matches(tool.category))
        .filter(|tool| matches_query(tool, &query))
        .filter(|tool| !criteria.favorites_only || criteria.favorites.contains(&tool.id))
        .collect()
}

/// `query` must already be lowercased. An empty query matches everything.
pub fn matches_query(tool: &Tool, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    tool.name.to_lowercase().contains(query)
        || tool.description.to_lowercase().contains(query)
        || tool.category.as_str().to_lowercase().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aikesif_core::Category;

    fn tool(id: &str, name: &str, description: &str, category: Category) -> Tool {
        Tool {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            long_description: String::new(),
            category,
            url: format!("https://{id}.example"),
            image_url: String::new(),
            is_popular: false,
        }
    }

    fn sample() -> Vec<Tool> {
        vec![
            tool("a", "Asistan", "yazı", Category::Metin),
            tool("b", "Pix", "resim", Category::Gorsel),
            tool("c", "Klip", "film", Category::Video),
            tool("d", "Kare", "poster", Category::Gorsel),
        ]
    }

    fn ids(tools: &[&Tool]) -> Vec<String> {
        tools.iter().map(|t| t.id.clone()).collect()
    }

    fn criteria<'a>(
        category: CategoryFilter,
        query: &'a str,
        favorites_only: bool,
        favorites: &'a FavoritesSet,
    ) -> FilterCriteria<'a> {
        FilterCriteria {
            category,
            query,
            favorites_only,
            favorites,
        }
    }

    #[test]
    fn all_category_returns_everything_in_order() {
        let tools = sample();
        let none = FavoritesSet::new();
        let out = filter_tools(&tools, &criteria(CategoryFilter::All, "", false, &none));
        assert_eq!(ids(&out), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn category_keeps_only_matching_tools() {
        let tools = sample();
        let none = FavoritesSet::new();
        let out = filter_tools(
            &tools,
            &criteria(CategoryFilter::Only(Category::Gorsel), "", false, &none),
        );
        assert_eq!(ids(&out), vec!["b", "d"]);
        assert!(out.iter().all(|t| t.category == Category::Gorsel));
    }

    #[test]
    fn query_is_case_insensitive_over_name_description_category() {
        let tools = sample();
        let none = FavoritesSet::new();

        let by_name = filter_tools(&tools, &criteria(CategoryFilter::All, "PIX", false, &none));
        assert_eq!(ids(&by_name), vec!["b"]);

        let by_description =
            filter_tools(&tools, &criteria(CategoryFilter::All, "Film", false, &none));
        assert_eq!(ids(&by_description), vec!["c"]);

        let by_category =
            filter_tools(&tools, &criteria(CategoryFilter::All, "görsel", false, &none));
        assert_eq!(ids(&by_category), vec!["b", "d"]);
    }

    #[test]
    fn favorites_only_with_empty_set_is_empty() {
        let tools = sample();
        let none = FavoritesSet::new();
        let out = filter_tools(&tools, &criteria(CategoryFilter::All, "", true, &none));
        assert!(out.is_empty());
    }

    #[test]
    fn favorites_only_is_subset_of_other_filters() {
        let tools = sample();
        let favorites = FavoritesSet::from_ids(["b", "c"]);
        let category = CategoryFilter::Only(Category::Gorsel);

        let base = filter_tools(&tools, &criteria(category, "", false, &favorites));
        let only = filter_tools(&tools, &criteria(category, "", true, &favorites));

        let expected: Vec<&Tool> = base
            .into_iter()
            .filter(|t| favorites.contains(&t.id))
            .collect();
        assert_eq!(only, expected);
        assert_eq!(ids(&only), vec!["b"]);
    }

    #[test]
    fn filter_is_repeatable() {
        let tools = sample();
        let favorites = FavoritesSet::from_ids(["a"]);
        let c = criteria(CategoryFilter::All, "a", false, &favorites);
        assert_eq!(filter_tools(&tools, &c), filter_tools(&tools, &c));
    }

    #[test]
    fn query_is_not_trimmed() {
        let tools = sample();
        let none = FavoritesSet::new();
        let out = filter_tools(&tools, &criteria(CategoryFilter::All, "pix ", false, &none));
        assert!(out.is_empty());
    }
}
