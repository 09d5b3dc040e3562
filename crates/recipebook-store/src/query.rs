//! Pure filtering and ordering over recipe lists.
//!
//! Nothing here touches the store; callers pass in a snapshot (usually
//! [`RecipeStore::all_recipes`](crate::RecipeStore::all_recipes)) and get a
//! new list back.

use std::cmp::Ordering;
use std::collections::HashSet;

use recipebook_shared::constants::{CATEGORY_ALL, CATEGORY_MINE};
use recipebook_shared::{Recipe, RecipeKey};

use crate::seed::SeedCategory;

/// Which recipes a listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Only recipes authored by the user.
    Mine,
    /// Recipes whose category label equals this one exactly.
    Named(String),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            CATEGORY_ALL => Self::All,
            CATEGORY_MINE => Self::Mine,
            label => Self::Named(label.to_string()),
        }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            Self::All => true,
            Self::Mine => recipe.is_user_authored,
            Self::Named(label) => recipe.category.as_deref() == Some(label.as_str()),
        }
    }
}

impl From<SeedCategory> for CategoryFilter {
    fn from(category: SeedCategory) -> Self {
        Self::Named(category.label().to_string())
    }
}

pub fn filter_by_category(recipes: Vec<Recipe>, filter: &CategoryFilter) -> Vec<Recipe> {
    recipes.into_iter().filter(|r| filter.matches(r)).collect()
}

/// Keep recipes whose title or any ingredient name contains `text`,
/// ignoring case. Empty text keeps everything.
pub fn filter_by_search_text(recipes: Vec<Recipe>, text: &str) -> Vec<Recipe> {
    if text.is_empty() {
        return recipes;
    }
    let needle = text.to_lowercase();
    recipes
        .into_iter()
        .filter(|recipe| {
            recipe.title.to_lowercase().contains(&needle)
                || recipe
                    .ingredients
                    .iter()
                    .any(|i| i.name.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Keep recipes that cook in at most `max` minutes. Anything that is not a
/// positive whole number disables the filter.
pub fn filter_by_max_cooking_time(recipes: Vec<Recipe>, max: &str) -> Vec<Recipe> {
    match parse_max_minutes(max) {
        Some(max) => recipes
            .into_iter()
            .filter(|r| r.cooking_time_minutes <= max)
            .collect(),
        None => recipes,
    }
}

fn parse_max_minutes(max: &str) -> Option<u32> {
    max.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Most viewed first; ties go to the newer recipe. Stable.
pub fn sort_by_popularity(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| {
        b.view_count
            .cmp(&a.view_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Order by the numeric suffix of the seed id (`ghibli_2` → 2). Recipes
/// without one go last. Stable.
pub fn sort_by_category_order(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| match (seed_position(a), seed_position(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn seed_position(recipe: &Recipe) -> Option<u32> {
    recipe
        .seed_id
        .as_deref()?
        .rsplit('_')
        .next()?
        .parse()
        .ok()
}

/// Alphabetical by title, case-insensitive.
pub fn sort_by_title(recipes: &mut [Recipe]) {
    recipes.sort_by_cached_key(|r| r.title.to_lowercase());
}

/// Drop repeated identities, keeping the first occurrence.
pub fn dedupe(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen: HashSet<RecipeKey> = HashSet::with_capacity(recipes.len());
    recipes
        .into_iter()
        .filter(|r| seen.insert(r.key()))
        .collect()
}

/// The filter screen's combined query.
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub category: CategoryFilter,
    pub search_text: String,
    /// Free text; see [`filter_by_max_cooking_time`].
    pub max_cooking_time: String,
}

impl RecipeQuery {
    pub fn apply(&self, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let recipes = dedupe(recipes);
        let recipes = filter_by_category(recipes, &self.category);
        let recipes = filter_by_search_text(recipes, &self.search_text);
        let mut recipes = filter_by_max_cooking_time(recipes, &self.max_cooking_time);
        sort_by_popularity(&mut recipes);
        recipes
    }
}

/// Seed recipes of one category in catalog order.
pub fn category_section(seeds: &[Recipe], category: SeedCategory) -> Vec<Recipe> {
    let filter = CategoryFilter::from(category);
    let mut section: Vec<Recipe> = seeds.iter().filter(|r| filter.matches(r)).cloned().collect();
    sort_by_category_order(&mut section);
    section
}

/// Data behind the home screen.
#[derive(Debug, Clone)]
pub struct HomeFeed {
    /// User recipes, newest first.
    pub user_recipes: Vec<Recipe>,
    pub sections: Vec<(SeedCategory, Vec<Recipe>)>,
}

pub fn home_feed(user_recipes: &[Recipe], seeds: &[Recipe]) -> HomeFeed {
    let mut user: Vec<Recipe> = user_recipes
        .iter()
        .filter(|r| r.is_user_authored)
        .cloned()
        .collect();
    user.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let sections = SeedCategory::DISPLAY_ORDER
        .into_iter()
        .map(|category| (category, category_section(seeds, category)))
        .collect();

    HomeFeed {
        user_recipes: user,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_catalog;
    use chrono::{Duration, TimeZone, Utc};
    use recipebook_shared::Ingredient;

    fn recipe(title: &str, views: u32, age_minutes: i64) -> Recipe {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Recipe::new(
            title,
            vec![Ingredient::new("Salt", "1 tsp")],
            vec!["Cook".to_string()],
            20,
        )
        .with_views(views)
        .with_created_at(base - Duration::minutes(age_minutes))
    }

    fn titles(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("mine"), CategoryFilter::Mine);
        assert_eq!(
            CategoryFilter::parse("Ghibli"),
            CategoryFilter::Named("Ghibli".into())
        );
    }

    #[test]
    fn test_mine_is_exactly_user_authored() {
        let mut recipes = seed_catalog(Utc::now());
        recipes.push(recipe("Mine A", 0, 0).user_authored());
        recipes.push(recipe("Mine B", 0, 1).user_authored());

        let mine = filter_by_category(recipes.clone(), &CategoryFilter::Mine);
        assert_eq!(titles(&mine), vec!["Mine A", "Mine B"]);

        let all = filter_by_category(recipes.clone(), &CategoryFilter::All);
        assert_eq!(all.len(), recipes.len());
    }

    #[test]
    fn test_named_category() {
        let hogwarts = filter_by_category(
            seed_catalog(Utc::now()),
            &CategoryFilter::from(SeedCategory::Hogwarts),
        );
        assert_eq!(hogwarts.len(), 3);
    }

    #[test]
    fn test_search_matches_title_and_ingredients() {
        let mut with_ingredient = recipe("Soup", 0, 0);
        with_ingredient.ingredients = vec![Ingredient::new("Fresh BASIL", "1 bunch")];
        let recipes = vec![recipe("Basil pesto", 0, 0), with_ingredient, recipe("Toast", 0, 0)];

        let found = filter_by_search_text(recipes.clone(), "basil");
        assert_eq!(titles(&found), vec!["Basil pesto", "Soup"]);

        assert_eq!(filter_by_search_text(recipes, "").len(), 3);
    }

    #[test]
    fn test_search_is_unicode_case_insensitive() {
        let recipes = vec![recipe("Борщ", 0, 0)];
        assert_eq!(filter_by_search_text(recipes, "БОРЩ").len(), 1);
    }

    #[test]
    fn test_max_cooking_time() {
        let mut quick = recipe("Quick", 0, 0);
        quick.cooking_time_minutes = 10;
        let mut slow = recipe("Slow", 0, 0);
        slow.cooking_time_minutes = 90;
        let recipes = vec![quick, slow];

        assert_eq!(titles(&filter_by_max_cooking_time(recipes.clone(), "30")), vec!["Quick"]);
        assert_eq!(filter_by_max_cooking_time(recipes.clone(), "").len(), 2);
        assert_eq!(filter_by_max_cooking_time(recipes.clone(), "0").len(), 2);
        assert_eq!(filter_by_max_cooking_time(recipes.clone(), "-5").len(), 2);
        assert_eq!(filter_by_max_cooking_time(recipes, "soon").len(), 2);
    }

    #[test]
    fn test_popularity_ties_go_to_newer() {
        let mut recipes = vec![
            recipe("old five", 5, 30),
            recipe("three", 3, 0),
            recipe("new five", 5, 10),
        ];
        sort_by_popularity(&mut recipes);
        assert_eq!(titles(&recipes), vec!["new five", "old five", "three"]);
    }

    #[test]
    fn test_seed_popularity() {
        let catalog = seed_catalog(Utc::now());
        let mut hogwarts: Vec<Recipe> = catalog
            .into_iter()
            .filter(|r| matches!(r.seed_id.as_deref(), Some("hogwarts_1" | "hogwarts_2")))
            .rev()
            .collect();
        sort_by_popularity(&mut hogwarts);
        assert_eq!(hogwarts[0].view_count, 100);
        assert_eq!(hogwarts[1].view_count, 80);
    }

    #[test]
    fn test_category_order_puts_unnumbered_last() {
        let mut recipes = vec![
            recipe("none", 0, 0),
            recipe("two", 0, 0).with_seed_id("ghibli_2"),
            recipe("ten", 0, 0).with_seed_id("ghibli_10"),
            recipe("one", 0, 0).with_seed_id("ghibli_1"),
        ];
        sort_by_category_order(&mut recipes);
        assert_eq!(titles(&recipes), vec!["one", "two", "ten", "none"]);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let a = recipe("first", 0, 0);
        let mut copy = a.clone();
        copy.title = "second".into();
        let b = recipe("other", 0, 0);

        let out = dedupe(vec![a, copy, b]);
        assert_eq!(titles(&out), vec!["first", "other"]);
    }

    #[test]
    fn test_sort_by_title() {
        let mut recipes = vec![recipe("banana", 0, 0), recipe("Apple", 0, 0), recipe("cherry", 0, 0)];
        sort_by_title(&mut recipes);
        assert_eq!(titles(&recipes), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_query_pipeline() {
        let mut catalog = seed_catalog(Utc::now());
        let duplicate = catalog[0].clone();
        catalog.push(duplicate);

        let query = RecipeQuery {
            category: CategoryFilter::All,
            search_text: "shrimp".into(),
            max_cooking_time: "30".into(),
        };
        let out = query.apply(catalog);
        assert_eq!(titles(&out), vec!["Adeptus' Temptation"]);
    }

    #[test]
    fn test_home_feed() {
        let seeds = seed_catalog(Utc::now());
        let user = vec![
            recipe("older", 0, 60).user_authored(),
            recipe("newer", 0, 1).user_authored(),
        ];

        let feed = home_feed(&user, &seeds);
        assert_eq!(titles(&feed.user_recipes), vec!["newer", "older"]);

        let order: Vec<SeedCategory> = feed.sections.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, SeedCategory::DISPLAY_ORDER.to_vec());

        let (_, hogwarts) = &feed.sections[2];
        let ids: Vec<_> = hogwarts.iter().filter_map(|r| r.seed_id.as_deref()).collect();
        assert_eq!(ids, vec!["hogwarts_1", "hogwarts_2", "hogwarts_3"]);
    }
}
