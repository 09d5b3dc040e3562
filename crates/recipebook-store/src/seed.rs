//! Built-in recipes shipped with the application.
//!
//! The catalog is built once at startup and never mutated. Every recipe
//! belongs to exactly one [`SeedCategory`] and carries a `{prefix}_{n}`
//! seed id that fixes its position inside the category.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use recipebook_shared::{Ingredient, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedCategory {
    Popular,
    Ghibli,
    Hogwarts,
    Genshin,
}

impl SeedCategory {
    /// Order in which the home feed shows the category sections.
    pub const DISPLAY_ORDER: [SeedCategory; 4] = [
        SeedCategory::Popular,
        SeedCategory::Ghibli,
        SeedCategory::Hogwarts,
        SeedCategory::Genshin,
    ];

    /// Label stored in [`Recipe::category`].
    pub fn label(&self) -> &'static str {
        match self {
            Self::Popular => "Popular",
            Self::Ghibli => "Ghibli",
            Self::Hogwarts => "Hogwarts",
            Self::Genshin => "Genshin",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Ghibli => "ghibli",
            Self::Hogwarts => "hogwarts",
            Self::Genshin => "genshin",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::DISPLAY_ORDER
            .into_iter()
            .find(|category| category.label() == label)
    }

    pub fn seed_id(&self, n: u32) -> String {
        format!("{}_{}", self.prefix(), n)
    }
}

impl std::fmt::Display for SeedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Build the seed catalog. All recipes share `created_at`.
/// Bundled photo of "Adeptus' Temptation".
static ADEPTUS_TEMPTATION_PHOTO: &[u8] = include_bytes!("../assets/adeptus_temptation.png");

pub fn seed_catalog(created_at: DateTime<Utc>) -> Vec<Recipe> {
    let seed = |category: SeedCategory,
                n: u32,
                title: &str,
                ingredients: &[(&str, &str)],
                steps: &[&str],
                minutes: u32,
                views: u32| {
        Recipe::new(
            title,
            ingredients
                .iter()
                .map(|(name, quantity)| Ingredient::new(*name, *quantity))
                .collect(),
            steps.iter().map(|s| s.to_string()).collect(),
            minutes,
        )
        .with_views(views)
        .with_created_at(created_at)
        .with_category(category.label())
        .with_seed_id(category.seed_id(n))
    };

    vec![
        // Hogwarts
        seed(
            SeedCategory::Hogwarts,
            1,
            "Butterbeer",
            &[
                ("Milk", "to taste"),
                ("Heavy cream 33%", "to taste"),
                ("Ginger caramel", "to taste"),
                ("Pumpkin puree", "to taste"),
                ("Ginger spice mix", "to taste"),
            ],
            &[
                "Pour the milk into a saucepan over low heat.",
                "Add the ginger spice mix and stir well.",
                "Let the milk warm through.",
                "Whip the cream to soft peaks and spoon it over the milk.",
            ],
            15,
            100,
        ),
        seed(
            SeedCategory::Hogwarts,
            2,
            "Roast pork",
            &[
                ("Pork", "to taste"),
                ("Garlic", "to taste"),
                ("Thyme", "to taste"),
                ("Salt", "to taste"),
                ("Paprika sauce", "to taste"),
                ("Roast seasoning", "to taste"),
                ("Sugar", "to taste"),
                ("Grilled peppers", "to taste"),
                ("Potatoes", "to taste"),
            ],
            &[
                "Heat 2 tbsp of oil in a large deep pan over high heat.",
                "Add the drained pork and the garlic.",
                "Strip the thyme leaves into the pan.",
                "Season with 1/4 tsp of salt.",
                "Stir everything together for 3 minutes.",
                "Add the paprika sauce and stir for 30 seconds more.",
                "Add the roast seasoning, 1/2 tsp of sugar and 3 tbsp of water.",
                "Stir for another 30 seconds.",
                "Add the drained peppers and the cooked potatoes and mix.",
                "Cover, lower the heat and leave for 1 minute.",
                "Take off the heat and serve.",
            ],
            30,
            80,
        ),
        seed(
            SeedCategory::Hogwarts,
            3,
            "Yorkshire puddings",
            &[
                ("Milk 3.2%", "to taste"),
                ("Onion", "to taste"),
                ("Wheat flour", "to taste"),
                ("Eggs", "to taste"),
                ("Fresh thyme", "to taste"),
                ("Marinated turkey", "to taste"),
            ],
            &[
                "Heat the oven to 220-250°C, top and bottom heat.",
                "Put 1-2 tbsp of oil into each mould on a tray.",
                "Heat the tray in the oven for 15 minutes.",
                "Whisk 2 eggs with salt, sugar and milk, then work in the flour until smooth.",
                "Cut the onion into eighths, lay the turkey on top and add a sprig of thyme.",
                "Take the hot tray out of the oven.",
                "Divide the batter between the sizzling moulds.",
                "Put the turkey dish on the tray next to the moulds.",
                "Lower the oven to 200°C and bake for 25 minutes.",
                "Slice the turkey and serve with the puddings.",
            ],
            60,
            60,
        ),
        // Popular
        seed(
            SeedCategory::Popular,
            1,
            "Scottish shepherd's pie",
            &[
                ("Mashed potatoes", "to taste"),
                ("Bolognese ragout", "to taste"),
                ("Mozzarella", "to taste"),
                ("Herb butter", "to taste"),
                ("Spinach", "to taste"),
            ],
            &[
                "Heat the oven to 180°C.",
                "Mix the mashed potatoes with the herb butter and drained spinach.",
                "Spread the ragout over the bottom of a baking dish.",
                "Cover with the potato mixture and level it with a spoon.",
                "Sprinkle with grated mozzarella.",
                "Bake for 20 minutes.",
                "Serve hot.",
            ],
            40,
            90,
        ),
        seed(
            SeedCategory::Popular,
            2,
            "Ratatouille",
            &[
                ("Bell pepper", "2 pcs"),
                ("Tomatoes", "6 pcs"),
                ("Onion", "1 pc"),
                ("Garlic", "3 cloves"),
                ("Thyme", "to taste"),
                ("Bay leaf", "to taste"),
                ("Basil", "to taste"),
                ("Salt", "to taste"),
                ("Pepper", "to taste"),
                ("Olive oil", "4 tbsp"),
                ("Zucchini", "1 pc"),
                ("Marrow", "1 pc"),
                ("Eggplant", "1 pc"),
            ],
            &[
                "Spread the piperade in a baking dish and layer the sliced vegetables on top.",
                "Brush with olive oil mixed with spices, garlic and herbs.",
                "Cover and bake at 160-170°C for about 1.5 hours, then uncover for 30 minutes more.",
            ],
            40,
            70,
        ),
        // Genshin
        seed(
            SeedCategory::Genshin,
            1,
            "Adeptus' Temptation",
            &[
                ("Shrimp", "300 g"),
                ("Scallops", "200 g"),
                ("Lotus", "2 pcs"),
                ("Rice wine", "50 ml"),
                ("Ginger", "30 g"),
                ("Spring onion", "2 stalks"),
            ],
            &[
                "Clean and rinse the seafood.",
                "Slice the ginger and spring onion.",
                "Bring water to a boil for steaming.",
                "Lay the seafood on the lotus.",
                "Add ginger, onion and rice wine.",
                "Steam for 8 minutes.",
            ],
            20,
            85,
        )
        .with_photo(Bytes::from_static(ADEPTUS_TEMPTATION_PHOTO)),
        seed(
            SeedCategory::Genshin,
            2,
            "Golden shrimp balls",
            &[
                ("Shrimp", "400 g"),
                ("Potatoes", "2 pcs"),
                ("Cream", "200 ml"),
                ("Cheese", "100 g"),
                ("Garlic", "3 cloves"),
            ],
            &[
                "Peel the shrimp and potatoes.",
                "Slice the potatoes thinly.",
                "Mince the garlic.",
                "Layer potatoes and shrimp in a dish.",
                "Pour over the cream and sprinkle with cheese.",
                "Bake at 180°C for 25 minutes.",
            ],
            35,
            75,
        ),
        // Ghibli
        seed(
            SeedCategory::Ghibli,
            1,
            "Chihiro's parents' sushi",
            &[
                ("Sushi rice", "2 cups"),
                ("Nori", "4 sheets"),
                ("Salmon", "200 g"),
                ("Avocado", "1 pc"),
                ("Cucumber", "1 pc"),
                ("Rice vinegar", "3 tbsp"),
            ],
            &[
                "Cook the sushi rice.",
                "Slice the salmon, avocado and cucumber.",
                "Lay a nori sheet on a bamboo mat.",
                "Spread rice over the nori.",
                "Add the filling and roll up.",
                "Cut into pieces.",
            ],
            45,
            95,
        ),
        seed(
            SeedCategory::Ghibli,
            2,
            "Ponyo's ramen",
            &[
                ("Ramen noodles", "200 g"),
                ("Ham", "100 g"),
                ("Egg", "2 pcs"),
                ("Spring onion", "2 stalks"),
                ("Broth", "1 l"),
            ],
            &[
                "Bring the broth to a boil.",
                "Cook the noodles until tender.",
                "Slice the ham and spring onion.",
                "Soft-boil the eggs.",
                "Assemble: noodles, broth, ham, egg.",
                "Garnish with spring onion.",
            ],
            30,
            88,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebook_shared::codec::{from_document, to_document};
    use recipebook_shared::constants::FIELD_IMAGE_BASE64;
    use recipebook_shared::photo::{JpegPhotoEncoder, PhotoEncoder};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_shape() {
        let catalog = seed_catalog(Utc::now());
        assert_eq!(catalog.len(), 9);

        for recipe in &catalog {
            assert!(!recipe.is_user_authored);
            assert!(recipe.remote_id.is_none());
            assert!(recipe.validate_shape().is_ok());

            let category = recipe
                .category
                .as_deref()
                .and_then(SeedCategory::from_label)
                .expect("every seed recipe has a known category");
            let seed_id = recipe.seed_id.as_deref().unwrap();
            assert!(seed_id.starts_with(&format!("{}_", category.prefix())));
        }
    }

    #[test]
    fn test_identities_are_unique() {
        let catalog = seed_catalog(Utc::now());
        let local_ids: HashSet<_> = catalog.iter().map(|r| r.local_id).collect();
        let seed_ids: HashSet<_> = catalog.iter().map(|r| r.seed_id.clone()).collect();
        assert_eq!(local_ids.len(), catalog.len());
        assert_eq!(seed_ids.len(), catalog.len());
    }

    #[test]
    fn test_every_category_is_populated() {
        let catalog = seed_catalog(Utc::now());
        for category in SeedCategory::DISPLAY_ORDER {
            assert!(catalog
                .iter()
                .any(|r| r.category.as_deref() == Some(category.label())));
        }
    }

    #[test]
    fn test_only_adeptus_temptation_has_photo() {
        let catalog = seed_catalog(Utc::now());
        let with_photo: Vec<_> = catalog.iter().filter(|r| r.photo.is_some()).collect();
        assert_eq!(with_photo.len(), 1);
        assert_eq!(with_photo[0].seed_id.as_deref(), Some("genshin_1"));

        let photo = with_photo[0].photo.as_ref().unwrap();
        assert!(photo.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_seed_photo_survives_encoding_and_compression() {
        let recipe = seed_catalog(Utc::now())
            .into_iter()
            .find(|r| r.photo.is_some())
            .unwrap();

        let document = to_document(&recipe).unwrap();
        assert!(document.contains_key(FIELD_IMAGE_BASE64));
        let decoded = from_document("seed", &document).unwrap().recipe;
        assert_eq!(decoded.photo, recipe.photo);

        let jpeg = JpegPhotoEncoder::default()
            .encode(recipe.photo.as_deref().unwrap())
            .expect("bundled photo is a readable image");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_hogwarts_views() {
        let catalog = seed_catalog(Utc::now());
        let views = |id: &str| {
            catalog
                .iter()
                .find(|r| r.seed_id.as_deref() == Some(id))
                .map(|r| r.view_count)
        };
        assert_eq!(views("hogwarts_1"), Some(100));
        assert_eq!(views("hogwarts_2"), Some(80));
    }
}
