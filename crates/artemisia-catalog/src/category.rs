use serde::Serialize;

/// A product category of the catalog.
///
/// The set is closed: adding a category means adding a variant here, which
/// forces every `match` on it (file names, titles, page templates) to be
/// updated at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    IrPellets,
    SrCrPrPellets,
    EcDrPellets,
    Granules,
    Combinations,
    InertCorePellets,
}

/// Display metadata for a category, as consumed by navigation and listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescriptor {
    pub key: &'static str,
    pub source_file_name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub route: String,
}

impl Category {
    /// Every category, in registry order.
    pub const ALL: [Category; 6] = [
        Category::IrPellets,
        Category::SrCrPrPellets,
        Category::EcDrPellets,
        Category::Granules,
        Category::Combinations,
        Category::InertCorePellets,
    ];

    /// The slug used in routes, output paths and template ids.
    pub fn key(self) -> &'static str {
        match self {
            Category::IrPellets => "ir-pellets",
            Category::SrCrPrPellets => "sr-cr-pr-pellets",
            Category::EcDrPellets => "ec-dr-pellets",
            Category::Granules => "granules",
            Category::Combinations => "combinations",
            Category::InertCorePellets => "inert-core-pellets",
        }
    }

    /// Literal spreadsheet file name under the data directory.
    pub fn source_file_name(self) -> &'static str {
        match self {
            Category::IrPellets => "IR Pellets.xlsx",
            Category::SrCrPrPellets => "SR,CR,PR Pellets.xlsx",
            Category::EcDrPellets => "EC,DR Pellets.xlsx",
            Category::Granules => "Granules.xlsx",
            Category::Combinations => "Combinations.xlsx",
            Category::InertCorePellets => "Inert Core Pellets.xlsx",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::IrPellets => "IR Pellets",
            Category::SrCrPrPellets => "SR/CR/PR Pellets",
            Category::EcDrPellets => "EC/DR Pellets",
            Category::Granules => "Granules",
            Category::Combinations => "Combinations",
            Category::InertCorePellets => "Inert Core Pellets",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::IrPellets => "Immediate Release",
            Category::SrCrPrPellets => "Sustained/Controlled/Prolonged Release",
            Category::EcDrPellets => "Enteric-Coated/Delayed Release",
            Category::Granules => "High-quality pharmaceutical granules",
            Category::Combinations => {
                "Custom multi-layered pellet/granule formulations, blends and therapeutic combinations"
            }
            Category::InertCorePellets => "Neutral starter cores for layering APIs and coatings",
        }
    }

    /// Server route, e.g. `/products/ir-pellets`.
    pub fn route(self) -> String {
        format!("/products/{}", self.key())
    }

    pub fn descriptor(self) -> CategoryDescriptor {
        CategoryDescriptor {
            key: self.key(),
            source_file_name: self.source_file_name(),
            title: self.title(),
            description: self.description(),
            route: self.route(),
        }
    }

    /// Look up a category by its slug. Only canonical slugs match.
    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// All category descriptors in registry order.
pub fn list_categories() -> Vec<CategoryDescriptor> {
    Category::ALL.into_iter().map(Category::descriptor).collect()
}
