use serde::{Deserialize, Serialize};

pub const DEFAULT_SITE_NAME: &str = "Artemisia Pharma";

/// Represents the optional `site.json` file at the site root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// URL prefix the static build is served under, e.g. `/` or `/site/`.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_name() -> String {
    DEFAULT_SITE_NAME.into()
}

fn default_base_path() -> String {
    "/".into()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_path: default_base_path(),
        }
    }
}

impl SiteConfig {
    /// Page title for a section: `About Us - Artemisia Pharma`.
    pub fn page_title(&self, heading: &str) -> String {
        format!("{heading} - {}", self.name)
    }
}

/// Normalize a base path so it starts and ends with `/`.
///
/// `""` → `/`, `site` → `/site/`, `/site` → `/site/`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{trimmed}/")
    }
}
