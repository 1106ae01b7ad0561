use crate::config::SiteConfig;
use anyhow::{bail, Context, Result};
use artemisia_catalog::ProductLoader;
use artemisia_template::TemplateSet;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A site directory: `views/` (required), `public/`, `data/` and an optional
/// `site.json`.
#[derive(Debug, Clone)]
pub struct SiteProject {
    pub root: PathBuf,
    pub config: SiteConfig,
}

impl SiteProject {
    /// Load a site from the given directory.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.join("views").is_dir() {
            bail!(
                "No views/ directory found in {}. Are you in a site directory?",
                dir.display()
            );
        }

        let config_path = dir.join("site.json");
        let config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path).context("Failed to read site.json")?;
            serde_json::from_str(&raw).context("Failed to parse site.json")?
        } else {
            SiteConfig::default()
        };

        Ok(Self {
            root: dir.to_path_buf(),
            config,
        })
    }

    /// Load a site from the current working directory.
    pub fn load_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Read every `.van` file under `views/`, keyed by relative path
    /// (e.g. `"pages/index.van"`).
    pub fn collect_views(&self) -> Result<HashMap<String, String>> {
        let views_dir = self.views_dir();
        let mut files = HashMap::new();
        collect_van_files(&views_dir, &views_dir, &mut files)?;
        Ok(files)
    }

    /// Fresh template set read from disk.
    pub fn templates(&self) -> Result<TemplateSet> {
        Ok(TemplateSet::from_files(self.collect_views()?))
    }

    pub fn loader(&self) -> ProductLoader {
        ProductLoader::new(self.data_dir())
    }

    pub fn views_dir(&self) -> PathBuf {
        self.root.join("views")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    /// Mirror of `dist/` for GitHub Pages.
    pub fn docs_dir(&self) -> PathBuf {
        self.root.join("docs")
    }
}

fn collect_van_files(dir: &Path, base: &Path, files: &mut HashMap<String, String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_van_files(&path, base, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("van") {
            let rel = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            files.insert(rel, content);
        }
    }
    Ok(())
}
