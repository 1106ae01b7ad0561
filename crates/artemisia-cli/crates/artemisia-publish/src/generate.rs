use crate::rewrite::AssetRewriter;
use anyhow::{Context, Result};
use artemisia_context::config::normalize_base_path;
use artemisia_context::manifest::build_manifest;
use artemisia_context::project::SiteProject;
use artemisia_context::settings::BuildSettings;
use artemisia_template::RenderError;
use std::fs;
use std::path::Path;

/// What a generation run produced.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Output targets written, relative to `dist/`.
    pub written: Vec<String>,
    /// Template ids skipped because no template exists for them.
    pub skipped: Vec<String>,
}

/// Render every page of the site into `dist/` and mirror it into `docs/`.
///
/// `dist/` and `docs/` are recreated from scratch. `public/` is copied first,
/// so a rendered page wins over a static file with the same path. Missing
/// templates are skipped with a warning; I/O failures abort the run.
pub fn generate_site(project: &SiteProject, settings: &BuildSettings) -> Result<GenerateReport> {
    let dist_dir = project.dist_dir();
    recreate_dir(&dist_dir)?;

    let public_dir = project.public_dir();
    if public_dir.is_dir() {
        copy_dir(&public_dir, &dist_dir).context("Failed to copy public/ into dist/")?;
    }

    let templates = project.templates()?;
    let loader = project.loader();
    let pages = build_manifest(&project.config, |category| loader.load(category));

    let base_path = settings
        .base_path
        .clone()
        .unwrap_or_else(|| normalize_base_path(&project.config.base_path));
    let rewriter = AssetRewriter::new(base_path, &settings.version, settings.form_endpoint.clone());

    let mut report = GenerateReport::default();
    for page in &pages {
        let html = match templates.render(&page.template_id, &page.data) {
            Ok(html) => html,
            Err(RenderError::TemplateNotFound(id)) => {
                log::warn!("Skipped missing view: {id}");
                report.skipped.push(page.template_id.clone());
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to render {}", page.template_id))
            }
        };

        let output_path = dist_dir.join(&page.output_target);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&output_path, rewriter.rewrite(&html))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        log::debug!("{} -> {}", page.template_id, page.output_target);
        report.written.push(page.output_target.clone());
    }

    let docs_dir = project.docs_dir();
    recreate_dir(&docs_dir)?;
    copy_dir(&dist_dir, &docs_dir).context("Failed to copy dist/ into docs/")?;
    fs::write(docs_dir.join(".nojekyll"), "").context("Failed to write docs/.nojekyll")?;

    Ok(report)
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Recursively copy the contents of `src` into `dest`.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to)
                .with_context(|| format!("Failed to copy {}", from.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const CATEGORY_PAGE: &str = r#"
<template>
<!DOCTYPE html>
<html>
<head><title>{{ title }}</title><link rel="stylesheet" href="/styles.css"></head>
<body>
  <h1 class="reveal">{{ category.title }}</h1>
  <table v-if="products.length">
    <tr v-for="row in table.rows" class="product-row"><td v-for="cell in row">{{ cell }}</td></tr>
  </table>
  <p v-else class="empty">No products listed yet.</p>
  <script src="/app.js"></script>
</body>
</html>
</template>
"#;

    const CONTACT_PAGE: &str = r#"
<template>
<html><head></head><body>
  <form method="POST" action="/contact"><button type="submit">Send</button></form>
</body></html>
</template>
"#;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let views = dir.path().join("views/pages/products");
        fs::create_dir_all(&views).unwrap();
        fs::write(views.join("ir-pellets.van"), CATEGORY_PAGE).unwrap();
        fs::write(views.join("granules.van"), CATEGORY_PAGE).unwrap();
        fs::write(dir.path().join("views/pages/contact.van"), CONTACT_PAGE).unwrap();

        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/styles.css"), "body{}").unwrap();

        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Product Name").unwrap();
        sheet.write_string(0, 1, "Strength").unwrap();
        sheet.write_string(1, 0, "Omeprazole IR Pellets").unwrap();
        sheet.write_string(1, 1, "20mg").unwrap();
        sheet.write_string(2, 0, "Esomeprazole IR Pellets").unwrap();
        sheet.write_string(2, 1, "40mg").unwrap();
        workbook.save(data.join("IR Pellets.xlsx")).unwrap();
        dir
    }

    fn settings(endpoint: Option<&str>) -> BuildSettings {
        BuildSettings {
            form_endpoint: endpoint.map(String::from),
            version: "42".into(),
            base_path: None,
        }
    }

    fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in fs::read_dir(&current).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(dir).unwrap().to_string_lossy().to_string();
                    files.insert(rel, fs::read(&path).unwrap());
                }
            }
        }
        files
    }

    #[test]
    fn test_present_and_absent_categories() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();
        let report = generate_site(&project, &settings(None)).unwrap();

        let dist = project.dist_dir();
        let ir = fs::read_to_string(dist.join("products/ir-pellets/index.html")).unwrap();
        assert_eq!(ir.matches("class=\"product-row\"").count(), 2);
        assert!(ir.contains("<td>Omeprazole IR Pellets</td><td>20mg</td>"));
        assert!(ir.contains(r#"href="/styles.css?v=42""#));
        assert!(ir.contains(r#"src="/app.js?v=42""#));

        let granules = fs::read_to_string(dist.join("products/granules/index.html")).unwrap();
        assert_eq!(granules.matches("class=\"product-row\"").count(), 0);
        assert!(granules.contains("No products listed yet."));

        assert!(report.written.contains(&"products/ir-pellets/index.html".to_string()));
        assert!(report.written.contains(&"products/granules/index.html".to_string()));
        assert!(report.skipped.contains(&"pages/about".to_string()));
        assert!(!dist.join("about/index.html").exists());
    }

    #[test]
    fn test_public_copied_and_docs_mirrored() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();
        generate_site(&project, &settings(None)).unwrap();

        let dist = project.dist_dir();
        let docs = project.docs_dir();
        assert_eq!(fs::read_to_string(dist.join("styles.css")).unwrap(), "body{}");
        assert_eq!(fs::read_to_string(docs.join(".nojekyll")).unwrap(), "");

        let mut mirrored = read_tree(&docs);
        mirrored.remove(".nojekyll");
        assert_eq!(mirrored, read_tree(&dist));
    }

    #[test]
    fn test_contact_form_rewritten() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();

        generate_site(&project, &settings(None)).unwrap();
        let contact = fs::read_to_string(project.dist_dir().join("contact/index.html")).unwrap();
        assert!(contact.contains(r##"action="#""##));
        assert!(contact.contains("return false;"));

        generate_site(&project, &settings(Some("https://forms.example/submit"))).unwrap();
        let contact = fs::read_to_string(project.dist_dir().join("contact/index.html")).unwrap();
        assert!(contact.contains(r#"action="https://forms.example/submit""#));
        assert!(!contact.contains("onsubmit"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();

        generate_site(&project, &settings(None)).unwrap();
        let first = read_tree(&project.docs_dir());
        generate_site(&project, &settings(None)).unwrap();
        let second = read_tree(&project.docs_dir());
        assert_eq!(first, second);
    }

    #[test]
    fn test_stale_output_removed() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();
        fs::create_dir_all(project.dist_dir()).unwrap();
        fs::write(project.dist_dir().join("stale.html"), "old").unwrap();

        generate_site(&project, &settings(None)).unwrap();
        assert!(!project.dist_dir().join("stale.html").exists());
        assert!(!project.docs_dir().join("stale.html").exists());
    }

    #[test]
    fn test_base_path_override() {
        let dir = site();
        let project = SiteProject::load(dir.path()).unwrap();
        let mut settings = settings(None);
        settings.base_path = Some("/artemisia/".into());

        generate_site(&project, &settings).unwrap();
        let ir = fs::read_to_string(project.dist_dir().join("products/ir-pellets/index.html")).unwrap();
        assert!(ir.contains(r#"href="/artemisia/styles.css?v=42""#));
    }

    #[test]
    fn test_bundled_site_generates_every_page() {
        let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../../site");
        let dir = TempDir::new().unwrap();
        copy_dir(&bundled.join("views"), &dir.path().join("views")).unwrap();
        copy_dir(&bundled.join("public"), &dir.path().join("public")).unwrap();
        fs::copy(bundled.join("site.json"), dir.path().join("site.json")).unwrap();

        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Product Name").unwrap();
        sheet.write_string(1, 0, "Omeprazole IR Pellets").unwrap();
        workbook.save(data.join("IR Pellets.xlsx")).unwrap();

        let project = SiteProject::load(dir.path()).unwrap();
        let report = generate_site(&project, &settings(None)).unwrap();
        assert_eq!(report.written.len(), 12);
        assert!(report.skipped.is_empty());

        let dist = project.dist_dir();
        let read = |rel: &str| fs::read_to_string(dist.join(rel)).unwrap();

        let home = read("index.html");
        assert!(home.contains("<title>Artemisia Pharma</title>"));
        assert!(home.contains(r#"href="/styles.css?v=42""#));
        assert!(home.contains(r#"src="/app.js?v=42""#));
        assert!(home.contains(r#"src="/logo.svg?v=42""#));
        assert!(home.contains(r#"<canvas id="bg-asmr-canvas""#));

        assert!(read("about/index.html").contains(r#"<a href="/about" class="active">About</a>"#));

        let listing = read("products/index.html");
        assert!(listing.contains(r#"href="/products/ec-dr-pellets""#));
        assert_eq!(listing.matches("category-card").count(), 6);

        let ir = read("products/ir-pellets/index.html");
        assert!(ir.contains("<td>Omeprazole IR Pellets</td>"));
        assert!(ir.contains(r#"<a href="/products" class="active">Products</a>"#));
        assert!(!ir.contains(r#"class="empty-state""#));
        assert!(read("products/granules/index.html").contains(r#"class="empty-state""#));

        let contact = read("contact/index.html");
        assert!(contact.contains(r##"action="#""##));
        assert!(!contact.contains("alert-success"));
        assert!(dist.join("404.html").exists());
        assert!(dist.join("logo.svg").exists());
    }
}
