//! Block extraction for `.van` single-file templates.

use regex::Regex;
use std::sync::OnceLock;

/// The blocks of a `.van` file.
#[derive(Debug, Default)]
pub struct VanBlock {
    pub template: Option<String>,
    pub script_setup: Option<String>,
    pub styles: Vec<String>,
}

/// A component import from `<script setup>`, e.g.
/// `import SiteLayout from '../layouts/site.van'`.
#[derive(Debug, Clone, PartialEq)]
pub struct VanImport {
    pub name: String,
    /// Kebab-case tag the component is used as, e.g. `site-layout`.
    pub tag_name: String,
    pub path: String,
}

/// Split a `.van` source into its template, script setup and style blocks.
///
/// The template runs from the first `<template` to the last `</template>`,
/// so nested `<template #slot>` elements stay inside it. Script and style
/// blocks are only looked for outside the template.
pub fn parse_blocks(source: &str) -> VanBlock {
    let (template, outside) = match template_span(source) {
        Some((start, content_start, end, close_end)) => (
            Some(source[content_start..end].trim().to_string()),
            format!("{}{}", &source[..start], &source[close_end..]),
        ),
        None => (None, source.to_string()),
    };

    VanBlock {
        template,
        script_setup: extract_script_setup(&outside),
        styles: extract_styles(&outside),
    }
}

/// Parse `import X from './path.van'` statements.
pub fn parse_imports(script_setup: &str) -> Vec<VanImport> {
    static IMPORT_RE: OnceLock<Regex> = OnceLock::new();
    let re = IMPORT_RE.get_or_init(|| {
        Regex::new(r#"import\s+(\w+)\s+from\s+['"]([^'"]+\.van)['"]"#).expect("valid regex")
    });
    re.captures_iter(script_setup)
        .map(|cap| {
            let name = cap[1].to_string();
            VanImport {
                tag_name: pascal_to_kebab(&name),
                name,
                path: cap[2].to_string(),
            }
        })
        .collect()
}

/// `SiteLayout` → `site-layout`
pub fn pascal_to_kebab(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('-');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// `page-title` → `pageTitle`
pub fn kebab_to_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper = false;
    for ch in s.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            result.extend(ch.to_uppercase());
            upper = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Resolve an import path against the importing file's virtual path.
///
/// `pages/products/index.van` + `../../layouts/site.van` → `layouts/site.van`
pub fn resolve_virtual_path(current_file: &str, import_path: &str) -> String {
    let dir = current_file.rfind('/').map(|pos| &current_file[..pos]).unwrap_or("");
    let combined = if dir.is_empty() {
        import_path.to_string()
    } else {
        format!("{dir}/{import_path}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in combined.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// (tag start, content start, close tag start, close tag end)
fn template_span(source: &str) -> Option<(usize, usize, usize, usize)> {
    let close = "</template>";
    let start = source.find("<template")?;
    let content_start = start + source[start..].find('>')? + 1;
    let end = source.rfind(close)?;
    if end < content_start {
        return None;
    }
    Some((start, content_start, end, end + close.len()))
}

fn extract_script_setup(source: &str) -> Option<String> {
    let start = source.find("<script setup")?;
    let content_start = start + source[start..].find('>')? + 1;
    let end = content_start + source[content_start..].find("</script>")?;
    Some(source[content_start..end].trim().to_string())
}

fn extract_styles(source: &str) -> Vec<String> {
    let mut styles = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("<style") {
        let Some(tag_end) = rest[start..].find('>') else {
            break;
        };
        let content_start = start + tag_end + 1;
        let Some(len) = rest[content_start..].find("</style>") else {
            break;
        };
        let css = rest[content_start..content_start + len].trim();
        if !css.is_empty() {
            styles.push(css.to_string());
        }
        rest = &rest[content_start + len + "</style>".len()..];
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks_basic() {
        let source = r#"
<script setup>
import SiteLayout from '../layouts/site.van'
</script>

<template>
  <site-layout :title="title">
    <template #hero><h1>{{ title }}</h1></template>
    <p>Welcome</p>
  </site-layout>
</template>

<style>
.hero { color: teal; }
</style>
"#;
        let blocks = parse_blocks(source);
        let template = blocks.template.unwrap();
        assert!(template.starts_with("<site-layout"));
        assert!(template.contains("<template #hero>"));
        assert!(template.ends_with("</site-layout>"));
        assert!(blocks.script_setup.unwrap().contains("import SiteLayout"));
        assert_eq!(blocks.styles, vec![".hero { color: teal; }"]);
    }

    #[test]
    fn test_style_inside_template_is_not_a_block() {
        let source = r#"<template><div><style>.x{}</style></div></template>"#;
        let blocks = parse_blocks(source);
        assert!(blocks.styles.is_empty());
        assert!(blocks.template.unwrap().contains("<style>.x{}</style>"));
    }

    #[test]
    fn test_parse_blocks_empty() {
        let blocks = parse_blocks("");
        assert!(blocks.template.is_none());
        assert!(blocks.script_setup.is_none());
        assert!(blocks.styles.is_empty());
    }

    #[test]
    fn test_parse_imports() {
        let script = r#"
import SiteLayout from '../layouts/site.van'
import ProductTable from "../../components/product-table.van"
import { helper } from './helper.js'
"#;
        let imports = parse_imports(script);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].tag_name, "site-layout");
        assert_eq!(imports[1].name, "ProductTable");
        assert_eq!(imports[1].path, "../../components/product-table.van");
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(pascal_to_kebab("SiteLayout"), "site-layout");
        assert_eq!(pascal_to_kebab("Nav"), "nav");
        assert_eq!(kebab_to_camel("page-title"), "pageTitle");
        assert_eq!(kebab_to_camel("title"), "title");
    }

    #[test]
    fn test_resolve_virtual_path() {
        assert_eq!(resolve_virtual_path("pages/index.van", "../layouts/site.van"), "layouts/site.van");
        assert_eq!(
            resolve_virtual_path("pages/products/ir-pellets.van", "../../components/product-table.van"),
            "components/product-table.van"
        );
        assert_eq!(resolve_virtual_path("index.van", "./hello.van"), "hello.van");
        assert_eq!(resolve_virtual_path("pages/index.van", "./sub.van"), "pages/sub.van");
    }
}
