use artemisia_template::dom::{self, Element};

/// Shown when a visitor submits the contact form on a static host with no
/// form endpoint configured.
const DISABLED_FORM_HANDLER: &str =
    "alert('This form is disabled on the static site.'); return false;";

const LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg"];

/// Post-processes rendered pages for a static host.
///
/// - `href="/styles.css"`, `src="/app.js"` and `src="/logo.{png,jpg,jpeg,svg}"`
///   are prefixed with the base path and get a `?v=<version>` query.
/// - The first `<form method="post">` (any case) posts to the form endpoint,
///   or is neutralized when there is none.
///
/// Everything else is left as rendered. Rewriting is idempotent.
#[derive(Debug, Clone)]
pub struct AssetRewriter {
    base_path: String,
    version: String,
    form_endpoint: Option<String>,
}

impl AssetRewriter {
    pub fn new(
        base_path: impl Into<String>,
        version: impl Into<String>,
        form_endpoint: Option<String>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            version: version.into(),
            form_endpoint,
        }
    }

    pub fn rewrite(&self, html: &str) -> String {
        let mut nodes = dom::parse(html);

        dom::walk_elements_mut(&mut nodes, &mut |el: &mut Element| {
            self.rewrite_asset(el, "href");
            self.rewrite_asset(el, "src");
        });

        if let Some(form) = dom::find_element_mut(&mut nodes, &is_post_form) {
            match &self.form_endpoint {
                Some(endpoint) => form.set_attr("action", endpoint.as_str()),
                None => {
                    form.set_attr("action", "#");
                    form.set_attr("onsubmit", DISABLED_FORM_HANDLER);
                }
            }
        }

        dom::serialize(&nodes)
    }

    fn rewrite_asset(&self, el: &mut Element, attr: &str) {
        let Some(value) = el.attr(attr) else {
            return;
        };
        if let Some(file) = self.asset_file(attr, value) {
            let url = format!("{}{file}?v={}", self.base_path, self.version);
            el.set_attr(attr, url);
        }
    }

    /// The root-relative asset file named by an attribute, if it is one we
    /// version.
    fn asset_file(&self, attr: &str, value: &str) -> Option<String> {
        let file = value.strip_prefix('/')?;
        let known = match attr {
            "href" => file == "styles.css",
            "src" => {
                file == "app.js"
                    || file
                        .strip_prefix("logo.")
                        .is_some_and(|ext| LOGO_EXTENSIONS.contains(&ext))
            }
            _ => false,
        };
        known.then(|| file.to_string())
    }
}

fn is_post_form(el: &Element) -> bool {
    el.is("form")
        && el
            .attr("method")
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("post"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter(endpoint: Option<&str>) -> AssetRewriter {
        AssetRewriter::new("/", "42", endpoint.map(String::from))
    }

    #[test]
    fn test_stylesheet_versioned_once() {
        let html = r#"<head><link rel="stylesheet" href="/styles.css"></head>"#;
        let out = rewriter(None).rewrite(html);
        assert_eq!(out.matches(r#"href="/styles.css?v=42""#).count(), 1);
        assert_eq!(out, r#"<head><link rel="stylesheet" href="/styles.css?v=42"></head>"#);
    }

    #[test]
    fn test_script_and_logo() {
        let html = concat!(
            r#"<img src="/logo.svg" alt="Artemisia">"#,
            r#"<img src="/logo.webp">"#,
            r#"<img src="/images/logo.png">"#,
            r#"<script src="/app.js"></script>"#,
        );
        let out = AssetRewriter::new("/artemisia/", "7", None).rewrite(html);
        assert!(out.contains(r#"src="/artemisia/logo.svg?v=7""#));
        assert!(out.contains(r#"src="/logo.webp""#));
        assert!(out.contains(r#"src="/images/logo.png""#));
        assert!(out.contains(r#"<script src="/artemisia/app.js?v=7"></script>"#));
    }

    #[test]
    fn test_form_neutralized_without_endpoint() {
        let html = r#"<form method="POST" action="/contact" class="contact-form"><button>Send</button></form>"#;
        let out = rewriter(None).rewrite(html);
        assert_eq!(
            out,
            concat!(
                r##"<form method="POST" action="#" class="contact-form" "##,
                r#"onsubmit="alert('This form is disabled on the static site.'); return false;">"#,
                "<button>Send</button></form>"
            )
        );
    }

    #[test]
    fn test_form_posts_to_endpoint() {
        let html = r#"<form action="/contact" method="post"></form>"#;
        let out = rewriter(Some("https://forms.example/submit")).rewrite(html);
        assert_eq!(
            out,
            r#"<form action="https://forms.example/submit" method="post"></form>"#
        );
    }

    #[test]
    fn test_only_first_post_form() {
        let html = concat!(
            r#"<form method="get" action="/search"></form>"#,
            r#"<form method="Post" action="/contact"></form>"#,
            r#"<form method="POST" action="/newsletter"></form>"#,
        );
        let out = rewriter(Some("https://forms.example/submit")).rewrite(html);
        assert!(out.contains(r#"action="/search""#));
        assert!(out.contains(r#"<form method="Post" action="https://forms.example/submit">"#));
        assert!(out.contains(r#"action="/newsletter""#));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let html = r#"<!DOCTYPE html>
<html><head><link href="/styles.css" rel="stylesheet"></head>
<body><img src="/logo.png"><form method="POST" action="/contact"></form><script src="/app.js"></script></body></html>"#;
        for endpoint in [None, Some("https://forms.example/submit")] {
            let once = rewriter(endpoint).rewrite(html);
            assert_eq!(rewriter(endpoint).rewrite(&once), once);
        }
    }

    #[test]
    fn test_leaves_other_markup_alone() {
        let html = "<p>Pellets &amp; granules</p><a href=\"/about\">About</a>";
        assert_eq!(rewriter(None).rewrite(html), html);
    }
}
