use crate::config::SiteConfig;
use artemisia_catalog::{list_categories, Category, ProductRecord, ProductTable};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// One page to render: which template, where it goes in the static tree,
/// which route serves it, and the data it is rendered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub template_id: String,
    /// Relative output path, e.g. `products/granules/index.html`.
    pub output_target: String,
    pub route: String,
    pub data: Value,
}

/// Pages that do not depend on product data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPage {
    Home,
    About,
    Products,
    Contact,
    ThankYou,
    NotFound,
}

impl FixedPage {
    /// Every fixed page, in manifest order.
    pub const ALL: [FixedPage; 6] = [
        FixedPage::Home,
        FixedPage::About,
        FixedPage::Products,
        FixedPage::Contact,
        FixedPage::ThankYou,
        FixedPage::NotFound,
    ];

    pub fn template_id(self) -> &'static str {
        match self {
            FixedPage::Home => "pages/index",
            FixedPage::About => "pages/about",
            FixedPage::Products => "pages/products/index",
            FixedPage::Contact => "pages/contact",
            FixedPage::ThankYou => "pages/thank-you",
            FixedPage::NotFound => "pages/404",
        }
    }

    pub fn output_target(self) -> &'static str {
        match self {
            FixedPage::Home => "index.html",
            FixedPage::About => "about/index.html",
            FixedPage::Products => "products/index.html",
            FixedPage::Contact => "contact/index.html",
            FixedPage::ThankYou => "thank-you/index.html",
            FixedPage::NotFound => "404.html",
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            FixedPage::Home => "/",
            FixedPage::About => "/about",
            FixedPage::Products => "/products",
            FixedPage::Contact => "/contact",
            FixedPage::ThankYou => "/thank-you",
            FixedPage::NotFound => "/404",
        }
    }

    pub fn title(self, site: &SiteConfig) -> String {
        match self {
            FixedPage::Home => site.name.clone(),
            FixedPage::About => site.page_title("About Us"),
            FixedPage::Products => site.page_title("Products"),
            FixedPage::Contact => site.page_title("Contact Us"),
            FixedPage::ThankYou => site.page_title("Thank You"),
            FixedPage::NotFound => site.page_title("Page Not Found"),
        }
    }

    /// The fixed page served at `route`. The 404 page has no route of its own.
    pub fn from_route(route: &str) -> Option<FixedPage> {
        let route = match route.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        FixedPage::ALL
            .into_iter()
            .filter(|p| *p != FixedPage::NotFound)
            .find(|p| p.route() == route)
    }

    pub fn page(self, site: &SiteConfig) -> PageSpec {
        let mut data = Map::new();
        match self {
            FixedPage::Products => {
                data.insert("categories".into(), json!(list_categories()));
            }
            FixedPage::Contact => {
                data.insert("sent".into(), Value::Null);
                data.insert("error".into(), Value::Null);
            }
            _ => {}
        }
        page_spec(
            self.template_id().into(),
            self.output_target().into(),
            self.route().into(),
            self.title(site),
            site,
            data,
        )
    }
}

/// The contact page after a submission: `sent` is the outcome and `error`
/// the message shown to the visitor on failure.
pub fn contact_page(site: &SiteConfig, sent: bool, error: Option<&str>) -> PageSpec {
    let mut page = FixedPage::Contact.page(site);
    page.data["sent"] = Value::Bool(sent);
    page.data["error"] = error.map_or(Value::Null, |e| Value::String(e.into()));
    page
}

/// The listing page of one category.
///
/// `products` holds the records as loaded; `table` is the same data aligned
/// to a single column list for rendering.
pub fn category_page(category: Category, products: Vec<ProductRecord>, site: &SiteConfig) -> PageSpec {
    let mut data = Map::new();
    data.insert("category".into(), json!(category.descriptor()));
    data.insert("table".into(), json!(ProductTable::from_records(&products)));
    data.insert("products".into(), json!(products));
    page_spec(
        format!("pages/products/{}", category.key()),
        format!("products/{}/index.html", category.key()),
        category.route(),
        site.page_title(category.title()),
        site,
        data,
    )
}

/// Every page of the site: fixed pages first, then one page per category in
/// registry order. Output targets are unique.
pub fn build_manifest<F>(site: &SiteConfig, products: F) -> Vec<PageSpec>
where
    F: Fn(Category) -> Vec<ProductRecord>,
{
    let mut pages: Vec<PageSpec> = FixedPage::ALL.iter().map(|p| p.page(site)).collect();
    pages.extend(
        Category::ALL
            .into_iter()
            .map(|category| category_page(category, products(category), site)),
    );
    pages
}

fn page_spec(
    template_id: String,
    output_target: String,
    route: String,
    title: String,
    site: &SiteConfig,
    mut data: Map<String, Value>,
) -> PageSpec {
    data.insert("title".into(), Value::String(title));
    data.insert("site".into(), json!({ "name": site.name }));
    data.insert("path".into(), Value::String(route.clone()));
    PageSpec {
        template_id,
        output_target,
        route,
        data: Value::Object(data),
    }
}
