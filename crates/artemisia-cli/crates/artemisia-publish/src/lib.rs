//! Static build of the site: render every manifest page, version asset URLs,
//! point the contact form somewhere that works without a server, and mirror
//! the result for GitHub Pages.

mod generate;
mod rewrite;

pub use generate::{copy_dir, generate_site, GenerateReport};
pub use rewrite::AssetRewriter;
