//! Command implementations for the sitemap2posts CLI

mod crawl;
mod sync;

pub use crawl::execute as crawl;
pub use sync::execute as sync;
