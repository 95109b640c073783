//! URL handling module for Bio-Harvest
//!
//! This module provides the normalization that keys the visited set, plus
//! small helpers for comparing sites and reading page names out of paths.

mod normalize;
mod site;

pub use normalize::normalize_url;
pub use site::{page_slug, same_site, site_of};
