//! Data models for the Navigator marketing platform API.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless
//! interoperability.

mod analytics;
mod auth;
mod campaign;
mod seo;

pub use analytics::*;
pub use auth::*;
pub use campaign::*;
pub use seo::*;

/// A record that carries its own collection key.
///
/// Keys are unique within a collection; which field acts as the key varies per
/// resource (meta tags and sitemap entries by `url`, campaigns and snapshots
/// by `id`).
pub trait Keyed {
    fn key(&self) -> &str;
}
