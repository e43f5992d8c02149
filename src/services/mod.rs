//! Resource services.
//!
//! One module per resource type, translating domain operations into HTTP
//! client calls and typed results. Services never swallow errors and never
//! fall back locally; the server is the source of truth for IDs and
//! timestamps.

mod analytics;
mod campaigns;
mod seo;

pub use analytics::*;
pub use campaigns::*;
pub use seo::*;

use crate::errors::ApiError;
use crate::models::Keyed;

/// The uniform CRUD shape every resource service exposes to its store.
///
/// Resources that do not support a write operation (analytics snapshots are
/// server-produced) keep the default implementations, which reject the call
/// before any request is sent.
#[allow(async_fn_in_trait)]
pub trait ResourceService {
    type Record: Keyed + Clone;

    /// Resource name used in logs and error messages.
    fn resource_name(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<Self::Record>, ApiError>;

    async fn upsert(&self, _record: &Self::Record) -> Result<Self::Record, ApiError> {
        Err(ApiError::Validation(format!(
            "{} records are read-only",
            self.resource_name()
        )))
    }

    async fn remove(&self, _key: &str) -> Result<(), ApiError> {
        Err(ApiError::Validation(format!(
            "{} records are read-only",
            self.resource_name()
        )))
    }
}
