//! Navigator API client
//!
//! Typed async client and resource state layer for the Genius Navigator
//! marketing platform. Each resource type (SEO meta tags, schema markup,
//! sitemap entries, ad campaigns, analytics snapshots) gets a service that
//! talks to the REST API and a store that caches the collection and tracks
//! the request lifecycle for the UI.

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{AuthService, AuthSession};
use config::Config;
use errors::ApiError;
use http::HttpClient;
use services::{
    AnalyticsService, CampaignService, MetaTagService, SchemaMarkupService, SitemapService,
};
use store::ResourceStore;

pub type MetaTagStore = ResourceStore<MetaTagService>;
pub type SchemaMarkupStore = ResourceStore<SchemaMarkupService>;
pub type SitemapStore = ResourceStore<SitemapService>;
pub type CampaignStore = ResourceStore<CampaignService>;
pub type AnalyticsStore = ResourceStore<AnalyticsService>;

/// The assembled client: one session, one HTTP client, one store per resource.
///
/// Construct once at app start and share via `Arc`. Subscribing to
/// [`AuthSession::subscribe`] tells the embedding UI when a forced
/// de-authentication (401, failed refresh) requires navigating to login.
pub struct NavigatorClient {
    pub config: Arc<Config>,
    pub session: Arc<AuthSession>,
    pub auth: AuthService,
    pub meta_tags: MetaTagStore,
    pub schema: SchemaMarkupStore,
    pub sitemap: SitemapStore,
    pub campaigns: CampaignStore,
    pub analytics: AnalyticsStore,
}

impl NavigatorClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let session = Arc::new(AuthSession::new(config.token_path.clone()));
        let http = HttpClient::new(&config, session.clone())?;

        tracing::info!("Navigator client targeting {}", config.base_url);

        Ok(Self {
            config: Arc::new(config),
            session,
            auth: AuthService::new(http.clone()),
            meta_tags: ResourceStore::new(MetaTagService::new(http.clone())),
            schema: ResourceStore::new(SchemaMarkupService::new(http.clone())),
            sitemap: ResourceStore::new(SitemapService::new(http.clone())),
            campaigns: ResourceStore::new(CampaignService::new(http.clone())),
            analytics: ResourceStore::new(AnalyticsService::new(http)),
        })
    }

    /// Build a client from environment configuration.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(Config::from_env())
    }
}

/// Initialize logging for binaries embedding the client.
///
/// Respects `RUST_LOG` when set, otherwise uses the given level.
pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests;
