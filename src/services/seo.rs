//! SEO service modules: meta tags, schema markup, sitemap.

use std::path::{Path, PathBuf};

use super::ResourceService;
use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::models::{MetaTag, SchemaMarkup, SchemaValidation, SitemapEntry};

/// Meta tag operations against `/seo/meta-tags`.
#[derive(Clone)]
pub struct MetaTagService {
    http: HttpClient,
}

impl MetaTagService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// GET /seo/meta-tags?path= - Meta tags for a single page.
    pub async fn get(&self, path: &str) -> Result<MetaTag, ApiError> {
        self.http
            .get_query("/seo/meta-tags", &[("path", path)])
            .await
    }
}

impl ResourceService for MetaTagService {
    type Record = MetaTag;

    fn resource_name(&self) -> &'static str {
        "meta tag"
    }

    /// GET /seo/meta-tags - All configured meta tags.
    async fn list(&self) -> Result<Vec<MetaTag>, ApiError> {
        self.http.get("/seo/meta-tags").await
    }

    /// POST /seo/meta-tags - Create or replace the tags for a page.
    async fn upsert(&self, record: &MetaTag) -> Result<MetaTag, ApiError> {
        if record.url.trim().is_empty() {
            return Err(ApiError::Validation("Page path is required".to_string()));
        }
        if record.title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
        self.http.post("/seo/meta-tags", record).await
    }

    /// DELETE /seo/meta-tags?path=
    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.http
            .delete_query("/seo/meta-tags", &[("path", key)])
            .await
    }
}

/// Schema markup operations against `/seo/schema-markup`.
#[derive(Clone)]
pub struct SchemaMarkupService {
    http: HttpClient,
}

impl SchemaMarkupService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// GET /seo/schema-markup/:id
    pub async fn get(&self, id: &str) -> Result<SchemaMarkup, ApiError> {
        self.http.get(&format!("/seo/schema-markup/{}", id)).await
    }

    /// POST /seo/validate-schema - Server-side validation of a markup block.
    pub async fn validate(&self, markup: &SchemaMarkup) -> Result<SchemaValidation, ApiError> {
        self.http.post("/seo/validate-schema", markup).await
    }
}

impl ResourceService for SchemaMarkupService {
    type Record = SchemaMarkup;

    fn resource_name(&self) -> &'static str {
        "schema markup"
    }

    /// GET /seo/schema-markup
    async fn list(&self) -> Result<Vec<SchemaMarkup>, ApiError> {
        self.http.get("/seo/schema-markup").await
    }

    /// POST /seo/schema-markup
    async fn upsert(&self, record: &SchemaMarkup) -> Result<SchemaMarkup, ApiError> {
        if record.page_url.trim().is_empty() {
            return Err(ApiError::Validation("Page URL is required".to_string()));
        }
        if record.schema_type.trim().is_empty() {
            return Err(ApiError::Validation("Schema type is required".to_string()));
        }
        self.http.post("/seo/schema-markup", record).await
    }

    /// DELETE /seo/schema-markup/:id
    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.http.delete(&format!("/seo/schema-markup/{}", key)).await
    }
}

/// Sitemap configuration and generation against `/seo/sitemap`.
#[derive(Clone)]
pub struct SitemapService {
    http: HttpClient,
}

impl SitemapService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// POST /seo/generate-sitemap - Trigger server-side generation and write
    /// the resulting `sitemap.xml` to `dest`.
    pub async fn generate(&self, dest: &Path) -> Result<PathBuf, ApiError> {
        let xml = self.http.post_bytes("/seo/generate-sitemap").await?;
        let dest = if dest.is_dir() {
            dest.join("sitemap.xml")
        } else {
            dest.to_path_buf()
        };
        tokio::fs::write(&dest, &xml).await?;
        tracing::info!("Wrote sitemap ({} bytes) to {:?}", xml.len(), dest);
        Ok(dest)
    }

    /// GET /seo/robots.txt
    pub async fn robots_txt(&self) -> Result<String, ApiError> {
        self.http.get_text("/seo/robots.txt").await
    }
}

impl ResourceService for SitemapService {
    type Record = SitemapEntry;

    fn resource_name(&self) -> &'static str {
        "sitemap entry"
    }

    /// GET /seo/sitemap
    async fn list(&self) -> Result<Vec<SitemapEntry>, ApiError> {
        self.http.get("/seo/sitemap").await
    }

    /// POST /seo/sitemap
    async fn upsert(&self, record: &SitemapEntry) -> Result<SitemapEntry, ApiError> {
        if record.url.trim().is_empty() {
            return Err(ApiError::Validation("URL is required".to_string()));
        }
        if !(0.0..=1.0).contains(&record.priority) {
            return Err(ApiError::Validation(format!(
                "Priority must be between 0.0 and 1.0, got {}",
                record.priority
            )));
        }
        self.http.post("/seo/sitemap", record).await
    }

    /// DELETE /seo/sitemap?url=
    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.http.delete_query("/seo/sitemap", &[("url", key)]).await
    }
}
