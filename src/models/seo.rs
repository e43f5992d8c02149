//! SEO resource models: meta tags, schema markup and sitemap entries.

use serde::{Deserialize, Serialize};

use super::Keyed;

/// Meta tags for a single page, keyed by page path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTag {
    /// Page path the tags apply to (e.g. `/pricing`)
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Keyed for MetaTag {
    fn key(&self) -> &str {
        &self.url
    }
}

/// A structured-data block attached to a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMarkup {
    pub id: String,
    pub page_url: String,
    /// schema.org type (e.g. `Organization`, `Product`, `FAQPage`)
    pub schema_type: String,
    /// The JSON-LD payload itself
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Keyed for SchemaMarkup {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Server-side validation verdict for a schema markup block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Crawl-frequency hint for a sitemap entry.
///
/// The sitemap protocol allows exactly these seven values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "always" => Some(ChangeFreq::Always),
            "hourly" => Some(ChangeFreq::Hourly),
            "daily" => Some(ChangeFreq::Daily),
            "weekly" => Some(ChangeFreq::Weekly),
            "monthly" => Some(ChangeFreq::Monthly),
            "yearly" => Some(ChangeFreq::Yearly),
            "never" => Some(ChangeFreq::Never),
            _ => None,
        }
    }
}

/// One URL in the site's sitemap configuration, keyed by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    /// Relative crawl priority, 0.0 to 1.0 inclusive
    pub priority: f64,
    pub changefreq: ChangeFreq,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

impl Keyed for SitemapEntry {
    fn key(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changefreq_round_trip() {
        for s in ["always", "hourly", "daily", "weekly", "monthly", "yearly", "never"] {
            let freq = ChangeFreq::from_str(s).unwrap();
            assert_eq!(freq.as_str(), s);
        }
    }

    #[test]
    fn test_changefreq_rejects_unknown_values() {
        assert!(ChangeFreq::from_str("fortnightly").is_none());
        assert!(ChangeFreq::from_str("WEEKLY").is_none());
        assert!(ChangeFreq::from_str("").is_none());
    }

    #[test]
    fn test_sitemap_entry_serializes_camel_case() {
        let entry = SitemapEntry {
            url: "/blog".to_string(),
            priority: 0.9,
            changefreq: ChangeFreq::Daily,
            lastmod: Some("2025-06-01".to_string()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["changefreq"], "daily");
        assert_eq!(json["lastmod"], "2025-06-01");
    }
}
