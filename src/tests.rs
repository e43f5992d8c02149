//! Integration tests for the Navigator client.
//!
//! Each fixture spins up an in-process mock of the Navigator REST API on a
//! random port and drives the real client against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use serde_json::json;
use tempfile::TempDir;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{
    AuthResponse, AuthTokens, Campaign, CampaignStatus, ChangeFreq, Credentials, MetaTag,
    SchemaMarkup, SitemapEntry, UserProfile,
};
use crate::store::{
    Dispatch, FilterDescriptor, NumberRange, RequestStatus, SortDescriptor, SortDirection,
};
use crate::NavigatorClient;

static TRACING: Lazy<()> = Lazy::new(|| crate::init_tracing("warn"));

const ACCESS_TOKEN: &str = "access-token-1";
const REFRESH_TOKEN: &str = "refresh-token-1";
const SITEMAP_XML: &[u8] = b"<?xml version=\"1.0\"?><urlset></urlset>";

/// Shared state behind the mock API.
#[derive(Clone)]
struct MockApi {
    campaigns: Arc<Mutex<Vec<Campaign>>>,
    meta_tags: Arc<Mutex<Vec<MetaTag>>>,
    sitemap: Arc<Mutex<Vec<SitemapEntry>>>,
    sitemap_posts: Arc<AtomicUsize>,
    require_auth: bool,
}

impl MockApi {
    fn new(require_auth: bool) -> Self {
        Self {
            campaigns: Arc::new(Mutex::new(Vec::new())),
            meta_tags: Arc::new(Mutex::new(Vec::new())),
            sitemap: Arc::new(Mutex::new(Vec::new())),
            sitemap_posts: Arc::new(AtomicUsize::new(0)),
            require_auth,
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "authentication required"})),
    )
        .into_response()
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ACCESS_TOKEN))
        .unwrap_or(false)
}

async fn login(Json(credentials): Json<Credentials>) -> Response {
    if credentials.password != "secret" {
        return unauthorized();
    }
    Json(AuthResponse {
        tokens: AuthTokens {
            access_token: ACCESS_TOKEN.to_string(),
            refresh_token: REFRESH_TOKEN.to_string(),
            expires_in: Some(3600),
        },
        user: UserProfile {
            id: "user-1".to_string(),
            email: credentials.email,
            name: Some("Test User".to_string()),
        },
    })
    .into_response()
}

async fn refresh_token(Json(body): Json<serde_json::Value>) -> Response {
    if body["refreshToken"] == REFRESH_TOKEN {
        Json(AuthTokens {
            access_token: "access-token-2".to_string(),
            refresh_token: "refresh-token-2".to_string(),
            expires_in: Some(3600),
        })
        .into_response()
    } else {
        unauthorized()
    }
}

async fn logout() -> Json<serde_json::Value> {
    Json(json!({"message": "logged out"}))
}

async fn list_campaigns(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    if api.require_auth && !bearer_ok(&headers) {
        return unauthorized();
    }
    Json(api.campaigns.lock().unwrap().clone()).into_response()
}

async fn create_campaign(
    State(api): State<MockApi>,
    Json(mut campaign): Json<Campaign>,
) -> Response {
    campaign.id = uuid::Uuid::new_v4().to_string();
    campaign.updated_at = Some(chrono::Utc::now().to_rfc3339());
    api.campaigns.lock().unwrap().push(campaign.clone());
    Json(campaign).into_response()
}

async fn update_campaign(
    State(api): State<MockApi>,
    Path(id): Path<String>,
    Json(mut campaign): Json<Campaign>,
) -> Response {
    let mut campaigns = api.campaigns.lock().unwrap();
    match campaigns.iter_mut().find(|c| c.id == id) {
        Some(existing) => {
            campaign.id = id;
            campaign.updated_at = Some(chrono::Utc::now().to_rfc3339());
            *existing = campaign.clone();
            Json(campaign).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Campaign {} not found", id)})),
        )
            .into_response(),
    }
}

async fn delete_campaign(State(api): State<MockApi>, Path(id): Path<String>) -> Response {
    let mut campaigns = api.campaigns.lock().unwrap();
    let before = campaigns.len();
    campaigns.retain(|c| c.id != id);
    if campaigns.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Campaign {} not found", id)})),
        )
            .into_response();
    }
    StatusCode::OK.into_response()
}

async fn list_meta_tags(State(api): State<MockApi>) -> Json<Vec<MetaTag>> {
    Json(api.meta_tags.lock().unwrap().clone())
}

async fn upsert_meta_tag(State(api): State<MockApi>, Json(mut tag): Json<MetaTag>) -> Json<MetaTag> {
    tag.updated_at = Some(chrono::Utc::now().to_rfc3339());
    let mut tags = api.meta_tags.lock().unwrap();
    match tags.iter_mut().find(|t| t.url == tag.url) {
        Some(existing) => *existing = tag.clone(),
        None => tags.push(tag.clone()),
    }
    Json(tag)
}

async fn delete_meta_tag(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    if let Some(path) = params.get("path") {
        api.meta_tags.lock().unwrap().retain(|t| t.url != *path);
    }
    StatusCode::OK
}

async fn list_sitemap(State(api): State<MockApi>) -> Json<Vec<SitemapEntry>> {
    Json(api.sitemap.lock().unwrap().clone())
}

async fn upsert_sitemap(
    State(api): State<MockApi>,
    Json(entry): Json<SitemapEntry>,
) -> Json<SitemapEntry> {
    api.sitemap_posts.fetch_add(1, Ordering::SeqCst);
    let mut entries = api.sitemap.lock().unwrap();
    match entries.iter_mut().find(|e| e.url == entry.url) {
        Some(existing) => *existing = entry.clone(),
        None => entries.push(entry.clone()),
    }
    Json(entry)
}

async fn generate_sitemap() -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], SITEMAP_XML).into_response()
}

async fn robots_txt() -> &'static str {
    "User-agent: *\nAllow: /\n"
}

async fn validate_schema(Json(markup): Json<SchemaMarkup>) -> Json<serde_json::Value> {
    if markup.data.get("@context").is_some() {
        Json(json!({"valid": true, "errors": []}))
    } else {
        Json(json!({"valid": false, "errors": ["missing @context"]}))
    }
}

async fn list_snapshots() -> Json<serde_json::Value> {
    Json(json!([
        {
            "id": "snap-1",
            "capturedAt": "2025-06-01T00:00:00Z",
            "visitors": 1200,
            "pageViews": 4800,
            "bounceRate": 0.42,
            "conversions": 37,
            "keywords": [{"keyword": "online marketing", "position": 4, "volume": 9900}]
        },
        {
            "id": "snap-2",
            "capturedAt": "2025-06-02T00:00:00Z",
            "visitors": 1350,
            "pageViews": 5100,
            "bounceRate": 0.40,
            "conversions": 45,
            "keywords": []
        }
    ]))
}

fn mock_router(api: MockApi) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh_token))
        .route("/api/auth/logout", post(logout))
        .route("/api/campaigns", get(list_campaigns))
        .route("/api/campaigns", post(create_campaign))
        .route("/api/campaigns/{id}", put(update_campaign))
        .route("/api/campaigns/{id}", delete(delete_campaign))
        .route("/api/seo/meta-tags", get(list_meta_tags))
        .route("/api/seo/meta-tags", post(upsert_meta_tag))
        .route("/api/seo/meta-tags", delete(delete_meta_tag))
        .route("/api/seo/sitemap", get(list_sitemap))
        .route("/api/seo/sitemap", post(upsert_sitemap))
        .route("/api/seo/generate-sitemap", post(generate_sitemap))
        .route("/api/seo/robots.txt", get(robots_txt))
        .route("/api/seo/validate-schema", post(validate_schema))
        .route("/api/analytics/snapshots", get(list_snapshots))
        .with_state(api)
}

/// Test fixture for integration tests.
struct TestFixture {
    client: NavigatorClient,
    api: MockApi,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_auth(false).await
    }

    async fn with_auth(require_auth: bool) -> Self {
        Lazy::force(&TRACING);

        let api = MockApi::new(require_auth);
        let app = mock_router(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            base_url: format!("http://{}/api", addr),
            request_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(50),
            token_path: Some(temp_dir.path().join("tokens.json")),
            log_level: "warn".to_string(),
        };

        let client = NavigatorClient::new(config).expect("Failed to build client");

        TestFixture {
            client,
            api,
            _temp_dir: temp_dir,
        }
    }

    async fn login(&self) {
        self.client
            .auth
            .login(&Credentials {
                email: "test@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .expect("login failed");
    }

    fn campaign(name: &str, platform: &str, budget: f64) -> Campaign {
        Campaign {
            id: String::new(),
            name: name.to_string(),
            platform: platform.to_string(),
            status: CampaignStatus::Active,
            budget,
            spend: None,
            start_date: None,
            end_date: None,
            updated_at: None,
        }
    }
}

#[tokio::test]
async fn test_campaign_crud_round_trip() {
    let fixture = TestFixture::new().await;
    let store = &fixture.client.campaigns;

    assert_eq!(store.status(), RequestStatus::Idle);

    store.fetch_all().await;
    assert_eq!(store.status(), RequestStatus::Succeeded);
    assert!(store.is_empty());

    // Create: server assigns the ID, the store caches the confirmed record.
    store
        .upsert(TestFixture::campaign("Spring Sale", "google", 2500.0))
        .await;
    assert_eq!(store.status(), RequestStatus::Succeeded);
    assert_eq!(store.len(), 1);
    let created = store.records().remove(0);
    assert!(!created.id.is_empty());
    assert!(created.updated_at.is_some());

    // Update through the same upsert path.
    let mut updated = created.clone();
    updated.budget = 3000.0;
    store.upsert(updated).await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&created.id).unwrap().budget, 3000.0);

    // Refetch reflects the server state.
    store.fetch_all().await;
    assert_eq!(store.len(), 1);

    store.remove(&created.id).await;
    assert_eq!(store.status(), RequestStatus::Succeeded);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_client_side_validation_rejected_before_send() {
    let fixture = TestFixture::new().await;

    let entry = SitemapEntry {
        url: "/blog".to_string(),
        priority: 1.5,
        changefreq: ChangeFreq::Daily,
        lastmod: None,
    };
    fixture.client.sitemap.upsert(entry).await;

    assert_eq!(fixture.client.sitemap.status(), RequestStatus::Failed);
    assert!(fixture
        .client
        .sitemap
        .error()
        .unwrap()
        .contains("Priority must be between"));
    // The request never reached the server.
    assert_eq!(fixture.api.sitemap_posts.load(Ordering::SeqCst), 0);

    let valid = SitemapEntry {
        url: "/blog".to_string(),
        priority: 0.9,
        changefreq: ChangeFreq::Daily,
        lastmod: None,
    };
    fixture.client.sitemap.upsert(valid).await;
    assert_eq!(fixture.client.sitemap.status(), RequestStatus::Succeeded);
    assert_eq!(fixture.api.sitemap_posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_meta_tag_upsert_keyed_by_url() {
    let fixture = TestFixture::new().await;
    let store = &fixture.client.meta_tags;

    let tag = |description: &str| MetaTag {
        url: "/about".to_string(),
        title: "About Us".to_string(),
        description: Some(description.to_string()),
        keywords: vec!["about".to_string()],
        updated_at: None,
    };

    store.upsert(tag("first description")).await;
    store.upsert(tag("second description")).await;

    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get("/about").unwrap().description.as_deref(),
        Some("second description")
    );

    // Server agrees after a refetch.
    store.fetch_all().await;
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get("/about").unwrap().description.as_deref(),
        Some("second description")
    );
}

#[tokio::test]
async fn test_login_injects_bearer_and_persists_tokens() {
    let fixture = TestFixture::with_auth(true).await;
    let token_path = fixture.client.config.token_path.clone().unwrap();

    // Unauthenticated fetch is rejected and surfaces as store error state.
    fixture.client.campaigns.fetch_all().await;
    assert_eq!(fixture.client.campaigns.status(), RequestStatus::Failed);

    fixture.login().await;
    assert!(fixture.client.session.is_authenticated());
    assert!(token_path.exists());
    assert_eq!(
        fixture.client.session.user().unwrap().email,
        "test@example.com"
    );

    // Same fetch now carries the bearer header and succeeds.
    fixture.client.campaigns.fetch_all().await;
    assert_eq!(fixture.client.campaigns.status(), RequestStatus::Succeeded);

    fixture.client.auth.logout().await.unwrap();
    assert!(!fixture.client.session.is_authenticated());
    assert!(!token_path.exists());
}

#[tokio::test]
async fn test_unauthorized_response_tears_down_session() {
    let fixture = TestFixture::with_auth(true).await;
    fixture.login().await;
    let token_path = fixture.client.config.token_path.clone().unwrap();
    let unauthorized_rx = fixture.client.session.subscribe();

    // Corrupt the session's access token so the next call gets a 401.
    fixture
        .client
        .session
        .store(
            AuthTokens {
                access_token: "stale-token".to_string(),
                refresh_token: REFRESH_TOKEN.to_string(),
                expires_in: None,
            },
            None,
        )
        .unwrap();

    fixture.client.campaigns.fetch_all().await;

    assert_eq!(fixture.client.campaigns.status(), RequestStatus::Failed);
    assert!(!fixture.client.session.is_authenticated());
    assert!(*unauthorized_rx.borrow(), "de-auth signal not raised");
    assert!(!token_path.exists(), "persisted tokens not cleared");
}

#[tokio::test]
async fn test_explicit_refresh_rotates_tokens() {
    let fixture = TestFixture::new().await;
    fixture.login().await;

    fixture.client.auth.refresh().await.unwrap();
    assert_eq!(
        fixture.client.session.access_token().as_deref(),
        Some("access-token-2")
    );
}

#[tokio::test]
async fn test_failed_refresh_destroys_session() {
    let fixture = TestFixture::new().await;
    fixture.login().await;
    let unauthorized_rx = fixture.client.session.subscribe();

    // Swap in a refresh token the server will not accept.
    fixture
        .client
        .session
        .store(
            AuthTokens {
                access_token: ACCESS_TOKEN.to_string(),
                refresh_token: "bogus".to_string(),
                expires_in: None,
            },
            None,
        )
        .unwrap();

    let result = fixture.client.auth.refresh().await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    assert!(!fixture.client.session.is_authenticated());
    assert!(*unauthorized_rx.borrow());
}

#[tokio::test]
async fn test_sitemap_generate_writes_file() {
    let fixture = TestFixture::new().await;
    let dir = TempDir::new().unwrap();

    let written = fixture
        .client
        .sitemap
        .service()
        .generate(dir.path())
        .await
        .unwrap();

    assert_eq!(written, dir.path().join("sitemap.xml"));
    assert_eq!(tokio::fs::read(&written).await.unwrap(), SITEMAP_XML);
}

#[tokio::test]
async fn test_robots_txt_fetch() {
    let fixture = TestFixture::new().await;
    let robots = fixture.client.sitemap.service().robots_txt().await.unwrap();
    assert!(robots.starts_with("User-agent: *"));
}

#[tokio::test]
async fn test_schema_validation_round_trip() {
    let fixture = TestFixture::new().await;
    let service = fixture.client.schema.service();

    let markup = |data: serde_json::Value| SchemaMarkup {
        id: "schema-1".to_string(),
        page_url: "/".to_string(),
        schema_type: "Organization".to_string(),
        data,
        updated_at: None,
    };

    let verdict = service
        .validate(&markup(json!({"@context": "https://schema.org"})))
        .await
        .unwrap();
    assert!(verdict.valid);

    let verdict = service.validate(&markup(json!({}))).await.unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.errors, vec!["missing @context"]);
}

#[tokio::test]
async fn test_analytics_snapshots_are_read_only() {
    let fixture = TestFixture::new().await;
    let store = &fixture.client.analytics;

    store.fetch_all().await;
    assert_eq!(store.len(), 2);
    let snap = store.get("snap-1").unwrap();
    assert_eq!(snap.visitors, 1200);
    assert_eq!(snap.keywords[0].keyword, "online marketing");

    // Writes are rejected before any request is issued.
    let snapshot = store.get("snap-1").unwrap();
    store.upsert(snapshot).await;
    assert_eq!(store.status(), RequestStatus::Failed);
    assert!(store.error().unwrap().contains("read-only"));
    // The cached collection is untouched.
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_select_filtered_over_fetched_campaigns() {
    let fixture = TestFixture::new().await;
    let store = &fixture.client.campaigns;

    for (name, platform, budget) in [
        ("A", "google", 1999.0),
        ("B", "google", 5000.0),
        ("C", "facebook", 3000.0),
        ("D", "google", 2000.0),
    ] {
        store.upsert(TestFixture::campaign(name, platform, budget)).await;
    }

    let filter = FilterDescriptor {
        platform: Some("google".to_string()),
        budget_range: Some(NumberRange {
            min: 2000.0,
            max: 5000.0,
        }),
        ..Default::default()
    };
    let sort = SortDescriptor {
        field: "budget".to_string(),
        direction: SortDirection::Ascending,
    };

    let view = store.select_filtered(&filter, Some(&sort));
    let names: Vec<&str> = view.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["D", "B"]);
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let fixture = TestFixture::new().await;

    // Updating a campaign the server does not know is a 404 with a message.
    let mut ghost = TestFixture::campaign("Ghost", "google", 100.0);
    ghost.id = "missing-id".to_string();
    fixture.client.campaigns.upsert(ghost).await;

    assert_eq!(fixture.client.campaigns.status(), RequestStatus::Failed);
    assert_eq!(
        fixture.client.campaigns.error().as_deref(),
        Some("Campaign missing-id not found")
    );
}

// Retry tests run against raw listeners so the first connection can be
// dropped before any HTTP exchange happens.

#[tokio::test]
async fn test_network_failure_retries_exactly_once_then_succeeds() {
    Lazy::force(&TRACING);

    let api = MockApi::new(false);
    let app = mock_router(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Drop the first connection unanswered, then serve normally.
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        base_url: format!("http://{}/api", addr),
        request_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(50),
        token_path: None,
        log_level: "warn".to_string(),
    };
    let client = NavigatorClient::new(config).unwrap();

    let started = std::time::Instant::now();
    assert_eq!(client.campaigns.fetch_all().await, Dispatch::Completed);
    assert_eq!(client.campaigns.status(), RequestStatus::Succeeded);
    assert!(
        started.elapsed() >= Duration::from_millis(50),
        "retry did not wait for the backoff"
    );
}

#[tokio::test]
async fn test_retry_bound_is_two_attempts() {
    Lazy::force(&TRACING);

    let attempts = Arc::new(AtomicUsize::new(0));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // A server that drops every connection without answering.
    let counter = attempts.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    let config = Config {
        base_url: format!("http://{}/api", addr),
        request_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(20),
        token_path: None,
        log_level: "warn".to_string(),
    };
    let client = NavigatorClient::new(config).unwrap();

    client.campaigns.fetch_all().await;
    assert_eq!(client.campaigns.status(), RequestStatus::Failed);

    // Exactly one retry: two connection attempts in total.
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_coalesced_dispatch_while_in_flight() {
    let fixture = TestFixture::new().await;
    let store = &fixture.client.campaigns;

    let (first, second) = tokio::join!(store.fetch_all(), store.fetch_all());
    let outcomes = [first, second];
    assert!(outcomes.contains(&Dispatch::Completed));
    // The overlapping dispatch coalesces rather than issuing a second request.
    if outcomes.contains(&Dispatch::AlreadyInFlight) {
        assert_eq!(store.status(), RequestStatus::Succeeded);
    }
}
