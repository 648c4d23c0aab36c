//! API client for the cats catalog backend.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::{AuthApi, AuthError, Session, SessionStore};
use crate::config::Config;
use crate::models::{
    AuthResponse, BreedFilter, BreedQuery, BreedStatistics, CatBreed, CatImage, ImageQuery, LoginRequest,
    RegisterRequest, User, UserProfile,
};

use super::loading::LoadingTracker;
use super::pipeline::{Pipeline, RetryPolicy};
use super::ApiError;

/// Images returned by `images_by_breed` when no limit is given.
pub const DEFAULT_BREED_IMAGE_LIMIT: u32 = 10;

/// Shorter search terms list every breed instead of searching by name.
pub const MIN_SEARCH_TERM_LENGTH: usize = 2;

/// API client for the catalog backend.
/// Clone is cheap - the pipeline shares its connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    pipeline: Pipeline,
}

impl ApiClient {
    /// Create a client from configuration, applying its timeout and retry policy.
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Self::with_client(client, &config.api_url, session, config.retry_policy())
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        session: Arc<SessionStore>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API URL cannot carry paths: {}", base_url);
        }

        Ok(Self {
            base_url,
            pipeline: Pipeline::new(client, session, retry),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.pipeline.session()
    }

    pub fn loading(&self) -> &LoadingTracker {
        self.pipeline.loading()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor; a base URL always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, ApiError> {
        let request = self
            .pipeline
            .client()
            .get(url)
            .query(query)
            .build()
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        self.pipeline.send(request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: Url, body: &B) -> Result<T, ApiError> {
        let request = self
            .pipeline
            .client()
            .post(url)
            .json(body)
            .build()
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        self.pipeline.send(request).await
    }

    // ===== Session =====

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.session().login(self, email, password).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session, AuthError> {
        self.session().register(self, name, email, password).await
    }

    pub async fn fetch_profile(&self) -> Result<UserProfile, AuthError> {
        self.session().fetch_profile(self).await
    }

    // ===== Breeds =====

    pub async fn breeds(&self, query: &BreedQuery) -> Result<Vec<CatBreed>, ApiError> {
        let breeds: Vec<CatBreed> = self.get(self.endpoint(&["breeds"]), &query.to_params()).await?;
        debug!(count = breeds.len(), "Fetched breeds");
        Ok(breeds)
    }

    pub async fn breed(&self, breed_id: &str) -> Result<CatBreed, ApiError> {
        self.get(self.endpoint(&["breeds", breed_id]), &[]).await
    }

    pub async fn search_breeds(&self, term: &str) -> Result<Vec<CatBreed>, ApiError> {
        self.get(self.endpoint(&["breeds", "search", term]), &[]).await
    }

    /// Name search narrowed by `filter`. A term shorter than
    /// `MIN_SEARCH_TERM_LENGTH` filters the full listing instead.
    pub async fn find_breeds(&self, term: &str, filter: &BreedFilter) -> Result<Vec<CatBreed>, ApiError> {
        let term = term.trim();
        let breeds = if term.chars().count() >= MIN_SEARCH_TERM_LENGTH {
            self.search_breeds(term).await?
        } else {
            self.breeds(&BreedQuery::default()).await?
        };
        let matched = filter.apply(breeds);
        debug!(count = matched.len(), "Breeds left after filtering");
        Ok(matched)
    }

    /// Summary figures computed over the full breed listing.
    pub async fn breed_statistics(&self) -> Result<BreedStatistics, ApiError> {
        let breeds = self.breeds(&BreedQuery::default()).await?;
        Ok(BreedStatistics::from_breeds(&breeds))
    }

    // ===== Images =====

    pub async fn images(&self, query: &ImageQuery) -> Result<Vec<CatImage>, ApiError> {
        self.get(self.endpoint(&["images"]), &query.to_params()).await
    }

    pub async fn images_by_breed(&self, breed_id: &str, limit: Option<u32>) -> Result<Vec<CatImage>, ApiError> {
        let query = [
            ("breed_id", breed_id.to_string()),
            ("limit", limit.unwrap_or(DEFAULT_BREED_IMAGE_LIMIT).to_string()),
        ];
        self.get(self.endpoint(&["images", "bybreedid"]), &query).await
    }

    pub async fn image(&self, image_id: &str) -> Result<CatImage, ApiError> {
        self.get(self.endpoint(&["images", image_id]), &[]).await
    }
}

impl AuthApi for ApiClient {
    async fn authenticate(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post(self.endpoint(&["auth", "login"]), request).await
    }

    async fn create_account(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post(self.endpoint(&["auth", "register"]), request).await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get(self.endpoint(&["auth", "profile"]), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{KeyValueStore, MemoryStore, TOKEN_KEY};
    use crate::routing::testing::RecordingNavigator;
    use crate::routing::Route;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(base_url: &str) -> (ApiClient, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(SessionStore::new(MemoryStore::new(), navigator.clone()));
        let client = ApiClient::with_client(Client::new(), base_url, session, RetryPolicy::none())
            .expect("valid client");
        (client, navigator)
    }

    fn auth_body(token: &str) -> serde_json::Value {
        json!({
            "access_token": token,
            "user": {"_id": "u1", "name": "Ann", "email": "a@x.com", "isActive": true}
        })
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let (client, _) = client_for("https://cats.example.com/api");
        assert_eq!(
            client.endpoint(&["breeds", "abys"]).as_str(),
            "https://cats.example.com/api/breeds/abys"
        );

        let (client, _) = client_for("https://cats.example.com/api/");
        assert_eq!(client.endpoint(&["images"]).as_str(), "https://cats.example.com/api/images");

        assert_eq!(
            client.endpoint(&["breeds", "search", "maine coon/x"]).path(),
            "/api/breeds/search/maine%20coon%2Fx"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(SessionStore::new(MemoryStore::new(), navigator));
        assert!(ApiClient::with_client(Client::new(), "not a url", session.clone(), RetryPolicy::none()).is_err());
        assert!(ApiClient::with_client(Client::new(), "mailto:cats@example.com", session, RetryPolicy::none()).is_err());
    }

    #[tokio::test]
    async fn test_login_stores_session_and_authorizes_later_calls() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "a@x.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("t1")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .and(header("authorization", "Bearer t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "u1", "name": "Ann Smith", "email": "a@x.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri());
        let session = client.login("a@x.com", "secret").await.expect("login should succeed");
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(client.session().token().as_deref(), Some("t1"));
        assert_eq!(
            client.session().profile(),
            Some(UserProfile {
                user_id: "u1".to_string(),
                name: "Ann".to_string(),
                email: "a@x.com".to_string(),
            })
        );

        let profile = client.fetch_profile().await.expect("profile should load");
        assert_eq!(profile.name, "Ann Smith");
        assert!(!client.loading().is_loading());
    }

    #[tokio::test]
    async fn test_profile_fetch_accepts_user_id_shape() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("t1")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": "u1", "name": "Ann Smith", "email": "a@x.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, navigator) = client_for(&server.uri());
        client.login("a@x.com", "secret").await.expect("login should succeed");

        let profile = client.fetch_profile().await.expect("profile should load");

        assert_eq!(profile.user_id, "u1");
        assert!(client.session().is_authenticated());
        assert_eq!(client.session().snapshot().profile().map(|p| p.name.as_str()), Some("Ann Smith"));
        assert_eq!(client.session().profile().map(|p| p.name), Some("Ann Smith".to_string()));
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_register_conflict_is_normalized() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "Email taken"})))
            .mount(&server)
            .await;

        let (client, navigator) = client_for(&server.uri());
        let err = client
            .register("Ann", "a@x.com", "secret")
            .await
            .expect_err("register should fail");

        assert!(matches!(err, AuthError::Api(ApiError::Conflict)));
        assert_eq!(err.to_string(), "Conflict. The resource already exists or is in use.");
        assert!(!client.session().is_authenticated());
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_on_profile_fetch() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("t1")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (client, navigator) = client_for(&server.uri());
        client.login("a@x.com", "secret").await.expect("login should succeed");

        let result = client.fetch_profile().await;

        assert!(matches!(result, Err(AuthError::Api(ApiError::Unauthorized))));
        assert!(!client.session().is_authenticated());
        assert_eq!(navigator.history(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_breeds_query_and_statistics() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let breeds = json!([
            {"id": "abys", "name": "Abyssinian", "origin": "Egypt", "hypoallergenic": 0,
             "weight": {"imperial": "7 - 10", "metric": "3 - 5"}},
            {"id": "sibe", "name": "Siberian", "origin": "Russia", "hypoallergenic": 1,
             "weight": {"imperial": "8 - 16", "metric": "4 - 7"}}
        ]);
        Mock::given(method("GET"))
            .and(path("/breeds"))
            .and(query_param("q", "si"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([breeds[1].clone()])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/breeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(breeds))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri());
        let query = BreedQuery {
            q: Some("si".to_string()),
            limit: Some(5),
            ..Default::default()
        };
        let found = client.breeds(&query).await.expect("breeds should load");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Siberian");

        let stats = client.breed_statistics().await.expect("statistics should load");
        assert_eq!(stats.total_breeds, 2);
        assert_eq!(stats.hypoallergenic_breeds, 1);
        assert_eq!(stats.average_weight, 3.5);
        assert_eq!(stats.most_common_origin, "Russia");
    }

    #[tokio::test]
    async fn test_search_and_images_by_breed() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/breeds/search/maine%20coon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "mcoo", "name": "Maine Coon"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/images/bybreedid"))
            .and(query_param("breed_id", "mcoo"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "img1", "url": "https://cdn.example.com/img1.jpg", "width": 800, "height": 600}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/images/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri());
        let breeds = client.search_breeds("maine coon").await.expect("search should succeed");
        assert_eq!(breeds[0].id, "mcoo");

        let images = client.images_by_breed("mcoo", None).await.expect("images should load");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].width, 800);

        assert_eq!(client.image("missing").await, Err(ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_find_breeds_filters_search_results() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/breeds/search/sib"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "sibe", "name": "Siberian", "hypoallergenic": 1, "energy_level": 5},
                {"id": "siam", "name": "Siamese", "hypoallergenic": 0, "energy_level": 5}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri());
        let filter = BreedFilter { hypoallergenic: true, ..Default::default() };
        let breeds = client.find_breeds(" sib ", &filter).await.expect("search should succeed");

        assert_eq!(breeds.len(), 1);
        assert_eq!(breeds[0].id, "sibe");
    }

    #[tokio::test]
    async fn test_find_breeds_short_term_lists_all() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/breeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "abys", "name": "Abyssinian", "affection_level": 5},
                {"id": "bali", "name": "Balinese", "affection_level": 4}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/breeds/search/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri());
        let filter = BreedFilter { affection_level: Some(4), ..Default::default() };
        let breeds = client.find_breeds("a", &filter).await.expect("listing should succeed");

        assert_eq!(breeds.len(), 1);
        assert_eq!(breeds[0].id, "bali");
    }

    #[tokio::test]
    async fn test_catalog_calls_carry_stored_token() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .and(header("authorization", "Bearer stored"))
            .and(query_param("size", "medium"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "stored").expect("set should succeed");
        let navigator = Arc::new(RecordingNavigator::default());
        let session = Arc::new(SessionStore::new(storage, navigator));
        let client = ApiClient::with_client(Client::new(), &server.uri(), session, RetryPolicy::none())
            .expect("valid client");

        let query = ImageQuery {
            size: Some(crate::models::ImageSize::Medium),
            ..Default::default()
        };
        let images = client.images(&query).await.expect("images should load");
        assert!(images.is_empty());
    }
}
