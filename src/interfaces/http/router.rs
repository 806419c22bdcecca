//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::identity::{JwtTokenIssuer, LoginResolver, UserService};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::ErrorResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{auth, health, metrics, request_id, users};

/// Unified state for every API route.
/// Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub users: users::UserHandlerState,
    pub auth: auth::AuthHandlerState,
    pub health: health::HealthState,
    pub metrics: metrics::MetricsState,
    pub jwt: AuthState,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ApiState> for users::UserHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        s.users.clone()
    }
}

impl FromRef<ApiState> for auth::AuthHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        s.health.clone()
    }
}

impl FromRef<ApiState> for metrics::MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        s.metrics.clone()
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.jwt.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from POST /api/token/"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::list_users,
        users::create_user,
        users::get_user,
        users::get_profile,
        users::list_doctors,
        auth::login,
        auth::refresh,
    ),
    components(
        schemas(
            ErrorResponse,
            users::UserDto,
            users::CreateUserRequest,
            auth::LoginBody,
            auth::TokenPairResponse,
            auth::RefreshBody,
            auth::AccessTokenResponse,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Users", description = "Accounts, the caller's profile and the verified doctors directory"),
        (name = "Authentication", description = "Token login by username or email, and token refresh"),
    ),
    info(
        title = "MediCare Accounts API",
        version = "1.0.0",
        description = "User accounts and JWT authentication for MediCare",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    db: DatabaseConnection,
    jwt_config: JwtConfig,
    prometheus_handle: PrometheusHandle,
) -> Router {
    let repo = Arc::new(UserRepository::new(db.clone()));
    let issuer = Arc::new(JwtTokenIssuer::new(repo.clone(), jwt_config.clone()));

    let state = ApiState {
        users: users::UserHandlerState {
            user_service: Arc::new(UserService::new(repo.clone())),
        },
        auth: auth::AuthHandlerState {
            login: Arc::new(LoginResolver::new(repo, issuer)),
        },
        health: health::HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        },
        metrics: metrics::MetricsState {
            handle: prometheus_handle,
        },
        jwt: AuthState { jwt_config },
    };

    // Profile is the only route behind the bearer-token check
    let protected_user_routes = Router::new()
        .route("/users/profile/", get(users::get_profile))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/doctors/", get(users::list_doctors))
        .route("/users/{id}/", get(users::get_user))
        .merge(protected_user_routes)
        .route("/token/", post(auth::login))
        .route("/auth/login/", post(auth::login))
        .route("/token/refresh/", post(auth::refresh));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::request_id_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};
    use tower::Service;

    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig};

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "router-test".into(),
            access_token_minutes: 5,
            refresh_token_days: 1,
            issuer: "medicare-test".into(),
        }
    }

    async fn app() -> Router {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_api_router(db, jwt_config(), handle)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let mut svc = app.clone().into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn signup(app: &Router, username: &str, email: &str, role: &str) -> Value {
        let (status, body) = send(
            app,
            post_json(
                "/api/users/",
                json!({
                    "username": username,
                    "email": email,
                    "password": "secret-pass",
                    "role": role,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn login(app: &Router, username: &str) -> (StatusCode, Value) {
        send(
            app,
            post_json(
                "/api/token/",
                json!({"username": username, "password": "secret-pass"}),
            ),
        )
        .await
    }

    #[tokio::test]
    async fn create_then_list_and_retrieve() {
        let app = app().await;
        let created = signup(&app, "alice", "alice@x.com", "doctor").await;

        assert_eq!(created["role"], "doctor");
        assert_eq!(created["is_verified"], false);
        assert!(created.get("password").is_none());

        let (status, list) = send(&app, get("/api/users/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let id = created["id"].as_str().unwrap();
        let (status, one) = send(&app, get(&format!("/api/users/{id}/"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["username"], "alice");

        let (status, _) = send(&app, get("/api/users/missing/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/users/",
                json!({"username": "alice", "email": "other@x.com", "password": "secret-pass"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["username"].is_array());
    }

    #[tokio::test]
    async fn create_rejects_invalid_payloads() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/users/",
                json!({"username": "bob", "email": "not-an-email", "password": "short"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["email"].is_array());
        assert!(body["fields"]["password"].is_array());

        let (status, body) = send(
            &app,
            post_json(
                "/api/users/",
                json!({"username": "root", "email": "root@x.com", "password": "secret-pass", "role": "admin"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["role"].is_array());
    }

    #[tokio::test]
    async fn create_with_missing_keys_reports_each_field() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post_json("/api/users/", json!({"username": "bob", "password": "secret-pass"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["fields"]["email"].is_array(), "{body}");
        assert!(body["fields"]["email"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m == "This field is required."));
        assert!(body["fields"].get("username").is_none());

        let (status, list) = send(&app, get("/api/users/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn doctors_listing_excludes_unverified_doctors() {
        let app = app().await;
        signup(&app, "bob", "bob@x.com", "doctor").await;
        signup(&app, "carol", "carol@x.com", "patient").await;

        // Open signup never yields a verified doctor
        let (status, doctors) = send(&app, get("/api/users/doctors/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doctors, json!([]));
    }

    #[tokio::test]
    async fn login_by_username_or_email_yields_a_working_token_pair() {
        let app = app().await;
        let alice = signup(&app, "alice", "alice@x.com", "patient").await;

        let (status, by_name) = login(&app, "alice").await;
        assert_eq!(status, StatusCode::OK);
        assert!(by_name["refresh_token"].is_string());

        let (status, by_email) = login(&app, "alice@x.com").await;
        assert_eq!(status, StatusCode::OK);

        let token = by_email["access_token"].as_str().unwrap();
        let (status, profile) = send(&app, get_with_token("/api/users/profile/", token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["id"], alice["id"]);
    }

    #[tokio::test]
    async fn legacy_login_path_behaves_like_token_endpoint() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/login/",
                json!({"username": "alice@x.com", "password": "secret-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_token"].is_string());
    }

    #[tokio::test]
    async fn failed_logins_share_one_message() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;

        let (unknown_status, unknown) = login(&app, "nobody@x.com").await;
        let (wrong_status, wrong) = send(
            &app,
            post_json(
                "/api/token/",
                json!({"username": "alice", "password": "wrong-pass"}),
            ),
        )
        .await;

        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown["error"], wrong["error"]);
        assert_eq!(
            unknown["error"],
            "No active account found with the given credentials"
        );
    }

    #[tokio::test]
    async fn login_without_password_is_a_field_error() {
        let app = app().await;
        let (status, body) = send(&app, post_json("/api/token/", json!({"username": "alice"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["password"].is_array());
    }

    #[tokio::test]
    async fn profile_requires_an_access_token() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;

        let (status, body) = send(&app, get("/api/users/profile/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, get_with_token("/api/users/profile/", "garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, pair) = login(&app, "alice").await;
        let refresh = pair["refresh_token"].as_str().unwrap();
        let (status, _) = send(&app, get_with_token("/api/users/profile/", refresh)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_ignores_ids_supplied_by_the_caller() {
        let app = app().await;
        let alice = signup(&app, "alice", "alice@x.com", "patient").await;
        let bob = signup(&app, "bob", "bob@x.com", "patient").await;

        let (_, pair) = login(&app, "alice").await;
        let token = pair["access_token"].as_str().unwrap();
        let uri = format!("/api/users/profile/?id={}", bob["id"].as_str().unwrap());

        let (status, profile) = send(&app, get_with_token(&uri, token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["id"], alice["id"]);
    }

    #[tokio::test]
    async fn refresh_issues_a_new_access_token() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;
        let (_, pair) = login(&app, "alice").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/token/refresh/",
                json!({"refresh_token": pair["refresh_token"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_token"].is_string());

        let (status, _) = send(
            &app,
            post_json(
                "/api/token/refresh/",
                json!({"refresh_token": pair["access_token"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_twice_without_writes_is_identical() {
        let app = app().await;
        signup(&app, "alice", "alice@x.com", "patient").await;
        signup(&app, "bob", "bob@x.com", "doctor").await;

        let (_, first) = send(&app, get("/api/users/")).await;
        let (_, second) = send(&app, get("/api/users/")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn health_and_openapi_are_served() {
        let app = app().await;

        let (status, health) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");

        let (status, doc) = send(&app, get("/api-doc/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/users/profile/"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = app().await;
        let mut svc = app.into_service();

        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = svc.call(req).await.unwrap();

        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn profile_runs_under_the_callers_request_id() {
        let app = app().await;
        let alice = signup(&app, "alice", "alice@x.com", "patient").await;
        let (_, tokens) = login(&app, "alice").await;
        let token = tokens["access_token"].as_str().unwrap();

        let req = Request::builder()
            .uri("/api/users/profile/")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header("x-request-id", "profile-42")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().into_service().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-request-id"], "profile-42");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let profile: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(profile["id"], alice["id"]);
    }
}
