use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION, CONTENT_TYPE, ORIGIN,
        },
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use staybook_auth::Authenticator;
use staybook_config::AppConfig;
use staybook_database::initialize_database;
use staybook_gateway::{build_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

struct TestContext {
    _temp_dir: TempDir,
    pool: SqlitePool,
    router: Router,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let mut config = AppConfig::default();
        config.database.url = format!(
            "sqlite://{}",
            temp_dir.path().join("gateway.sqlite").display()
        );
        config.database.max_connections = 5;

        let pool = initialize_database(&config.database).await?;
        let authenticator = Authenticator::new(pool.clone(), config.auth.clone());
        let state = AppState::new(pool.clone(), authenticator, config.pagination.clone());
        let router = build_router(state, &config.http);

        Ok(Self {
            _temp_dir: temp_dir,
            pool,
            router,
        })
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, payload))
    }

    /// Register an account with `role` and return a bearer token for it.
    async fn signup(&self, username: &str, role: &str) -> TestResult<String> {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/v1/users",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "correct horse battery",
                    "role": role,
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "registering {username}");
        self.login(username).await
    }

    async fn login(&self, username: &str) -> TestResult<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": "correct horse battery" })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    async fn admin(&self) -> TestResult<String> {
        let token = self.signup("admin", "guest").await?;
        sqlx::query(
            "UPDATE user_profiles SET role = 'admin' WHERE user_id = (SELECT id FROM users WHERE username = 'admin')",
        )
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    /// Create a listing as `host` and approve it as `admin`; returns its id.
    async fn approved_listing(&self, host: &str, admin: &str, city: &str, price: i64) -> TestResult<String> {
        let (status, listing) = self
            .send(
                Method::POST,
                "/api/v1/listings",
                Some(host),
                Some(json!({
                    "name": format!("Stay in {city}"),
                    "city": city,
                    "price_per_night": price,
                    "bedrooms": 2,
                    "max_guests": 4,
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        let id = listing["id"].as_str().unwrap_or_default().to_string();

        let (status, _) = self
            .send(
                Method::PUT,
                &format!("/api/v1/listings/{id}"),
                Some(admin),
                Some(json!({ "status": "approved" })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        Ok(id)
    }
}

#[tokio::test]
async fn health_and_openapi_are_served() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, doc) = ctx
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/bookings/{booking_id}/confirm"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
    for page in ["ProfilePage", "ListingPage", "BookingPage", "ReviewPage"] {
        assert!(doc["components"]["schemas"][page].is_object(), "{page}");
    }
    assert_eq!(
        doc["paths"]["/api/v1/listings"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"]["$ref"],
        "#/components/schemas/ListingPage"
    );
    Ok(())
}

#[tokio::test]
async fn register_login_and_logout() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.signup("amina", "host").await?;

    let (status, me) = ctx
        .send(Method::GET, "/api/v1/users/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "amina");
    assert_eq!(me["role"], "host");
    assert_eq!(me["email_verified"], false);

    let (status, _) = ctx
        .send(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .send(Method::GET, "/api/v1/users/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
    Ok(())
}

#[tokio::test]
async fn registration_rejects_admin_role_and_duplicates() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "correct horse battery",
                "role": "admin",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    ctx.signup("amina", "guest").await?;
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/users",
            None,
            Some(json!({
                "username": "amina",
                "email": "other@example.com",
                "password": "correct horse battery",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    Ok(())
}

#[tokio::test]
async fn failed_registration_leaves_no_account_behind() -> TestResult {
    let ctx = TestContext::new().await?;
    sqlx::query(
        "CREATE TRIGGER reject_profiles BEFORE INSERT ON user_profiles \
         BEGIN SELECT RAISE(ABORT, 'profiles unavailable'); END",
    )
    .execute(&ctx.pool)
    .await?;

    let registration = json!({
        "username": "amina",
        "email": "amina@example.com",
        "password": "correct horse battery",
    });
    let (status, body) = ctx
        .send(Method::POST, "/api/v1/users", None, Some(registration.clone()))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");

    let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'amina'")
        .fetch_one(&ctx.pool)
        .await?;
    assert_eq!(accounts, 0);

    sqlx::query("DROP TRIGGER reject_profiles")
        .execute(&ctx.pool)
        .await?;
    let (status, profile) = ctx
        .send(Method::POST, "/api/v1/users", None, Some(registration))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["role"], "guest");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/api/v1/bookings", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
    assert!(body["message"].is_string());

    let (status, _) = ctx
        .send(Method::GET, "/api/v1/bookings", Some("not-a-token"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn listings_need_moderation_before_they_are_public() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;

    let (status, listing) = ctx
        .send(
            Method::POST,
            "/api/v1/listings",
            Some(&host),
            Some(json!({
                "name": "Beach house",
                "city": "Mombasa",
                "price_per_night": 5000,
                "bedrooms": 3,
                "max_guests": 6,
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(listing["status"], "pending");
    let id = listing["id"].as_str().unwrap_or_default().to_string();

    let (_, catalogue) = ctx.send(Method::GET, "/api/v1/listings", None, None).await?;
    assert_eq!(catalogue["count"], 0);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/v1/listings/{id}"),
            Some(&host),
            Some(json!({ "status": "approved" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = ctx
        .send(
            Method::PUT,
            &format!("/api/v1/listings/{id}"),
            Some(&admin),
            Some(json!({ "status": "approved" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (_, found) = ctx
        .send(Method::GET, "/api/v1/listings/search?city=momb&guests=5", None, None)
        .await?;
    assert_eq!(found["count"], 1);
    assert_eq!(found["results"][0]["id"], id.as_str());

    let (_, too_small) = ctx
        .send(Method::GET, "/api/v1/listings?guests=8", None, None)
        .await?;
    assert_eq!(too_small["count"], 0);
    Ok(())
}

#[tokio::test]
async fn booking_lifecycle_over_http() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;
    let guest = ctx.signup("guest", "guest").await?;
    let other = ctx.signup("other", "guest").await?;
    let listing = ctx.approved_listing(&host, &admin, "Nairobi", 2500).await?;

    let (status, booking) = ctx
        .send(
            Method::POST,
            "/api/v1/bookings",
            Some(&guest),
            Some(json!({
                "listing_id": listing,
                "start_date": "2024-03-01",
                "end_date": "2024-03-04",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_price"], 7500);
    let booking_id = booking["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/bookings",
            Some(&other),
            Some(json!({
                "listing_id": listing,
                "start_date": "2024-03-03",
                "end_date": "2024-03-05",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, availability) = ctx
        .send(
            Method::GET,
            &format!("/api/v1/listings/{listing}/availability?start_date=2024-03-02&end_date=2024-03-03"),
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available"], false);
    assert_eq!(availability["conflicting_bookings"], 1);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/v1/bookings/{booking_id}/confirm"),
            Some(&guest),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = ctx
        .send(
            Method::POST,
            &format!("/api/v1/bookings/{booking_id}/confirm"),
            Some(&host),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/api/v1/bookings/{booking_id}"),
            Some(&other),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, review) = ctx
        .send(
            Method::POST,
            "/api/v1/reviews",
            Some(&guest),
            Some(json!({ "booking_id": booking_id, "rating": 5, "body": "Lovely stay" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = review["id"].as_str().unwrap_or_default().to_string();

    let respond = format!("/api/v1/reviews/{review_id}/respond");
    let (status, responded) = ctx
        .send(
            Method::POST,
            &respond,
            Some(&host),
            Some(json!({ "host_response": "Thanks for visiting" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(responded["host_response"], "Thanks for visiting");

    let (status, _) = ctx
        .send(
            Method::POST,
            &respond,
            Some(&host),
            Some(json!({ "host_response": "Second thoughts" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, reviews) = ctx
        .send(Method::GET, &format!("/api/v1/listings/{listing}/reviews"), None, None)
        .await?;
    assert_eq!(reviews["count"], 1);
    assert_eq!(reviews["results"][0]["host_response"], "Thanks for visiting");
    Ok(())
}

#[tokio::test]
async fn availability_requires_both_dates() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;
    let listing = ctx.approved_listing(&host, &admin, "Kisumu", 1000).await?;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/v1/listings/{listing}/availability?start_date=2024-03-02"),
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/v1/listings/{listing}/availability?start_date=2024-03-02&end_date=2024-03-09"),
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["conflicting_bookings"], 0);
    Ok(())
}

#[tokio::test]
async fn list_endpoints_return_page_envelopes() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;
    for (city, price) in [("Nakuru", 1000), ("Nanyuki", 3000), ("Naivasha", 2000)] {
        ctx.approved_listing(&host, &admin, city, price).await?;
    }

    let (status, first) = ctx
        .send(
            Method::GET,
            "/api/v1/listings?ordering=price_per_night&page_size=2",
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 3);
    assert_eq!(first["page"], 1);
    assert_eq!(first["page_size"], 2);
    assert_eq!(first["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["results"][0]["city"], "Nakuru");
    assert!(first["previous"].is_null());
    let next = first["next"].as_str().unwrap_or_default().to_string();
    assert!(next.contains("ordering=price_per_night"));
    assert!(next.contains("page=2"));

    let (_, second) = ctx.send(Method::GET, &next, None, None).await?;
    assert_eq!(second["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(second["results"][0]["city"], "Nanyuki");
    assert!(second["next"].is_null());

    let (status, _) = ctx
        .send(Method::GET, "/api/v1/listings?ordering=rating", None, None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;
    let guest = ctx.signup("guest", "guest").await?;
    let listing = ctx.approved_listing(&host, &admin, "Nairobi", 2500).await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/bookings",
            Some(&guest),
            Some(json!({ "listing_id": listing, "start_date": "2025-01-01" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("end_date"));

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/reviews",
            Some(&guest),
            Some(json!({ "booking_id": "x", "rating": "five", "body": "lovely" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = ctx.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["error"], "validation_error");
    Ok(())
}

#[tokio::test]
async fn unparseable_query_parameters_are_validation_errors() -> TestResult {
    let ctx = TestContext::new().await?;

    for uri in [
        "/api/v1/listings/search?min_price=abc",
        "/api/v1/listings?bedrooms=two",
        "/api/v1/listings?page=first",
    ] {
        let (status, body) = ctx.send(Method::GET, uri, None, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "validation_error", "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn text_filters_treat_wildcards_literally() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin().await?;
    let host = ctx.signup("host", "host").await?;
    ctx.approved_listing(&host, &admin, "Nairobi", 2500).await?;
    ctx.approved_listing(&host, &admin, "Mombasa", 4000).await?;

    let (_, found) = ctx
        .send(Method::GET, "/api/v1/listings/search?city=_", None, None)
        .await?;
    assert_eq!(found["count"], 0);

    let (_, found) = ctx
        .send(Method::GET, "/api/v1/listings?search=%25", None, None)
        .await?;
    assert_eq!(found["count"], 0);

    let (_, found) = ctx
        .send(Method::GET, "/api/v1/users?search=%25", None, None)
        .await?;
    assert_eq!(found["count"], 0);

    ctx.approved_listing(&host, &admin, "Watamu_North", 3000).await?;
    let (_, found) = ctx
        .send(Method::GET, "/api/v1/listings/search?city=u_n", None, None)
        .await?;
    assert_eq!(found["count"], 1);
    assert_eq!(found["results"][0]["city"], "Watamu_North");
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() -> TestResult {
    let ctx = TestContext::new().await?;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/listings")
        .header(ORIGIN, "http://localhost:3000")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())?;

    let response = ctx.router.clone().oneshot(request).await?;
    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        headers
            .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    Ok(())
}
