/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use snackfund_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = snackfund_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::auth::jwt_auth_layer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::{any::Any, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Lifetime of newly issued tokens
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.jwt.expiry_hours)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /api/
///     ├── /auth/                           # signup, signin, password reset (public)
///     │   └── GET /me                      # authenticated
///     ├── /users/:id                       # profile update
///     ├── /teams/                          # teams and membership
///     ├── /bank-accounts/                  # fund manager ledger
///     ├── /expenses/
///     ├── /payments/
///     ├── /rules/
///     ├── /rule-violations/
///     └── /snacks/                         # food manager ledger
/// ```
///
/// Everything except `/health` and the public auth routes sits behind
/// [`jwt_auth_layer`], applied as a route layer so unknown paths still fall
/// through to the JSON 404. Ledger routes additionally resolve the caller's
/// current team per request.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Panic recovery, rendered as the 500 envelope
/// 2. CORS
/// 3. Response compression
/// 4. Request tracing
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let public_auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signin", post(routes::auth::signin))
        .route("/request-password-reset", post(routes::auth::request_password_reset))
        .route("/reset-password", post(routes::auth::reset_password));

    let user_routes = Router::new().route("/:id", put(routes::users::update_user));

    let team_routes = Router::new()
        .route("/", post(routes::teams::create_team).get(routes::teams::list_my_teams))
        .route("/:id", get(routes::teams::get_team))
        .route("/:id/members", post(routes::teams::add_member))
        .route("/:id/members/:user_id", put(routes::teams::update_member))
        .route("/:id/switch", post(routes::teams::switch_team));

    let bank_account_routes = Router::new()
        .route(
            "/",
            post(routes::bank_accounts::create_bank_account)
                .get(routes::bank_accounts::list_bank_accounts),
        )
        .route(
            "/:id",
            get(routes::bank_accounts::get_bank_account)
                .put(routes::bank_accounts::update_bank_account)
                .delete(routes::bank_accounts::delete_bank_account),
        );

    let expense_routes = Router::new()
        .route(
            "/",
            post(routes::expenses::create_expense).get(routes::expenses::list_expenses),
        )
        .route(
            "/:id",
            get(routes::expenses::get_expense)
                .put(routes::expenses::update_expense)
                .delete(routes::expenses::delete_expense),
        )
        .route("/user/:user_id", get(routes::expenses::list_user_expenses));

    let payment_routes = Router::new()
        .route(
            "/",
            post(routes::payments::create_payment).get(routes::payments::list_payments),
        )
        .route(
            "/:id",
            get(routes::payments::get_payment)
                .put(routes::payments::update_payment)
                .delete(routes::payments::delete_payment),
        )
        .route("/user/:user_id", get(routes::payments::list_user_payments));

    let rule_routes = Router::new()
        .route("/", post(routes::rules::create_rule).get(routes::rules::list_rules))
        .route(
            "/:id",
            get(routes::rules::get_rule)
                .put(routes::rules::update_rule)
                .delete(routes::rules::delete_rule),
        );

    let violation_routes = Router::new()
        .route(
            "/",
            post(routes::rule_violations::create_violation)
                .get(routes::rule_violations::list_violations),
        )
        .route(
            "/:id",
            get(routes::rule_violations::get_violation)
                .put(routes::rule_violations::update_violation)
                .delete(routes::rule_violations::delete_violation),
        )
        .route(
            "/violator/:user_id",
            get(routes::rule_violations::list_violations_by_violator),
        )
        .route("/rule/:rule_id", get(routes::rule_violations::list_violations_by_rule));

    let snack_routes = Router::new()
        .route("/", post(routes::snacks::create_snack).get(routes::snacks::list_snacks))
        .route("/date-range", get(routes::snacks::list_snacks_by_date_range))
        .route(
            "/:id",
            get(routes::snacks::get_snack)
                .put(routes::snacks::update_snack)
                .delete(routes::snacks::delete_snack),
        );

    // Everything below requires a valid JWT
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/bank-accounts", bank_account_routes)
        .nest("/expenses", expense_routes)
        .nest("/payments", payment_routes)
        .nest("/rules", rule_routes)
        .nest("/rule-violations", violation_routes)
        .nest("/snacks", snack_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Configures CORS from `CORS_ORIGINS`
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JSON 404 for unknown routes
async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Renders a handler panic as the 500 envelope
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::InternalError(format!("Handler panicked: {}", detail)).into_response()
}
