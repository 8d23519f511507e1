/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, which renders as the standard
/// envelope:
///
/// ```json
/// { "success": false, "message": "Expense not found", "statusCode": 404 }
/// ```
///
/// Duplicate-key conflicts are reported as 400, not 409, to keep the status
/// codes clients already handle.
///
/// # Example
///
/// ```no_run
/// use snackfund_api::error::{ApiError, ApiResult};
///
/// fn require_reason(reason: &str) -> ApiResult<()> {
///     if reason.trim().is_empty() {
///         return Err(ApiError::BadRequest("Reason is required".to_string()));
///     }
///     Ok(())
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use snackfund_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Duplicate unique value (400)
    Conflict(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, e.g. `contributions[1].amount`
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub status_code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// Extra error payload; only validation failures carry one
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorData {
    pub errors: Vec<ValidationErrorDetail>,
}

impl ApiError {
    /// Builds a single-field validation error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// HTTP status this error renders with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) | ApiError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    ///
    /// Internal details are never exposed.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::ValidationError(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Request validation failed".to_string()),
            ApiError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InternalError(msg) = &self {
            // Log internal errors but don't expose details to clients
            tracing::error!("Internal error: {}", msg);
        }

        let status = self.status_code();
        let message = self.client_message();
        let data = match self {
            ApiError::ValidationError(errors) => Some(ErrorData { errors }),
            _ => None,
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            status_code: status.as_u16(),
            data,
        });

        (status, body).into_response()
    }
}

/// Error shape of the signup and signin endpoints: `{ "error": "..." }`
///
/// Those two endpoints predate the envelope and clients depend on this body.
#[derive(Debug)]
pub struct AuthEndpointError(pub ApiError);

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthErrorBody {
    pub error: String,
}

impl IntoResponse for AuthEndpointError {
    fn into_response(self) -> Response {
        if let ApiError::InternalError(msg) = &self.0 {
            tracing::error!("Internal error: {}", msg);
        }

        let status = self.0.status_code();
        let body = Json(AuthErrorBody {
            error: self.0.client_message(),
        });

        (status, body).into_response()
    }
}

impl From<ApiError> for AuthEndpointError {
    fn from(err: ApiError) -> Self {
        AuthEndpointError(err)
    }
}

/// Message for a unique violation, chosen by constraint name
fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "User with this email already exists",
        Some("teams_team_name_key") => "Team name already exists",
        Some("team_members_team_id_user_id_key") => "User is already a member of this team",
        Some("bank_accounts_team_id_user_id_key") => {
            "User already has a bank account registered for this team"
        }
        _ => "Resource already exists",
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict(conflict_message(db_err.constraint()).to_string());
                }
                if db_err.is_check_violation() {
                    return ApiError::BadRequest(format!(
                        "Value violates constraint {}",
                        db_err.constraint().unwrap_or("unknown")
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return ApiError::NotFound("Referenced resource not found".to_string());
                }
                if is_value_too_long(db_err.code().as_deref()) {
                    return ApiError::BadRequest("Value is too long".to_string());
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// SQLSTATE 22001 `string_data_right_truncation`
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// True when Postgres rejected a value wider than its column
fn is_value_too_long(code: Option<&str>) -> bool {
    code == Some(STRING_DATA_RIGHT_TRUNCATION)
}

/// Flattens nested validator errors into `field` paths
fn collect_validation_errors(
    prefix: &str,
    errors: &ValidationErrors,
    out: &mut Vec<ValidationErrorDetail>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| ValidationErrorDetail {
                    field: path.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path)),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Convert `#[derive(Validate)]` failures to API errors
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_validation_errors("", &errors, &mut details);
        // HashMap order is random; keep responses stable
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Forbidden("You are not a member of this team".to_string())
            }
            AuthzError::Inactive(_) => {
                ApiError::Forbidden("You are not an active member of this team".to_string())
            }
            AuthzError::InsufficientRole { .. } | AuthzError::RoleAssignmentDenied { .. } => {
                ApiError::Forbidden(err.to_string())
            }
            AuthzError::SelfDeactivation => ApiError::BadRequest(err.to_string()),
            AuthzError::DatabaseError(err) => {
                ApiError::InternalError(format!("Database error: {}", err))
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            JwtError::InvalidIssuer { .. } | JwtError::ValidationError(_) => {
                ApiError::Unauthorized("Invalid token".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snackfund_shared::models::membership::TeamRole;
    use uuid::Uuid;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Expense not found".to_string());
        assert_eq!(err.to_string(), "Not found: Expense not found");
    }

    #[test]
    fn test_conflict_is_bad_request() {
        let err = ApiError::Conflict("Team name already exists".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ApiError::InternalError("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_conflict_messages_by_constraint() {
        assert_eq!(
            conflict_message(Some("users_email_key")),
            "User with this email already exists"
        );
        assert_eq!(
            conflict_message(Some("team_members_team_id_user_id_key")),
            "User is already a member of this team"
        );
        assert_eq!(
            conflict_message(Some("bank_accounts_team_id_user_id_key")),
            "User already has a bank account registered for this team"
        );
        assert_eq!(conflict_message(None), "Resource already exists");
    }

    #[test]
    fn test_authz_error_mapping() {
        let team = Uuid::new_v4();

        let err: ApiError = AuthzError::NotMember(team).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ApiError = AuthzError::InsufficientRole {
            required: TeamRole::FundManager,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.client_message(), "Only a fund manager can perform this action");

        let err: ApiError = AuthzError::SelfDeactivation.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "You cannot deactivate yourself");
    }

    #[test]
    fn test_value_too_long_is_recognised() {
        assert!(is_value_too_long(Some("22001")));
        assert!(!is_value_too_long(Some("23505")));
        assert!(!is_value_too_long(None));
    }

    #[test]
    fn test_jwt_error_mapping() {
        let err: ApiError = JwtError::Expired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: ApiError = JwtError::CreateError("boom".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 0.0, message = "Amount must be non-negative"))]
        amount: f64,
    }

    #[derive(Validate)]
    struct Order {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,

        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn test_validation_errors_are_flattened() {
        let order = Order {
            title: String::new(),
            lines: vec![Line { amount: 1.0 }, Line { amount: -2.0 }],
        };

        let err: ApiError = order.validate().unwrap_err().into();
        let ApiError::ValidationError(details) = &err else {
            panic!("expected validation error");
        };

        assert_eq!(
            details,
            &vec![
                ValidationErrorDetail {
                    field: "lines[1].amount".to_string(),
                    message: "Amount must be non-negative".to_string(),
                },
                ValidationErrorDetail {
                    field: "title".to_string(),
                    message: "Title is required".to_string(),
                },
            ]
        );
        assert_eq!(err.client_message(), "Amount must be non-negative");
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse {
            success: false,
            message: "Payment not found".to_string(),
            status_code: 404,
            data: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 404);
        assert!(json.get("data").is_none());
    }
}
