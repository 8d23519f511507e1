/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and policy
/// - [`jwt`]: JWT token generation and validation
/// - [`reset_token`]: password reset token generation and verification
/// - [`middleware`]: bearer-token extraction and `AuthContext`
/// - [`authorization`]: team-scoped role checks
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::auth::password::{hash_password, verify_password};
/// use snackfund_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "ana@example.com");
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
