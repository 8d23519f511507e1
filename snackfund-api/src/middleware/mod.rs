/// Middleware for the API server
///
/// - `auth`: bearer-token authentication layer
/// - `team`: resolves the caller's current team for ledger routes

pub mod auth;
pub mod team;
