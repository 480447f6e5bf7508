//! JWT-based authentication extractor for Axum handlers.
//!
//! [`AuthUser`] validates the bearer token and resolves the caller's
//! account row, creating it lazily on the first authenticated request for
//! an unknown identity-provider uid. The same pass backfills `user_id`
//! onto any email-only plan shares addressed to the account's email, so
//! invites extended before registration resolve without a callback from
//! the identity provider.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use studyloom_core::error::CoreError;
use studyloom_core::sharing::{normalize_email, Principal};
use studyloom_core::types::DbId;
use studyloom_db::repositories::{PlanShareRepo, UserRepo};

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header, resolved against the `users` table.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// Normalized (lowercased) account email.
    pub email: String,
    /// Display name, possibly empty.
    pub display_name: String,
    /// The account role from the database (`"user"` or `"admin"`).
    pub role: String,
}

impl AuthUser {
    /// The view the sharing predicates operate on.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let email = normalize_email(&claims.email);
        let user = UserRepo::ensure(
            &state.pool,
            &claims.sub,
            &email,
            claims.name.as_deref().unwrap_or(""),
        )
        .await?;

        // Claim any pending email-only shares. A no-op on every request
        // after the first one that finds a match.
        let claimed = PlanShareRepo::claim_for_user(&state.pool, user.id, &user.email).await?;
        if claimed > 0 {
            tracing::info!(
                user_id = user.id,
                claimed,
                "Resolved pending plan shares for user"
            );
        }

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        })
    }
}
