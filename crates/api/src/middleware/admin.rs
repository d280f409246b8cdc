//! Admin token middleware.
//!
//! The only privilege signal is a shared token in the `x-admin-token` header.
//! The middleware resolves it once per request into an [`AdminFlag`]; handlers
//! pick it up through the [`Admin`] extractor and hand it to the budget editor
//! as its privilege gate. A missing or wrong token is not rejected here: the
//! editor answers with a permission error on gated calls only.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use desa_core::privilege::StaticPrivilege;

use crate::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Per-request privilege resolved by [`admin_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminFlag(pub bool);

fn token_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => {
            expected.len() == presented.len()
                && expected
                    .bytes()
                    .zip(presented.bytes())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
        }
        _ => false,
    }
}

/// Marks the request as admin when its token matches the configured one.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    let flag = AdminFlag(token_matches(state.admin_token.as_deref(), presented));
    request.extensions_mut().insert(flag);
    next.run(request).await
}

/// Privilege gate for the current request.
///
/// ```ignore
/// async fn handler(admin: Admin) -> impl IntoResponse {
///     let editor = BudgetEditor::new(admin.gate());
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub StaticPrivilege);

impl Admin {
    /// The gate to pass to the editor or the store.
    #[must_use]
    pub const fn gate(self) -> StaticPrivilege {
        self.0
    }
}

impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let AdminFlag(privileged) = parts
            .extensions
            .get::<AdminFlag>()
            .copied()
            .unwrap_or(AdminFlag(false));
        Ok(Self(StaticPrivilege(privileged)))
    }
}
