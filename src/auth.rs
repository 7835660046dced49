//! Session verification middleware.
//!
//! Identity lives outside this service: requests arrive carrying a bearer
//! token, and a [SessionVerifier] maps the token to a user id. The guard
//! places the verified id into the request as a [SessionUser] extension;
//! handlers never read the token themselves.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{Error, models::UserId};

/// Resolves a bearer token to the user it belongs to.
///
/// Implemented outside this crate by whatever session backend the deployment
/// uses. `None` means the token is unknown, expired, or malformed; the guard
/// does not distinguish.
pub trait SessionVerifier {
    /// The user id the token belongs to, if the token is valid.
    fn verify(&self, token: &str) -> Option<UserId>;
}

/// The verified identity of the requester, placed into the request by
/// [auth_guard].
///
/// Route handlers receive it with
/// `Extension(SessionUser(user_id)): Extension<SessionUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser(pub UserId);

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The session backend that resolves bearer tokens.
    pub verifier: Arc<dyn SessionVerifier + Send + Sync>,
}

/// Middleware function that checks for a valid bearer token.
/// The user ID is placed into the request and the request executed normally
/// if the token is valid, otherwise a 401 response is returned.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let header =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &()).await {
            Ok(TypedHeader(header)) => header,
            Err(_) => return Error::Unauthenticated.into_response(),
        };

    let user_id = match state.verifier.verify(header.token()) {
        Some(user_id) => user_id,
        None => return Error::Unauthenticated.into_response(),
    };

    parts.extensions.insert(SessionUser(user_id));
    next.run(Request::from_parts(parts, body)).await
}
