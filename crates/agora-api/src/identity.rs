use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::error::ForumError;

/// Header carrying the caller's claimed user id.
pub const USER_HEADER: &str = "user";

/// Identity claimed by the request, if any.
///
/// The header value is trusted as-is: there is no token or session behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(Option<String>);

impl Caller {
    pub const ANONYMOUS: Caller = Caller(None);

    pub fn claimed(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() { Self(None) } else { Self(Some(id)) }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(USER_HEADER)
            .map(|v| Self::claimed(String::from_utf8_lossy(v.as_bytes())))
            .unwrap_or_default()
    }

    pub fn identity(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Attach the caller's claimed identity to the request.
///
/// Never rejects: requests without the header continue as anonymous.
pub async fn extract_identity(mut req: Request, next: Next) -> Response {
    let caller = Caller::from_headers(req.headers());
    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Check that the caller claimed an identity and that it is all digits.
///
/// Returns the raw identity. Whether such a user exists is not checked here.
pub fn authorize(caller: &Caller) -> Result<&str, ForumError> {
    let id = caller.identity().ok_or(ForumError::NotAuthorized)?;
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ForumError::InvalidIdentity);
    }
    Ok(id)
}
