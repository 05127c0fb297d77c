use std::fmt;

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Record kinds named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Post,
    Comment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Post => "post",
            Entity::Comment => "comment",
        })
    }
}

/// Every way a forum operation can fail.
///
/// Messages are what the caller sees. Store failures carry their detail for
/// the server log only and display as a generic message.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("not authorized")]
    NotAuthorized,

    #[error("wrong user id")]
    InvalidIdentity,

    #[error("{0} with such id does not exist")]
    NotFound(Entity),

    #[error("wrong {0} id provided")]
    Ambiguous(Entity),

    #[error("cannot change another user's {0}")]
    NotOwner(Entity),

    #[error("cannot comment this post (commenting disabled)")]
    CommentingDisabled,

    #[error("pages start with 1")]
    InvalidPage,

    #[error("malformed {0} id")]
    InvalidId(Entity),

    #[error("nothing to edit")]
    NoOp,

    #[error("server error occurred")]
    Store(#[from] anyhow::Error),

    #[error("server error occurred")]
    Timeout,
}

impl ForumError {
    /// Stable code reported in the GraphQL error's `extensions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            ForumError::NotAuthorized => "NOT_AUTHORIZED",
            ForumError::InvalidIdentity => "INVALID_IDENTITY",
            ForumError::NotFound(_) => "NOT_FOUND",
            ForumError::Ambiguous(_) => "AMBIGUOUS",
            ForumError::NotOwner(_) | ForumError::CommentingDisabled => "FORBIDDEN",
            ForumError::InvalidPage => "INVALID_PAGE",
            ForumError::InvalidId(_) => "INVALID_ID",
            ForumError::NoOp => "NO_OP",
            ForumError::Store(_) | ForumError::Timeout => "INTERNAL",
        }
    }
}

impl ErrorExtensions for ForumError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}
