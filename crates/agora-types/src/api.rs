use async_graphql::{ID, InputObject};

// -- Users --

#[derive(Debug, Clone, Default, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    #[graphql(default)]
    pub about: String,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateUserInput {
    pub about: String,
}

// -- Posts --

#[derive(Debug, Clone, Default, InputObject)]
pub struct CreatePostInput {
    pub data: String,
    #[graphql(default)]
    pub commentable: bool,
}

/// Both fields are overwritten on update. An input equal to the default
/// (empty `data`, `commentable: false`) is rejected as having nothing to edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, InputObject)]
pub struct UpdatePostInput {
    #[graphql(default)]
    pub data: String,
    #[graphql(default)]
    pub commentable: bool,
}

impl UpdatePostInput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// -- Comments --

#[derive(Debug, Clone, InputObject)]
pub struct CreateCommentInput {
    pub text: String,
    pub post: ID,
    /// Comment being answered. Anything that is not a non-negative integer
    /// (including `-1` or no value) creates a top-level comment.
    #[graphql(name = "answer_to")]
    pub answer_to: Option<ID>,
}

#[derive(Debug, Clone, InputObject)]
pub struct UpdateCommentInput {
    pub data: String,
}
