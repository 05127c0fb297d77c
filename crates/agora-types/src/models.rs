use async_graphql::{ComplexObject, ID, SimpleObject};
use serde::{Deserialize, Serialize};

/// Sentinel stored in `answer_to` / `initial_comment` when a comment is not a reply.
pub const NO_PARENT: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[graphql(complex)]
pub struct User {
    #[graphql(skip)]
    pub id: i64,
    pub name: String,
    pub about: String,
}

#[ComplexObject]
impl User {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }
}

/// A post together with the author as they looked when the post was written.
///
/// `author` is a copy, never re-read from `users`: later profile edits do not
/// show up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    #[graphql(skip)]
    pub id: i64,
    pub data: String,
    pub commentable: bool,
    pub author: User,
}

#[ComplexObject]
impl Post {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }
}

/// A comment on a post, optionally a reply to another comment.
///
/// Both `post` and `creator` are copies taken when the comment was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleObject)]
#[graphql(complex)]
pub struct Comment {
    #[graphql(skip)]
    pub id: i64,
    pub text: String,
    pub post: Post,
    /// Id of the comment this one answers, or [`NO_PARENT`].
    #[graphql(skip)]
    pub answer_to: i64,
    /// `answer_to` of the answered comment, or [`NO_PARENT`].
    #[graphql(skip)]
    pub initial_comment: i64,
    pub creator: User,
    pub has_replies: bool,
}

#[ComplexObject]
impl Comment {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(name = "answer_to")]
    async fn answer_to(&self) -> ID {
        ID(self.answer_to.to_string())
    }

    #[graphql(name = "initial_comment")]
    async fn initial_comment(&self) -> ID {
        ID(self.initial_comment.to_string())
    }
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.answer_to != NO_PARENT
    }
}
