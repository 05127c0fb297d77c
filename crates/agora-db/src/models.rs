//! Database row types: these map directly to SQLite rows.
//! Distinct from agora-types API models to keep the DB layer independent.

use agora_types::models::{Comment, Post, User};

use crate::Snapshot;

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub about: String,
}

pub struct PostRow {
    pub id: i64,
    pub data: String,
    pub author: Snapshot<User>,
    pub is_commentable: bool,
}

pub struct CommentRow {
    pub id: i64,
    pub post: Snapshot<Post>,
    pub author: Snapshot<User>,
    pub initial_comment: i64,
    pub answer_to: i64,
    pub data: String,
    pub has_replies: bool,
}

/// Values for a comment insert; snapshots are taken from the borrowed entities.
/// `initial_comment` is derived from the target when `answer_to` is set.
pub struct NewComment<'a> {
    pub post: &'a Post,
    pub author: &'a User,
    pub answer_to: i64,
    pub text: &'a str,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            about: row.about,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            data: row.data,
            commentable: row.is_commentable,
            author: row.author.into_inner(),
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            text: row.data,
            post: row.post.into_inner(),
            answer_to: row.answer_to,
            initial_comment: row.initial_comment,
            creator: row.author.into_inner(),
            has_replies: row.has_replies,
        }
    }
}
