use crate::Database;
use crate::Snapshot;
use crate::models::{CommentRow, NewComment, PostRow, UserRow};
use agora_types::models::{NO_PARENT, User};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

const USER_COLUMNS: &str = "id, name, about";
const POST_COLUMNS: &str = "id, data, author, is_commentable";
const COMMENT_COLUMNS: &str = "id, post, author, initial_comment, answer_to, data, has_replies";

impl Database {
    // -- Users --

    pub fn insert_user(&self, name: &str, about: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                &format!("INSERT INTO users (name, about) VALUES (?1, ?2) RETURNING {USER_COLUMNS}"),
                (name, about),
                user_from_row,
            )?;
            Ok(row)
        })
    }

    /// All rows matching `id`; callers decide what zero or several rows mean.
    pub fn find_users(&self, id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
            let rows = stmt
                .query_map([id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_user_about(&self, id: i64, about: &str) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let row = conn
                .query_row(
                    &format!("UPDATE users SET about = ?1 WHERE id = ?2 RETURNING {USER_COLUMNS}"),
                    rusqlite::params![about, id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, data: &str, author: &User, commentable: bool) -> Result<PostRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                &format!(
                    "INSERT INTO posts (data, author, is_commentable) VALUES (?1, ?2, ?3) RETURNING {POST_COLUMNS}"
                ),
                rusqlite::params![data, Snapshot(author), commentable],
                post_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn find_posts(&self, id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"))?;
            let rows = stmt
                .query_map([id], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map([limit, offset], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn post_author(&self, id: i64) -> Result<Option<Snapshot<User>>> {
        self.with_conn(|conn| {
            let author = conn
                .query_row("SELECT author FROM posts WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(author)
        })
    }

    /// Overwrites `data` and `is_commentable`; the author snapshot is left alone.
    pub fn update_post(&self, id: i64, data: &str, commentable: bool) -> Result<Option<PostRow>> {
        self.with_conn_mut(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "UPDATE posts SET data = ?1, is_commentable = ?2 WHERE id = ?3 RETURNING {POST_COLUMNS}"
                    ),
                    rusqlite::params![data, commentable, id],
                    post_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Comments --

    /// Insert a comment. A reply also flags its target as having replies and
    /// inherits the target's own `answer_to` as `initial_comment`; both writes
    /// share one transaction.
    ///
    /// `None` when `answer_to` names a comment that does not exist. Nothing is
    /// written in that case.
    pub fn insert_comment(&self, new: &NewComment<'_>) -> Result<Option<CommentRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let initial_comment = if new.answer_to == NO_PARENT {
                NO_PARENT
            } else {
                let target = tx
                    .query_row(
                        "UPDATE comments SET has_replies = 1 WHERE id = ?1 RETURNING answer_to",
                        [new.answer_to],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?;
                match target {
                    Some(parent) => parent,
                    None => return Ok(None),
                }
            };

            let row = tx.query_row(
                &format!(
                    "INSERT INTO comments (post, author, initial_comment, answer_to, data, has_replies)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0)
                     RETURNING {COMMENT_COLUMNS}"
                ),
                rusqlite::params![
                    Snapshot(new.post),
                    Snapshot(new.author),
                    initial_comment,
                    new.answer_to,
                    new.text,
                ],
                comment_from_row,
            )?;
            tx.commit()?;
            Ok(Some(row))
        })
    }

    pub fn find_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                    [id],
                    comment_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn comment_author(&self, id: i64) -> Result<Option<Snapshot<User>>> {
        self.with_conn(|conn| {
            let author = conn
                .query_row("SELECT author FROM comments WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(author)
        })
    }

    pub fn update_comment_text(&self, id: i64, text: &str) -> Result<Option<CommentRow>> {
        self.with_conn_mut(|conn| {
            let row = conn
                .query_row(
                    &format!("UPDATE comments SET data = ?1 WHERE id = ?2 RETURNING {COMMENT_COLUMNS}"),
                    rusqlite::params![text, id],
                    comment_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Top-level comments whose post snapshot carries `post_id`, in insertion order.
    pub fn top_level_comments(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMENT_COLUMNS} FROM comments
                 WHERE json_extract(post, '$.id') = ?1 AND answer_to = ?2
                 ORDER BY id ASC
                 LIMIT ?3 OFFSET ?4"
            ))?;
            let rows = stmt
                .query_map([post_id, NO_PARENT, limit, offset], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn replies(&self, comment_id: i64, limit: i64, offset: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMENT_COLUMNS} FROM comments
                 WHERE answer_to = ?1
                 ORDER BY id ASC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map([comment_id, limit, offset], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        about: row.get(2)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        data: row.get(1)?,
        author: row.get(2)?,
        is_commentable: row.get(3)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post: row.get(1)?,
        author: row.get(2)?,
        initial_comment: row.get(3)?,
        answer_to: row.get(4)?,
        data: row.get(5)?,
        has_replies: row.get(6)?,
    })
}
