use std::sync::Arc;
use std::time::Duration;

use agora_db::{CancelToken, Database};
use agora_db::models::NewComment;
use agora_types::api::{
    CreateCommentInput, CreatePostInput, CreateUserInput, UpdateCommentInput, UpdatePostInput,
    UpdateUserInput,
};
use agora_types::models::{Comment, NO_PARENT, Post, User};
use agora_types::text::{ABOUT_MAX_CHARS, COMMENT_MAX_CHARS, NAME_MAX_CHARS, crop_to_length};
use tracing::{debug, error, warn};

use crate::error::{Entity, ForumError};
use crate::identity::{Caller, authorize};

/// Fixed page size for every paginated listing.
pub const PAGE_SIZE: i64 = 20;

/// Upper bounds on a single store call.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Single-row reads and all writes.
    pub lookup: Duration,
    /// Paginated listings.
    pub list: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(5),
            list: Duration::from_secs(30),
        }
    }
}

/// Forum operations over the shared store.
///
/// Each operation is independent: there are no transactions spanning store
/// calls, so a failure part-way through keeps whatever already committed.
#[derive(Clone)]
pub struct Forum {
    db: Database,
    timeouts: Timeouts,
}

type Result<T> = std::result::Result<T, ForumError>;

impl Forum {
    pub fn new(db: Database, timeouts: Timeouts) -> Self {
        Self { db, timeouts }
    }

    // -- Users --

    pub async fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let name = crop_to_length(&input.name, NAME_MAX_CHARS).to_owned();
        let about = crop_to_length(&input.about, ABOUT_MAX_CHARS).to_owned();

        let row = self
            .lookup("create user", move |db| db.insert_user(&name, &about))
            .await?;
        debug!(user_id = row.id, "user created");
        Ok(row.into())
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        let id = parse_id(id, Entity::User)?;
        self.fetch_user(id).await
    }

    pub async fn update_user(&self, caller: &Caller, input: UpdateUserInput) -> Result<User> {
        let user_id = caller_id(caller)?;
        self.fetch_user(user_id).await?;

        let about = crop_to_length(&input.about, ABOUT_MAX_CHARS).to_owned();
        let row = self
            .lookup("update user", move |db| db.update_user_about(user_id, &about))
            .await?
            .ok_or(ForumError::NotFound(Entity::User))?;
        Ok(row.into())
    }

    // -- Posts --

    pub async fn create_post(&self, caller: &Caller, input: CreatePostInput) -> Result<Post> {
        let user_id = caller_id(caller)?;
        let author = self.fetch_user(user_id).await?;

        let snapshot = author.clone();
        let row = self
            .lookup("create post", move |db| {
                db.insert_post(&input.data, &snapshot, input.commentable)
            })
            .await?;
        debug!(post_id = row.id, author_id = author.id, "post created");

        Ok(Post {
            id: row.id,
            data: row.data,
            commentable: row.is_commentable,
            author,
        })
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        let id = parse_id(id, Entity::Post)?;
        self.fetch_post(id).await
    }

    /// One page of posts in ascending id order. Pages past the end are empty.
    pub async fn get_posts(&self, page: i32) -> Result<Vec<Post>> {
        let offset = page_offset(page)?;
        let rows = self
            .list("list posts", move |db| db.list_posts(PAGE_SIZE, offset))
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Owner-only. The stored author snapshot is kept as-is.
    pub async fn update_post(&self, caller: &Caller, id: &str, input: UpdatePostInput) -> Result<Post> {
        let user_id = caller_id(caller)?;
        self.fetch_user(user_id).await?;

        let post_id = parse_id(id, Entity::Post)?;
        let author = self
            .lookup("load post author", move |db| db.post_author(post_id))
            .await?
            .ok_or(ForumError::NotFound(Entity::Post))?;
        if !is_owner(caller, &author.0) {
            return Err(ForumError::NotOwner(Entity::Post));
        }
        if input.is_empty() {
            return Err(ForumError::NoOp);
        }

        let row = self
            .lookup("update post", move |db| {
                db.update_post(post_id, &input.data, input.commentable)
            })
            .await?
            .ok_or(ForumError::NotFound(Entity::Post))?;
        Ok(row.into())
    }

    // -- Comments --

    pub async fn create_comment(&self, caller: &Caller, input: CreateCommentInput) -> Result<Comment> {
        let user_id = caller_id(caller)?;
        let text = crop_to_length(&input.text, COMMENT_MAX_CHARS).to_owned();
        let answer_to = input
            .answer_to
            .as_deref()
            .and_then(|raw| parse_id(raw, Entity::Comment).ok());

        let author = self.fetch_user(user_id).await?;
        let post = self.get_post(&input.post).await?;
        if !post.commentable {
            return Err(ForumError::CommentingDisabled);
        }

        let row = self
            .lookup("create comment", move |db| {
                db.insert_comment(&NewComment {
                    post: &post,
                    author: &author,
                    answer_to: answer_to.unwrap_or(NO_PARENT),
                    text: &text,
                })
            })
            .await?
            .ok_or(ForumError::NotFound(Entity::Comment))?;
        let comment = Comment::from(row);
        debug!(comment_id = comment.id, reply = comment.is_reply(), "comment created");
        Ok(comment)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Comment> {
        let id = parse_id(id, Entity::Comment)?;
        self.fetch_comment(id).await
    }

    /// Owner-only. Only the text changes; snapshots and reply links are kept.
    pub async fn update_comment(
        &self,
        caller: &Caller,
        id: &str,
        input: UpdateCommentInput,
    ) -> Result<Comment> {
        let user_id = caller_id(caller)?;
        self.fetch_user(user_id).await?;

        let comment_id = parse_id(id, Entity::Comment)?;
        let author = self
            .lookup("load comment author", move |db| db.comment_author(comment_id))
            .await?
            .ok_or(ForumError::NotFound(Entity::Comment))?;
        if !is_owner(caller, &author.0) {
            return Err(ForumError::NotOwner(Entity::Comment));
        }

        let text = crop_to_length(&input.data, COMMENT_MAX_CHARS).to_owned();
        let row = self
            .lookup("update comment", move |db| db.update_comment_text(comment_id, &text))
            .await?
            .ok_or(ForumError::NotFound(Entity::Comment))?;
        Ok(row.into())
    }

    /// Top-level comments of a post, matched through each comment's post snapshot.
    pub async fn get_comments(&self, post_id: &str, page: i32) -> Result<Vec<Comment>> {
        let offset = page_offset(page)?;
        let post_id = parse_id(post_id, Entity::Post)?;
        self.fetch_post(post_id).await?;

        let rows = self
            .list("list comments", move |db| {
                db.top_level_comments(post_id, PAGE_SIZE, offset)
            })
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Direct replies to a comment.
    pub async fn get_replies(&self, comment_id: &str, page: i32) -> Result<Vec<Comment>> {
        let offset = page_offset(page)?;
        let comment_id = parse_id(comment_id, Entity::Comment)?;
        self.fetch_comment(comment_id).await?;

        let rows = self
            .list("list replies", move |db| db.replies(comment_id, PAGE_SIZE, offset))
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    // -- Helpers --

    async fn fetch_user(&self, id: i64) -> Result<User> {
        let rows = self.lookup("load user", move |db| db.find_users(id)).await?;
        single(rows, Entity::User).map(User::from)
    }

    async fn fetch_post(&self, id: i64) -> Result<Post> {
        let rows = self.lookup("load post", move |db| db.find_posts(id)).await?;
        single(rows, Entity::Post).map(Post::from)
    }

    async fn fetch_comment(&self, id: i64) -> Result<Comment> {
        self.lookup("load comment", move |db| db.find_comment(id))
            .await?
            .map(Comment::from)
            .ok_or(ForumError::NotFound(Entity::Comment))
    }

    async fn lookup<T, F>(&self, what: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(what, self.timeouts.lookup, f).await
    }

    async fn list<T, F>(&self, what: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(what, self.timeouts.list, f).await
    }

    /// Run a blocking store call off the async runtime, bounded by `limit`.
    ///
    /// A timed-out call that has not reached a connection is dropped and never
    /// runs. One that is already running is interrupted and awaited, so the
    /// reported outcome always matches what the store kept.
    async fn run<T, F>(&self, what: &'static str, limit: Duration, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let token = Arc::new(CancelToken::default());
        let db = self.db.cancellable(Arc::clone(&token));
        let mut task = tokio::task::spawn_blocking(move || f(&db));

        let joined = match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                if !token.cancel() {
                    warn!("{} exceeded {:?}, interrupting", what, limit);
                    if let Ok(Ok(value)) = task.await {
                        return Ok(value);
                    }
                }
                error!("{} timed out after {:?}", what, limit);
                return Err(ForumError::Timeout);
            }
        };

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("{} failed: {:#}", what, e);
                Err(ForumError::Store(e))
            }
            Err(e) => {
                error!("{}: spawn_blocking join error: {}", what, e);
                Err(ForumError::Store(e.into()))
            }
        }
    }
}

/// Authorize the caller and turn the checked identity into a user id.
fn caller_id(caller: &Caller) -> Result<i64> {
    authorize(caller)?
        .parse::<i64>()
        .map_err(|_| ForumError::InvalidIdentity)
}

/// Ownership compares the identity as sent, so "007" does not own user 7's rows.
fn is_owner(caller: &Caller, owner: &User) -> bool {
    caller.identity() == Some(owner.id.to_string().as_str())
}

/// Ids are non-negative integers; anything else is rejected before touching the store.
fn parse_id(raw: &str, entity: Entity) -> Result<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ForumError::InvalidId(entity));
    }
    raw.parse().map_err(|_| ForumError::InvalidId(entity))
}

fn page_offset(page: i32) -> Result<i64> {
    if page < 1 {
        return Err(ForumError::InvalidPage);
    }
    Ok((i64::from(page) - 1) * PAGE_SIZE)
}

fn single<T>(mut rows: Vec<T>, entity: Entity) -> Result<T> {
    match rows.len() {
        0 => Err(ForumError::NotFound(entity)),
        1 => Ok(rows.remove(0)),
        _ => Err(ForumError::Ambiguous(entity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_plain_digits() {
        assert_eq!(parse_id("12", Entity::Post).unwrap(), 12);
        for bad in ["", "-1", "1.5", "abc", "99999999999999999999"] {
            assert!(matches!(
                parse_id(bad, Entity::Comment),
                Err(ForumError::InvalidId(Entity::Comment))
            ));
        }
    }

    #[test]
    fn pages_start_at_one() {
        assert_eq!(page_offset(1).unwrap(), 0);
        assert_eq!(page_offset(3).unwrap(), 40);
        assert!(matches!(page_offset(0), Err(ForumError::InvalidPage)));
        assert!(matches!(page_offset(-109), Err(ForumError::InvalidPage)));
    }

    #[test]
    fn single_distinguishes_missing_from_ambiguous() {
        assert!(matches!(single(Vec::<i32>::new(), Entity::User), Err(ForumError::NotFound(Entity::User))));
        assert_eq!(single(vec![5], Entity::User).unwrap(), 5);
        assert!(matches!(single(vec![1, 2], Entity::User), Err(ForumError::Ambiguous(Entity::User))));
    }

    #[test]
    fn ownership_needs_the_exact_identity() {
        let owner = User {
            id: 7,
            ..User::default()
        };
        assert!(is_owner(&Caller::claimed("7"), &owner));
        assert!(!is_owner(&Caller::claimed("007"), &owner));
        assert!(!is_owner(&Caller::claimed("8"), &owner));
        assert!(!is_owner(&Caller::ANONYMOUS, &owner));
    }

    #[test]
    fn overflowing_identity_is_invalid() {
        let caller = Caller::claimed("99999999999999999999");
        assert!(matches!(caller_id(&caller), Err(ForumError::InvalidIdentity)));
    }
}
