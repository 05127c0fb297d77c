//! GraphQL root resolvers. Each field delegates to the matching [`Forum`]
//! operation; failures are reported as field errors next to a zero value.

use async_graphql::{Context, ErrorExtensions, ID, Object, Result};
use tracing::debug;

use agora_types::api::{
    CreateCommentInput, CreatePostInput, CreateUserInput, UpdateCommentInput, UpdatePostInput,
    UpdateUserInput,
};
use agora_types::models::{Comment, Post, User};

use crate::error::ForumError;
use crate::forum::Forum;
use crate::identity::Caller;

/// Root query resolver
pub struct Query;

#[Object]
impl Query {
    #[graphql(name = "get_user")]
    async fn get_user(&self, ctx: &Context<'_>, id: ID) -> Result<User> {
        Ok(forum(ctx)?.get_user(&id).await.or_field_error(ctx))
    }

    #[graphql(name = "get_post")]
    async fn get_post(&self, ctx: &Context<'_>, #[graphql(name = "post_id")] post_id: ID) -> Result<Post> {
        Ok(forum(ctx)?.get_post(&post_id).await.or_field_error(ctx))
    }

    /// Posts in creation order, 20 per page, starting at page 1.
    async fn posts(&self, ctx: &Context<'_>, page: i32) -> Result<Vec<Post>> {
        Ok(forum(ctx)?.get_posts(page).await.or_field_error(ctx))
    }

    #[graphql(name = "get_comment")]
    async fn get_comment(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "comment_id")] comment_id: ID,
    ) -> Result<Comment> {
        Ok(forum(ctx)?.get_comment(&comment_id).await.or_field_error(ctx))
    }

    /// Top-level comments of a post, 20 per page.
    async fn comments(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "post_id")] post_id: ID,
        page: i32,
    ) -> Result<Vec<Comment>> {
        Ok(forum(ctx)?.get_comments(&post_id, page).await.or_field_error(ctx))
    }

    /// Direct replies to a comment, 20 per page.
    #[graphql(name = "get_replies")]
    async fn get_replies(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "comment_id")] comment_id: ID,
        page: i32,
    ) -> Result<Vec<Comment>> {
        Ok(forum(ctx)?.get_replies(&comment_id, page).await.or_field_error(ctx))
    }
}

/// Root mutation resolver
pub struct Mutation;

#[Object]
impl Mutation {
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<User> {
        Ok(forum(ctx)?.create_user(input).await.or_field_error(ctx))
    }

    async fn update_user(&self, ctx: &Context<'_>, input: UpdateUserInput) -> Result<User> {
        Ok(forum(ctx)?.update_user(caller(ctx), input).await.or_field_error(ctx))
    }

    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        Ok(forum(ctx)?.create_post(caller(ctx), input).await.or_field_error(ctx))
    }

    async fn update_post(&self, ctx: &Context<'_>, id: ID, input: UpdatePostInput) -> Result<Post> {
        Ok(forum(ctx)?
            .update_post(caller(ctx), &id, input)
            .await
            .or_field_error(ctx))
    }

    async fn create_comment(&self, ctx: &Context<'_>, input: CreateCommentInput) -> Result<Comment> {
        Ok(forum(ctx)?.create_comment(caller(ctx), input).await.or_field_error(ctx))
    }

    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "comm_id")] comm_id: ID,
        input: UpdateCommentInput,
    ) -> Result<Comment> {
        Ok(forum(ctx)?
            .update_comment(caller(ctx), &comm_id, input)
            .await
            .or_field_error(ctx))
    }
}

static ANONYMOUS: Caller = Caller::ANONYMOUS;

fn forum<'a>(ctx: &Context<'a>) -> Result<&'a Forum> {
    ctx.data::<Forum>()
}

fn caller<'a>(ctx: &Context<'a>) -> &'a Caller {
    ctx.data_opt::<Caller>().unwrap_or(&ANONYMOUS)
}

/// Turns a failed operation into a field error on the current path and
/// yields the zero value, so sibling fields still resolve.
trait FieldResultExt<T> {
    fn or_field_error(self, ctx: &Context<'_>) -> T;
}

impl<T: Default> FieldResultExt<T> for std::result::Result<T, ForumError> {
    fn or_field_error(self, ctx: &Context<'_>) -> T {
        self.unwrap_or_else(|err| {
            debug!(code = err.code(), "{}", err);
            let error = err.extend().into_server_error(ctx.item.pos);
            ctx.add_error(ctx.set_error_path(error));
            T::default()
        })
    }
}
