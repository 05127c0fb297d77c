//! GraphQL schema definition

use async_graphql::http::{GraphQLPlaygroundConfig, playground_source};
use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse},
};

use crate::forum::Forum;
use crate::identity::Caller;
use crate::resolvers::{Mutation, Query};

/// The main GraphQL schema type
pub type ForumSchema = Schema<Query, Mutation, EmptySubscription>;

/// Path the GraphQL endpoint is mounted on.
pub const GRAPHQL_PATH: &str = "/query";

#[derive(Debug, Clone)]
pub struct SchemaConfig {
    pub enable_introspection: bool,
    pub max_query_depth: Option<usize>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            enable_introspection: true,
            max_query_depth: Some(15),
        }
    }
}

/// Build the schema with the forum service as shared data.
pub fn build_schema(forum: Forum, config: &SchemaConfig) -> ForumSchema {
    let mut schema = Schema::build(Query, Mutation, EmptySubscription).data(forum);

    if let Some(depth) = config.max_query_depth {
        schema = schema.limit_depth(depth);
    }

    if !config.enable_introspection {
        schema = schema.disable_introspection();
    }

    schema.finish()
}

/// GraphQL handler for Axum. The caller identity comes from the
/// identity middleware and is scoped to this one request.
pub async fn graphql_handler(
    State(schema): State<ForumSchema>,
    Extension(caller): Extension<Caller>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner().data(caller)).await.into()
}

/// GraphQL playground handler
pub async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new(GRAPHQL_PATH)))
}
