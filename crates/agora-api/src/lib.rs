//! GraphQL API for the agora forum: identity handling, the data access
//! service and the async-graphql resolvers on top of it.

pub mod error;
pub mod forum;
pub mod identity;
pub mod resolvers;
pub mod schema;

pub use error::{Entity, ForumError};
pub use forum::{Forum, PAGE_SIZE, Timeouts};
pub use identity::{Caller, authorize};
pub use schema::{ForumSchema, SchemaConfig, build_schema};
