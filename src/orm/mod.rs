//! SeaORM entity definitions.

pub mod call_requests;
pub mod founder_documents;
pub mod notifications;
pub mod products;
pub mod queries;
pub mod query_topics;
pub mod sessions;
pub mod users;
