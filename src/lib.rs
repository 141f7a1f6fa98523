pub mod db;
pub mod domain;
pub mod feeds;
pub mod models;
pub mod processing;
pub mod repository;
pub mod schema;

/// Cosine-similarity threshold at which a new article is treated as a
/// duplicate of a stored one.
pub const DUPLICATE_THRESHOLD: f32 = 0.85;

/// Topics must score strictly above this similarity to be assigned.
pub const TOPIC_THRESHOLD: f32 = 0.3;

/// Maximum number of topics assigned to one article.
pub const MAX_TOPICS: usize = 2;
