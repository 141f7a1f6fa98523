pub mod article;
pub mod config;
pub mod source;
pub mod topic;
