//! Domain types shared by the processing pipeline and the repository layer.

pub mod article;
pub mod entry;
pub mod source;
pub mod topic;
pub mod types;
