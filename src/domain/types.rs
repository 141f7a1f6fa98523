//! Validated identifiers for stored records.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{kind} id must be positive, got {value}")]
    NonPositiveId { kind: &'static str, value: i32 },
}

macro_rules! id_type {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i32);

        impl $name {
            pub fn new(value: i32) -> Result<Self, TypeError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeError::NonPositiveId { kind: $kind, value })
                }
            }

            pub fn get(self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ArticleId, "article");
id_type!(SourceId, "source");
id_type!(TopicId, "topic");
