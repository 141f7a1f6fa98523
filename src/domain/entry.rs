//! Raw feed entries as delivered by the fetcher.
//!
//! Every field is optional: RSS and Atom publishers disagree about which
//! fields they fill, and the normalizer resolves each logical field through
//! its own fallback chain.

/// A `media:content` or `media:thumbnail` reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRef {
    pub url: Option<String>,
    pub mime_type: Option<String>,
}

/// An enclosure or link carrying a declared MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedLink {
    pub href: String,
    pub mime_type: Option<String>,
}

impl TypedLink {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.trim().to_ascii_lowercase().starts_with("image/"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub link: Option<String>,
    pub title: Option<String>,
    /// Rich content (`content:encoded`, Atom `content`).
    pub content: Option<String>,
    /// Atom `summary`.
    pub summary: Option<String>,
    /// RSS `description`.
    pub description: Option<String>,
    pub media_content: Vec<MediaRef>,
    pub media_thumbnail: Vec<MediaRef>,
    pub enclosures: Vec<TypedLink>,
    pub links: Vec<TypedLink>,
    pub published: Option<String>,
    pub updated: Option<String>,
}
