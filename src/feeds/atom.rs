//! Mapping of Atom entries onto [`RawEntry`].

use atom_syndication::{Entry, Feed, Link};

use crate::domain::entry::{MediaRef, RawEntry, TypedLink};

pub fn feed_entries(feed: &Feed) -> Vec<RawEntry> {
    feed.entries().iter().map(raw_entry).collect()
}

fn typed_link(link: &Link) -> TypedLink {
    TypedLink {
        href: link.href().to_string(),
        mime_type: link.mime_type().map(ToString::to_string),
    }
}

/// The first `alternate` link. A link without `rel` is parsed as alternate.
fn article_link(entry: &Entry) -> Option<String> {
    entry
        .links()
        .iter()
        .find(|link| link.rel() == "alternate")
        .map(|link| link.href().to_string())
}

fn media_refs(entry: &Entry, name: &str) -> Vec<MediaRef> {
    entry
        .extensions()
        .get("media")
        .and_then(|media| media.get(name))
        .into_iter()
        .flatten()
        .map(|extension| MediaRef {
            url: extension.attrs().get("url").cloned(),
            mime_type: extension.attrs().get("type").cloned(),
        })
        .collect()
}

pub fn raw_entry(entry: &Entry) -> RawEntry {
    let (enclosures, links): (Vec<&Link>, Vec<&Link>) = entry
        .links()
        .iter()
        .partition(|link| link.rel() == "enclosure");

    RawEntry {
        link: article_link(entry),
        title: Some(entry.title().as_str().to_string()),
        content: entry
            .content()
            .and_then(|content| content.value())
            .map(ToString::to_string),
        summary: entry.summary().map(|summary| summary.as_str().to_string()),
        description: None,
        media_content: media_refs(entry, "content"),
        media_thumbnail: media_refs(entry, "thumbnail"),
        enclosures: enclosures.into_iter().map(typed_link).collect(),
        links: links.into_iter().map(typed_link).collect(),
        published: entry.published().map(|date| date.to_rfc3339()),
        updated: Some(entry.updated().to_rfc3339()),
    }
}
