//! Mapping of RSS 2.0 items onto [`RawEntry`].

use ::rss::extension::Extension;
use ::rss::{Channel, Item};

use crate::domain::entry::{MediaRef, RawEntry, TypedLink};

const MEDIA_PREFIX: &str = "media";

pub fn channel_entries(channel: &Channel) -> Vec<RawEntry> {
    channel.items().iter().map(item_entry).collect()
}

pub fn item_entry(item: &Item) -> RawEntry {
    let (media_content, media_thumbnail) = media_refs(item);

    let enclosures = item
        .enclosure()
        .map(|enclosure| TypedLink {
            href: enclosure.url().to_string(),
            mime_type: non_blank(enclosure.mime_type()),
        })
        .into_iter()
        .collect();

    let updated = item
        .dublin_core_ext()
        .and_then(|dc| dc.dates().first())
        .map(ToString::to_string);

    // A permalink guid stands in for a missing <link>.
    let link = item
        .link()
        .or_else(|| {
            item.guid()
                .filter(|guid| guid.is_permalink())
                .map(|guid| guid.value())
        })
        .and_then(non_blank);

    RawEntry {
        link,
        title: item.title().map(ToString::to_string),
        content: item.content().map(ToString::to_string),
        summary: None,
        description: item.description().map(ToString::to_string),
        media_content,
        media_thumbnail,
        enclosures,
        links: Vec::new(),
        published: item.pub_date().map(ToString::to_string),
        updated,
    }
}

/// `media:content` and `media:thumbnail` references, including those nested
/// in `media:group`, in document order.
fn media_refs(item: &Item) -> (Vec<MediaRef>, Vec<MediaRef>) {
    let mut content = Vec::new();
    let mut thumbnails = Vec::new();

    if let Some(media) = item.extensions().get(MEDIA_PREFIX) {
        collect_media(media.get("content"), &mut content);
        collect_media(media.get("thumbnail"), &mut thumbnails);

        for group in media.get("group").into_iter().flatten() {
            collect_media(group.children().get("content"), &mut content);
            collect_media(group.children().get("thumbnail"), &mut thumbnails);
        }
    }

    (content, thumbnails)
}

fn collect_media(extensions: Option<&Vec<Extension>>, out: &mut Vec<MediaRef>) {
    for extension in extensions.into_iter().flatten() {
        let attrs = extension.attrs();
        out.push(MediaRef {
            url: attrs.get("url").and_then(|url| non_blank(url)),
            mime_type: attrs.get("type").and_then(|mime| non_blank(mime)),
        });
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
