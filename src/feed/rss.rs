use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

use super::FeedItem;
use crate::util::http_date;

/// Title used for items whose extracted title is empty.
pub const UNTITLED_ITEM: &str = "(no title)";

#[derive(Debug, Error)]
pub enum RssError {
    #[error("Failed to write RSS document: {0}")]
    Write(String),

    #[error("Generated RSS contains invalid UTF-8")]
    InvalidUtf8,
}

type RssWriter = Writer<Cursor<Vec<u8>>>;

/// Renders a channel and its items as an RSS 2.0 document.
///
/// Title and link text are XML-escaped. Item descriptions are trusted
/// HTML and go into CDATA sections untouched, so the markup survives for
/// feed readers to render.
///
/// Per item:
/// - `<title>` is always present, `(no title)` when empty
/// - `<link>` and a permalink `<guid>` only when the item has a non-empty link
/// - `<description>` only when the description is non-empty
///
/// Each element is written on its own line.
pub fn render_rss(title: &str, link: &str, items: &[FeedItem]) -> Result<String, RssError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    newline(&mut writer)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    write(&mut writer, Event::Start(rss))?;
    write(&mut writer, Event::Start(BytesStart::new("channel")))?;
    newline(&mut writer)?;

    text_element(&mut writer, "title", title)?;
    text_element(&mut writer, "link", link)?;
    text_element(
        &mut writer,
        "description",
        &format!("Generated feed for {link}"),
    )?;
    text_element(&mut writer, "lastBuildDate", &http_date(None))?;

    for item in items {
        write_item(&mut writer, item)?;
    }

    write(&mut writer, Event::End(BytesEnd::new("channel")))?;
    write(&mut writer, Event::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|_| RssError::InvalidUtf8)
}

fn write_item(writer: &mut RssWriter, item: &FeedItem) -> Result<(), RssError> {
    write(writer, Event::Start(BytesStart::new("item")))?;
    newline(writer)?;

    let title = if item.title.is_empty() {
        UNTITLED_ITEM
    } else {
        item.title.as_str()
    };
    text_element(writer, "title", title)?;

    if let Some(link) = item.link.as_deref().filter(|l| !l.is_empty()) {
        text_element(writer, "link", link)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        write(writer, Event::Start(guid))?;
        write(writer, Event::Text(BytesText::new(link)))?;
        write(writer, Event::End(BytesEnd::new("guid")))?;
        newline(writer)?;
    }

    if !item.description.is_empty() {
        write(writer, Event::Start(BytesStart::new("description")))?;
        for section in cdata_sections(&item.description) {
            write(writer, Event::CData(BytesCData::new(section)))?;
        }
        write(writer, Event::End(BytesEnd::new("description")))?;
        newline(writer)?;
    }

    write(writer, Event::End(BytesEnd::new("item")))?;
    newline(writer)
}

/// Splits `content` so that no piece contains the CDATA terminator `]]>`.
///
/// Concatenating the pieces yields `content` again.
fn cdata_sections(content: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = content;
    while let Some(pos) = rest.find("]]>") {
        // Keep "]]" in this section and start the next one at ">"
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

fn text_element(writer: &mut RssWriter, name: &str, text: &str) -> Result<(), RssError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))?;
    newline(writer)
}

fn newline(writer: &mut RssWriter) -> Result<(), RssError> {
    write(writer, Event::Text(BytesText::new("\n")))
}

fn write(writer: &mut RssWriter, event: Event<'_>) -> Result<(), RssError> {
    writer
        .write_event(event)
        .map_err(|e| RssError::Write(e.to_string()))
}
