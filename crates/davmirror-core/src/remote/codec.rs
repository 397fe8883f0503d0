//! PROPFIND multistatus parsing
//!
//! Turns a `207 Multi-Status` listing into a [`Snapshot`].
//!
//! ## Wire assumptions
//!
//! - Elements are matched by local name, so the `DAV:` prefix does not matter.
//! - The first `response` is the queried collection itself and is skipped
//!   by position. Yandex.Disk always lists the container first; a backend
//!   that does not must match the collection by `href` instead.
//! - An entry without `getcontentlength` is a folder.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use super::error::{RemoteError, RemoteResult};
use crate::models::{FileMetadata, Snapshot};

/// `getlastmodified` format, e.g. `Tue, 05 Mar 2024 10:15:00 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Properties collected for one `response` element
#[derive(Debug, Default)]
struct RawEntry {
    href: Option<String>,
    display_name: Option<String>,
    content_length: Option<String>,
    last_modified: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Href,
    DisplayName,
    ContentLength,
    LastModified,
}

impl RawEntry {
    fn push_text(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Href => &mut self.href,
            Field::DisplayName => &mut self.display_name,
            Field::ContentLength => &mut self.content_length,
            Field::LastModified => &mut self.last_modified,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.href.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Parse an HTTP date in the fixed `getlastmodified` format as UTC
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a multistatus body into a snapshot of the collection's files
pub fn parse(body: &str) -> RemoteResult<Snapshot> {
    let entries = read_entries(body)?;
    debug!(entries = entries.len(), "Parsed multistatus document");

    let mut snapshot = Snapshot::new();
    for entry in entries.into_iter().skip(1) {
        let Some(name) = entry.display_name.clone() else {
            warn!(entry = entry.label(), "Remote entry has no display name, skipping");
            continue;
        };

        let Some(length) = entry.content_length.as_deref() else {
            warn!(
                name = %name,
                "Remote entry is a folder; nested folders are not synchronized"
            );
            continue;
        };

        let Ok(size) = length.trim().parse::<u64>() else {
            warn!(name = %name, length, "Remote entry has an invalid content length, skipping");
            continue;
        };

        let Some(modified) = entry.last_modified.as_deref().and_then(parse_http_date) else {
            warn!(
                name = %name,
                last_modified = ?entry.last_modified,
                "Remote entry has no usable modification time, skipping"
            );
            continue;
        };

        debug!(name = %name, size, "Found remote file");
        snapshot.insert(name.clone(), FileMetadata::new(name, size, modified));
    }

    debug!(count = snapshot.len(), "Remote files found");
    Ok(snapshot)
}

fn read_entries(body: &str) -> RemoteResult<Vec<RawEntry>> {
    // Text is not trimmed; names may begin or end with spaces
    let mut reader = Reader::from_str(body);

    let mut saw_root = false;
    let mut depth = 0usize;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"multistatus" => saw_root = true,
                    b"response" => current = Some(RawEntry::default()),
                    b"href" => field = Some(Field::Href),
                    b"displayname" => field = Some(Field::DisplayName),
                    b"getcontentlength" => field = Some(Field::ContentLength),
                    b"getlastmodified" => field = Some(Field::LastModified),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"multistatus" => saw_root = true,
                b"response" => entries.push(RawEntry::default()),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    let text = t
                        .unescape()
                        .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
                    entry.push_text(f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    entry.push_text(f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"response" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    b"href" | b"displayname" | b"getcontentlength" | b"getlastmodified" => {
                        field = None
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(RemoteError::MalformedResponse(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !saw_root {
        return Err(RemoteError::MalformedResponse(
            "no multistatus element in response body".to_string(),
        ));
    }
    if depth != 0 {
        return Err(RemoteError::MalformedResponse(
            "response body ends inside an open element".to_string(),
        ));
    }

    Ok(entries)
}
