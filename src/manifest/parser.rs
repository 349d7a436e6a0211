//! Streaming Metalink 4 parser.
//!
//! Walks the document with a namespace-aware `quick-xml` reader. Only
//! elements bound to the Metalink 4 namespace are recognized, and only the
//! direct children of a `file` element contribute to its [`FetchItem`]:
//! `url`, `hash` and `size`. Everything else (`pieces`, `metaurl`,
//! `publisher`, foreign extensions, ...) is skipped.

use crate::download::{FetchItem, Sha256Digest};
use crate::error::ManifestError;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use reqwest::Url;
use std::collections::HashSet;
use tracing::debug;

/// XML namespace of Metalink 4 documents (RFC 5854).
pub const METALINK_NS: &str = "urn:ietf:params:xml:ns:metalink";

/// The `file` child currently collecting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Hash(HashKind),
    Size,
}

/// How a `hash` element declares its algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashKind {
    Sha256,
    Untyped,
    Other,
}

impl HashKind {
    fn from_type(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => HashKind::Untyped,
            Some(v) if v == "sha256" || v == "sha-256" => HashKind::Sha256,
            Some(_) => HashKind::Other,
        }
    }
}

/// A `file` element being assembled.
#[derive(Debug)]
struct FileEntry {
    name: String,
    urls: Vec<String>,
    sha256: Option<String>,
    untyped: Option<String>,
    size: Option<String>,
}

impl FileEntry {
    fn open(start: &BytesStart<'_>, index: usize) -> Result<Self, ManifestError> {
        let name = attribute(start, "name")?.ok_or(ManifestError::MissingName { index })?;

        Ok(Self {
            name,
            urls: Vec::new(),
            sha256: None,
            untyped: None,
            size: None,
        })
    }

    fn accept(&mut self, field: Field, text: &str) {
        let text = text.trim();
        match field {
            Field::Url => self.urls.push(text.to_string()),
            Field::Hash(HashKind::Sha256) if self.sha256.is_none() => {
                self.sha256 = Some(text.to_string())
            }
            Field::Hash(HashKind::Untyped) if self.untyped.is_none() => {
                self.untyped = Some(text.to_string())
            }
            Field::Hash(_) => {}
            Field::Size => self.size = Some(text.to_string()),
        }
    }

    fn finish(self) -> Result<FetchItem, ManifestError> {
        let mut mirrors = Vec::with_capacity(self.urls.len());
        for url in self.urls {
            let parsed = Url::parse(&url).map_err(|e| ManifestError::InvalidUrl {
                name: self.name.clone(),
                url: url.clone(),
                reason: e.to_string(),
            })?;
            mirrors.push(parsed);
        }

        let checksum = match self.sha256.or(self.untyped) {
            Some(digest) => Some(digest.parse::<Sha256Digest>().map_err(|_| {
                ManifestError::InvalidDigest {
                    name: self.name.clone(),
                    digest,
                }
            })?),
            None => None,
        };

        let size = match self.size {
            Some(size) => Some(size.parse::<u64>().map_err(|_| ManifestError::InvalidSize {
                name: self.name.clone(),
                size,
            })?),
            None => None,
        };

        Ok(FetchItem::new(&self.name, mirrors)?
            .with_checksum(checksum)
            .with_size(size))
    }
}

/// Read an unescaped attribute value.
fn attribute(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, ManifestError> {
    match start
        .try_get_attribute(key)
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

fn field_of(start: &BytesStart<'_>) -> Result<Option<Field>, ManifestError> {
    let field = match start.local_name().as_ref() {
        b"url" => Some(Field::Url),
        b"size" => Some(Field::Size),
        b"hash" => {
            let kind = attribute(start, "type")?;
            Some(Field::Hash(HashKind::from_type(kind.as_deref())))
        }
        _ => None,
    };
    Ok(field)
}

/// Parse a Metalink 4 document into its items, in document order.
pub fn parse_str(text: &str) -> Result<Vec<FetchItem>, ManifestError> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut names = HashSet::new();
    let mut seen_root = false;
    let mut file_index = 0usize;

    // The `file` being assembled, and how deep below it the reader is.
    let mut entry: Option<FileEntry> = None;
    let mut depth = 0usize;
    let mut field: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let in_metalink = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == METALINK_NS.as_bytes());

        match event {
            Event::Start(start) => {
                if !seen_root {
                    if !(in_metalink && start.local_name().as_ref() == b"metalink") {
                        return Err(ManifestError::NotMetalink);
                    }
                    seen_root = true;
                    continue;
                }

                match entry.as_mut() {
                    Some(_) => {
                        depth += 1;
                        if depth == 1 && in_metalink {
                            field = field_of(&start)?;
                            text_buf.clear();
                        }
                    }
                    None if in_metalink && start.local_name().as_ref() == b"file" => {
                        file_index += 1;
                        entry = Some(FileEntry::open(&start, file_index)?);
                        depth = 0;
                    }
                    None => {}
                }
            }
            Event::Empty(start) => {
                if !seen_root {
                    if !(in_metalink && start.local_name().as_ref() == b"metalink") {
                        return Err(ManifestError::NotMetalink);
                    }
                    seen_root = true;
                    continue;
                }

                // `<file name="x"/>` can only be an entry without mirrors.
                if entry.is_none() && in_metalink && start.local_name().as_ref() == b"file" {
                    file_index += 1;
                    let empty = FileEntry::open(&start, file_index)?;
                    return Err(ManifestError::NoMirrors { name: empty.name });
                }
            }
            Event::Text(text) => {
                if field.is_some() {
                    text_buf.push_str(&text.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(data) => {
                if field.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let Some(current) = entry.as_mut() else {
                    continue;
                };

                if depth == 0 {
                    if let Some(finished) = entry.take() {
                        let item = finished.finish()?;
                        if !names.insert(item.name().to_string()) {
                            return Err(ManifestError::DuplicateName {
                                name: item.name().to_string(),
                            });
                        }
                        debug!(
                            "Parsed {} ({} mirror(s), checksum: {})",
                            item.name(),
                            item.mirrors().len(),
                            item.checksum().is_some()
                        );
                        items.push(item);
                    }
                } else {
                    if depth == 1 {
                        if let Some(done) = field.take() {
                            current.accept(done, &text_buf);
                        }
                    }
                    depth -= 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(ManifestError::NotMetalink);
    }

    Ok(items)
}
