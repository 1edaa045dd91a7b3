use chrono::{DateTime, Local};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;

use crate::domain::{DirectoryEntry, SortField, SortSpec};
use crate::services::listing::format_size;

/// Characters escaped inside a URL path; `/` is kept as the separator. The
/// result needs no further HTML escaping inside a quoted attribute.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A single path segment, so `/` inside a name is escaped too.
const SEGMENT: &AsciiSet = &PATH.add(b'/');

const TIME_FORMAT: &str = "%Y.%-m.%-d %H:%M:%S";

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

fn parent_url(base_path: &str) -> String {
    let trimmed = base_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => "/".to_string(),
    }
}

/// Serializable listing row for template rendering.
#[derive(Clone, Debug, Serialize)]
pub struct EntryRowDto {
    /// Display name; directories carry a trailing slash.
    pub name: String,
    /// Absolute, percent-encoded link to the entry.
    pub href: String,
    pub is_directory: bool,
    pub size: String,
    pub modified: String,
}

impl EntryRowDto {
    pub fn from_entry(entry: DirectoryEntry, base_path: &str) -> Self {
        let suffix = if entry.is_directory { "/" } else { "" };
        let href = format!(
            "{}{}{}",
            encode_path(base_path),
            utf8_percent_encode(&entry.name, SEGMENT),
            suffix
        );
        let size = if entry.is_directory {
            "-".to_string()
        } else {
            format_size(entry.size_bytes)
        };
        let modified = DateTime::<Local>::from(entry.last_modified)
            .format(TIME_FORMAT)
            .to_string();

        Self {
            name: format!("{}{}", entry.name, suffix),
            href,
            is_directory: entry.is_directory,
            size,
            modified,
        }
    }
}

/// Clickable column header.
#[derive(Clone, Debug, Serialize)]
pub struct SortHeaderDto {
    pub label: &'static str,
    pub href: String,
    pub arrow: Option<&'static str>,
}

impl SortHeaderDto {
    fn label_for(field: SortField) -> &'static str {
        match field {
            SortField::Name => "文件名",
            SortField::Size => "大小",
            SortField::Date => "更新日期",
        }
    }

    pub fn for_spec(spec: SortSpec) -> Vec<Self> {
        SortField::ALL
            .into_iter()
            .map(|field| Self {
                label: Self::label_for(field),
                href: spec.toggle(field).to_query(),
                arrow: (spec.field == field).then(|| spec.order.arrow()),
            })
            .collect()
    }
}

/// Everything the listing template needs.
#[derive(Clone, Debug, Serialize)]
pub struct ListingPageDto {
    pub site_name: String,
    pub request_path: String,
    /// Percent-encoded, so it can sit inside a CSS `url("...")` unescaped.
    pub background_image: Option<String>,
    pub headers: Vec<SortHeaderDto>,
    pub parent_href: Option<String>,
    pub entries: Vec<EntryRowDto>,
}

impl ListingPageDto {
    /// `entries` must already be sorted. `base_path` is the URL of the listed
    /// directory with a trailing slash.
    pub fn new(
        site_name: &str,
        background_image: Option<&str>,
        request_path: &str,
        base_path: &str,
        is_root: bool,
        entries: Vec<DirectoryEntry>,
        spec: SortSpec,
    ) -> Self {
        Self {
            site_name: site_name.to_string(),
            request_path: request_path.to_string(),
            background_image: background_image.map(encode_path),
            headers: SortHeaderDto::for_spec(spec),
            parent_href: (!is_root).then(|| encode_path(&parent_url(base_path))),
            entries: entries
                .into_iter()
                .map(|entry| EntryRowDto::from_entry(entry, base_path))
                .collect(),
        }
    }
}
