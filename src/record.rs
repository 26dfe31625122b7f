//! Vendor records and the registry text formats they are parsed from.
//!
//! The registry publishes each assignment as a block of text:
//!
//! ```text
//! 00-03-93   (hex)        Apple Computer, Inc.
//! 000393     (base 16)    Apple Computer, Inc.
//!                         20650 Valley Green Dr.
//!                         Cupertino CA 95014
//!                         UNITED STATES
//! ```
//!
//! The full dump concatenates thousands of these blocks; the single-OUI
//! search endpoint wraps one of them in an HTML page. [`parse_oui`] turns a
//! block into a [`VendorRecord`], [`split_records`] cuts a dump into blocks,
//! and [`extract_oui_from_html`] recovers a block from a search page.

use crate::oui::{OuiKey, normalize};
use serde::{Deserialize, Serialize};

/// Marker that follows the OUI on the first line of every record block.
const HEX_MARKER: &str = "(hex)";

/// Longest entity name accepted by the entity decoder, e.g. `#x00A0`.
const MAX_ENTITY_LEN: usize = 8;

/// An organization name followed by its postal address lines.
///
/// An empty record means "no data" and is distinct from a lookup miss,
/// which callers see as `None` or an error.
///
/// # Examples
///
/// ```
/// use macvendor::record::VendorRecord;
///
/// let record = VendorRecord::from(vec!["Acme".to_owned(), "1 Road".to_owned()]);
/// assert_eq!(record.organization(), Some("Acme"));
/// assert_eq!(record.address_lines(), ["1 Road".to_owned()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorRecord(Vec<String>);

impl VendorRecord {
    /// The organization name, if the record has any lines.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Address lines following the organization name.
    #[must_use]
    pub fn address_lines(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// All lines, organization first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Number of lines in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the record carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for VendorRecord {
    fn from(lines: Vec<String>) -> Self {
        Self(lines)
    }
}

/// Parse one registry record block into a [`VendorRecord`].
///
/// The first line (the `(hex)` header) is discarded. The second line has
/// its base-16 OUI and notation label stripped and becomes the organization
/// name; the remaining lines are kept in order with leading whitespace and
/// any carriage return removed. Blank lines are ignored and empty input
/// yields an empty record.
///
/// # Examples
///
/// ```
/// use macvendor::record::parse_oui;
///
/// let block = "00-03-93   (hex)        Apple Computer, Inc.\n\
///              000393     (base 16)    Apple Computer, Inc.\n\
///                                      Cupertino CA 95014\n";
/// let record = parse_oui(block);
/// assert_eq!(record.lines(), ["Apple Computer, Inc.", "Cupertino CA 95014"]);
/// assert!(parse_oui("").is_empty());
/// ```
#[must_use]
pub fn parse_oui(text: &str) -> VendorRecord {
    let mut lines = text
        .lines()
        .map(|line| line.trim_start().trim_end_matches('\r'))
        .filter(|line| !line.trim_end().is_empty());
    let Some(header) = lines.next() else {
        return VendorRecord::default();
    };

    let name = lines
        .next()
        .map(strip_notation)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| strip_notation(header));

    let mut record = Vec::new();
    if !name.is_empty() {
        record.push(name.to_owned());
    }
    record.extend(lines.map(str::to_owned));
    VendorRecord(record)
}

/// Strip the leading OUI token and any parenthesised notation label.
fn strip_notation(line: &str) -> &str {
    let Some((_, after_oui)) = line.split_once(char::is_whitespace) else {
        return "";
    };
    let rest = after_oui.trim_start();
    match rest.strip_prefix('(').and_then(|label| label.split_once(')')) {
        Some((_, name)) => name.trim(),
        None => rest,
    }
}

/// Return the key of a record header line (`00-03-93   (hex)   ...`).
fn header_key(line: &str) -> Option<OuiKey> {
    let trimmed = line.trim_start();
    let (token, rest) = trimmed.split_once(char::is_whitespace)?;
    if !rest.trim_start().starts_with(HEX_MARKER) {
        return None;
    }
    let well_formed = token.len() == 8
        && token
            .split('-')
            .all(|byte| byte.len() == 2 && byte.chars().all(|c| c.is_ascii_hexdigit()));
    if !well_formed {
        return None;
    }
    normalize(token).ok()
}

/// Split a registry dump into `(key, block)` pairs.
///
/// A block starts at every `XX-XX-XX (hex)` header line and runs until the
/// next header. Preamble lines before the first header are ignored.
///
/// # Examples
///
/// ```
/// use macvendor::record::split_records;
///
/// let dump = "OUI/MA-L\n\n00-00-01   (hex)\t\tXEROX\n\n00-00-02   (hex)\t\tBBN\n";
/// let blocks = split_records(dump);
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[1].0.as_str(), "00-00-02");
/// ```
#[must_use]
pub fn split_records(text: &str) -> Vec<(OuiKey, String)> {
    let mut blocks = Vec::new();
    let mut current: Option<(OuiKey, String)> = None;

    for line in text.lines() {
        if let Some(key) = header_key(line) {
            blocks.extend(current.take());
            current = Some((key, String::new()));
        }
        if let Some((_, block)) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks.extend(current);
    blocks
}

/// Find the record block for `key` in a registry dump.
#[must_use]
pub fn find_record(text: &str, key: &OuiKey) -> Option<String> {
    split_records(text)
        .into_iter()
        .find(|(candidate, _)| candidate == key)
        .map(|(_, block)| block)
}

/// Recover the plain-text record for `oui` from a registry search page.
///
/// The record is located structurally inside a `<pre>` element; inner
/// markup is removed and character entities are decoded. Returns `None`
/// rather than partial text when no `<pre>` element holds a record whose
/// first line names `oui`.
///
/// # Examples
///
/// ```
/// use macvendor::oui::normalize;
/// use macvendor::record::extract_oui_from_html;
///
/// let key = normalize("00-03-93").unwrap();
/// let page = "<html><pre class=\"r\">\n<b>00-03-93</b>   (hex)  Apple\n</pre></html>";
/// let text = extract_oui_from_html(page, &key).unwrap();
/// assert!(text.starts_with("00-03-93"));
/// assert_eq!(extract_oui_from_html("<html></html>", &key), None);
/// ```
#[must_use]
pub fn extract_oui_from_html(html: &str, oui: &OuiKey) -> Option<String> {
    let compact = oui.compact();
    pre_blocks(html)
        .into_iter()
        .map(|fragment| clean_fragment(&fragment))
        .find(|text| names_oui(text, oui.as_str(), &compact))
}

/// Return the raw contents of every `<pre>` element in document order.
fn pre_blocks(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(open) = lower.get(cursor..).and_then(|rest| rest.find("<pre")) {
        let tag_start = cursor + open;
        let after_name = tag_start + "<pre".len();
        let is_pre = lower
            .get(after_name..)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c == '>' || c.is_whitespace());
        let Some(tag_end) = lower.get(after_name..).and_then(|rest| rest.find('>')) else {
            break;
        };
        let content_start = after_name + tag_end + 1;
        if !is_pre {
            cursor = content_start;
            continue;
        }
        let Some(close) = lower
            .get(content_start..)
            .and_then(|rest| rest.find("</pre"))
        else {
            break;
        };
        if let Some(content) = html.get(content_start..content_start + close) {
            blocks.push(content.to_owned());
        }
        cursor = content_start + close;
    }

    blocks
}

/// Strip markup, decode entities, and trim surrounding blank lines.
fn clean_fragment(fragment: &str) -> String {
    let decoded = decode_entities(&strip_tags(fragment));
    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match (first, last) {
        (Some(start), Some(end)) => lines.get(start..=end).unwrap_or_default().join("\n"),
        _ => String::new(),
    }
}

/// Returns true when the first non-blank line of `text` starts with `key`,
/// in either the dashed or the base-16 notation.
#[must_use]
pub fn block_names_oui(text: &str, key: &OuiKey) -> bool {
    names_oui(text.trim_start(), key.as_str(), &key.compact())
}

/// Returns true when the first line of `text` names the OUI.
fn names_oui(text: &str, dashed: &str, compact: &str) -> bool {
    text.lines().next().is_some_and(|line| {
        let token = line.split_whitespace().next().unwrap_or_default();
        token.eq_ignore_ascii_case(dashed) || token.eq_ignore_ascii_case(compact)
    })
}

/// Remove every `<...>` tag from an HTML fragment.
fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Decode named and numeric character entities.
fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        let (before, tail) = rest.split_at(amp);
        decoded.push_str(before);
        let entity = tail
            .find(';')
            .filter(|end| *end <= MAX_ENTITY_LEN + 1)
            .and_then(|end| Some((decode_entity(tail.get(1..end)?)?, end)));
        match entity {
            Some((c, end)) => {
                decoded.push(c);
                rest = tail.get(end + 1..).unwrap_or_default();
            }
            None => {
                decoded.push('&');
                rest = tail.get(1..).unwrap_or_default();
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

/// Decode one entity name (without `&` and `;`).
fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
