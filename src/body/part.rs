use super::Charset;
use crate::Failure;

use std::borrow::Cow;

use bytes::Bytes;
use mime::Mime;

const SEPARATOR: &[u8] = b"\r\n\r\n";

/// One segment of a multipart body: its headers and a zero-copy slice of its
/// content.
#[derive(Debug)]
pub struct BodyPart {
    headers: Vec<(String, String)>,
    content: Bytes,
    name: Option<String>,
    filename: Option<String>,
    charset: Charset,
}

impl BodyPart {
    /// Split a segment at its first CRLFCRLF into headers and content.
    pub fn parse(segment: Bytes, charset: Charset) -> Result<BodyPart, Failure> {
        let split = find(&segment, SEPARATOR).ok_or_else(|| {
            Failure::MalformedBodyPart("content does not contain CR-LF-CR-LF".to_owned())
        })?;

        let head = trim_start(&segment[..split]);
        let headers = if head.is_empty() {
            Vec::new()
        } else {
            parse_headers(&charset.decode(head)?)
        };
        let content = segment.slice(split + SEPARATOR.len()..);

        let mut part = BodyPart {
            headers,
            content,
            name: None,
            filename: None,
            charset,
        };

        if let Some(disposition) = part.header("Content-Disposition") {
            let (name, filename) = disposition_params(disposition);
            part.name = name;
            part.filename = filename;
        }

        Ok(part)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The explicit `Content-Type` of this part, if it parses.
    pub fn content_type(&self) -> Option<Mime> {
        self.header("Content-Type")?.trim().parse().ok()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// The content decoded under the body's charset.
    pub fn text(&self) -> Result<Cow<'_, str>, Failure> {
        self.charset.decode(&self.content)
    }
}

/// Unfolds continuation lines and splits each header at its first colon.
fn parse_headers(head: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in head.split("\r\n").flat_map(|line| line.split('\n')) {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_owned(), value.trim().to_owned()));
        }
    }

    headers
}

/// `form-data; name="field"; filename="a.txt"` -> `(Some("field"), Some("a.txt"))`
fn disposition_params(disposition: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut filename = None;

    for param in disposition.split(';').skip(1) {
        if let Some((key, value)) = param.split_once('=') {
            let value = value.trim().trim_matches('"').to_owned();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => name = Some(value),
                "filename" => filename = Some(value),
                _ => {}
            }
        }
    }

    (name, filename)
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
