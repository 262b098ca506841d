use super::part::{find, BodyPart};
use super::{sniff, Body, Charset, FieldStorage, FileStorage, FormData, FormValue};
use crate::{Config, Failure};

use bytes::Bytes;
use mime::Mime;
use serde_json::{Map, Value};

/// An empty buffer is an empty object whatever the charset label says.
pub(crate) fn json(buf: &Bytes, charset: &str) -> Result<Body, Failure> {
    if buf.is_empty() {
        return Ok(Body::Json(Value::Object(Map::new())));
    }

    let text = Charset::from_label(charset)?.decode(buf)?;
    serde_json::from_str(&text)
        .map(Body::Json)
        .map_err(|err| Failure::decode("JSON decode error", err))
}

pub(crate) fn form(buf: &Bytes, charset: Charset) -> Result<Body, Failure> {
    let text = charset.decode(buf)?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&text)
        .map_err(|err| Failure::decode("form decode error", err))?;

    let mut data = FormData::new();
    for (name, value) in pairs {
        let field = FieldStorage::new(name.clone(), value);
        data.append(name, FormValue::Field(field));
    }
    Ok(Body::Form(data))
}

pub(crate) fn multipart(
    buf: &Bytes,
    content_type: &str,
    charset: Charset,
    config: &Config,
) -> Result<Body, Failure> {
    let boundary = boundary(content_type)
        .ok_or_else(|| Failure::UnsupportedContentType(content_type.to_owned()))?;

    let mut data = FormData::new();
    for segment in segments(buf, &boundary)? {
        let part = BodyPart::parse(segment, charset)?;
        let name = part
            .name()
            .ok_or_else(|| Failure::MalformedBodyPart("part has no name".to_owned()))?
            .to_owned();

        let value = match part.filename() {
            Some(filename) => FormValue::File(FileStorage::new(
                Some(name.clone()),
                part.content(),
                Some(filename.to_owned()),
                part.content_type(),
                config.temp_dir.as_deref(),
            )?),
            None => FormValue::Field(FieldStorage::new(name.clone(), part.text()?)),
        };

        data.append(name, value);
    }

    Ok(Body::Form(data))
}

pub(crate) fn raw(buf: Bytes, config: &Config) -> Result<Body, Failure> {
    if buf.is_empty() {
        return Ok(Body::Raw(buf));
    }

    let mime_type = sniff::sniff(&buf);
    if sniff::is_textual(&mime_type) {
        return Ok(Body::Raw(buf));
    }

    let file = FileStorage::new(None, &buf, None, Some(mime_type), config.temp_dir.as_deref())?;
    Ok(Body::File(file))
}

/// The `boundary` parameter of a multipart content type.
pub(crate) fn boundary(content_type: &str) -> Option<String> {
    let mime: Mime = content_type.trim().parse().ok()?;
    let boundary = mime.get_param(mime::BOUNDARY)?;
    let boundary = boundary.as_str().trim_matches('"');
    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_owned())
    }
}

/// Split a multipart body on its delimiter lines, dropping the preamble,
/// the epilogue and the line breaks that frame each segment.
///
/// Only the first delimiter may open the buffer; every later one must start
/// a line. An empty buffer is an empty form.
fn segments(buf: &Bytes, boundary: &str) -> Result<Vec<Bytes>, Failure> {
    let mut segments = Vec::new();
    if buf.is_empty() {
        return Ok(segments);
    }

    let delimiter = format!("--{}", boundary);
    let line = format!("\r\n{}", delimiter);

    let first = if buf.starts_with(delimiter.as_bytes()) {
        0
    } else {
        find(buf, line.as_bytes()).map(|at| at + 2).ok_or_else(|| {
            Failure::UnsupportedContentType(format!(
                "multipart body without a `{}` delimiter",
                delimiter
            ))
        })?
    };

    let mut start = first + delimiter.len();
    loop {
        let rest = &buf[start..];
        if rest.starts_with(b"--") {
            return Ok(segments);
        }

        let end = find(rest, line.as_bytes())
            .map(|at| start + at)
            .ok_or_else(|| Failure::MalformedBodyPart("missing closing delimiter".to_owned()))?;

        let mut segment = buf.slice(start..end);
        if segment.starts_with(b"\r\n") {
            segment = segment.slice(2..);
        }
        segments.push(segment);

        start = end + line.len();
    }
}
