use super::{decode, Body, Charset};
use crate::http::Headers;
use crate::wire::{Inbound, Receive};
use crate::{Config, Failure};

use bytes::{Bytes, BytesMut};

/// What a request body was classified as.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Format {
    Multipart,
    Form,
    Text,
    Html,
    Javascript,
    Json,
    Xml,
}

/// Classification table, matched in order.
const REGISTRY: [(&str, Format); 7] = [
    ("multipart/form-data", Format::Multipart),
    ("application/x-www-form-urlencoded", Format::Form),
    ("text/plain", Format::Text),
    ("text/html", Format::Html),
    ("application/javascript", Format::Javascript),
    ("application/json", Format::Json),
    ("application/xml", Format::Xml),
];

impl Format {
    /// Url-encoded and multipart bodies both decode to a form mapping.
    pub fn is_form(self) -> bool {
        matches!(self, Format::Multipart | Format::Form)
    }
}

/// A materialized body together with its classification.
#[derive(Debug)]
pub struct Payload {
    pub format: Option<Format>,
    /// The resolved charset label: the `charset=` parameter of `Content-Type`,
    /// else the configured default.
    pub charset: String,
    pub body: Result<Body, Failure>,
}

/// Classify a request by its `Content-Type`, falling back to the entries of
/// `Accept`. The first table entry that matches either header wins.
pub fn classify(headers: &Headers) -> Option<Format> {
    let content_type = headers.get("Content-Type").map(str::to_ascii_lowercase);
    let accept: Vec<String> = headers
        .get("Accept")
        .map(|accept| {
            accept
                .split(',')
                .map(|item| {
                    item.split(';')
                        .next()
                        .unwrap_or_default()
                        .trim()
                        .to_ascii_lowercase()
                })
                .collect()
        })
        .unwrap_or_default();

    if content_type.is_none() && accept.is_empty() {
        return None;
    }

    REGISTRY.iter().find_map(|&(mime, format)| {
        let by_content_type = content_type
            .as_deref()
            .map_or(false, |content_type| content_type.contains(mime));
        let by_accept = accept.iter().any(|item| item == mime);
        (by_content_type || by_accept).then_some(format)
    })
}

/// Drain the body from `receive` and decode it according to the request's
/// classification.
///
/// Decoder failures are captured in the returned payload. Only the channel
/// itself can end assembly early: a disconnect or a closed channel ends it with
/// whatever was received so far.
pub async fn materialize<R>(headers: &Headers, receive: &mut R, config: &Config) -> Payload
where
    R: Receive + ?Sized,
{
    let format = classify(headers);
    let charset = content_charset(headers.get("Content-Type"))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| config.default_charset.to_ascii_lowercase());
    let body = match assemble(receive, config.body_limit).await {
        Ok(buf) => decode_body(format, buf, &charset, headers, config),
        Err(err) => Err(err),
    };

    if let Err(err) = &body {
        tracing::warn!(?format, error = %err, "failed to materialize request body");
    }

    Payload {
        format,
        charset,
        body,
    }
}

async fn assemble<R>(receive: &mut R, limit: usize) -> Result<Bytes, Failure>
where
    R: Receive + ?Sized,
{
    let mut buf = BytesMut::new();

    while let Some(message) = receive.receive().await {
        match message {
            Inbound::Request { body, more_body } => {
                if buf.len() + body.len() > limit {
                    return Err(Failure::PayloadTooLarge {
                        size: buf.len() + body.len(),
                        limit,
                    });
                }
                buf.extend_from_slice(&body);
                if !more_body {
                    break;
                }
            }
            Inbound::Disconnect => {
                tracing::debug!(received = buf.len(), "client disconnected during body");
                break;
            }
            message => {
                tracing::debug!(kind = message.kind(), "ignoring message during body assembly");
            }
        }
    }

    Ok(buf.freeze())
}

fn decode_body(
    format: Option<Format>,
    buf: Bytes,
    charset: &str,
    headers: &Headers,
    config: &Config,
) -> Result<Body, Failure> {
    match format {
        Some(Format::Json) => decode::json(&buf, charset),
        Some(Format::Form) => decode::form(&buf, Charset::from_label(charset)?),
        Some(Format::Multipart) => decode::multipart(
            &buf,
            headers.get("Content-Type").unwrap_or_default(),
            Charset::from_label(charset)?,
            config,
        ),
        _ => decode::raw(buf, config),
    }
}

/// The `charset=` parameter of a content type.
pub(crate) fn content_charset(content_type: Option<&str>) -> Option<&str> {
    content_type?.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().copied().collect()
    }

    #[test]
    fn content_type_wins_in_table_order() {
        let h = headers(&[("Content-Type", "multipart/form-data; boundary=x")]);
        assert_eq!(classify(&h), Some(Format::Multipart));

        let h = headers(&[("Content-Type", "application/json; charset=utf-8")]);
        assert_eq!(classify(&h), Some(Format::Json));
    }

    #[test]
    fn accept_fallback() {
        let h = headers(&[("Accept", "application/xml, application/json;q=0.9")]);
        assert_eq!(classify(&h), Some(Format::Json));

        let h = headers(&[("Accept", "*/*")]);
        assert_eq!(classify(&h), None);
    }

    #[test]
    fn unclassified_without_headers() {
        assert_eq!(classify(&Headers::new()), None);
    }

    #[test]
    fn charset_param() {
        assert_eq!(content_charset(Some("text/plain; charset=\"latin1\"")), Some("latin1"));
        assert_eq!(content_charset(Some("text/plain")), None);
        assert_eq!(content_charset(None), None);
    }
}
