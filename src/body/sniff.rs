use mime::Mime;

/// Leading byte signatures of common binary formats.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"\0asm", "application/wasm"),
    (b"\x7fELF", "application/x-executable"),
];

/// MIME types whose content stays an in-memory buffer.
const TEXTUAL: &[&str] = &[
    "text/html",
    "text/plain",
    "text/calendar",
    "application/xml",
    "application/json",
    "application/ld+json",
    "text/javascript",
];

/// Guess the MIME type of `content` from its bytes.
pub fn sniff(content: &[u8]) -> Mime {
    if content.is_empty() {
        return parse("application/x-empty");
    }

    if let Some((_, ty)) = SIGNATURES.iter().find(|(sig, _)| content.starts_with(sig)) {
        return parse(ty);
    }

    if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        return parse("image/webp");
    }

    match std::str::from_utf8(content) {
        Ok(text) if !text.chars().any(is_binary_control) => sniff_text(text),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Whether a body of this type is kept as a raw buffer rather than a file.
pub fn is_textual(mime: &Mime) -> bool {
    TEXTUAL.contains(&mime.essence_str())
}

fn sniff_text(text: &str) -> Mime {
    let head = text.trim_start();
    let lower = head
        .get(..head.len().min(64))
        .unwrap_or(head)
        .to_ascii_lowercase();

    if lower.starts_with("<?xml") {
        parse("application/xml")
    } else if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        mime::TEXT_HTML
    } else if (head.starts_with('{') || head.starts_with('['))
        && serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
    {
        mime::APPLICATION_JSON
    } else {
        mime::TEXT_PLAIN
    }
}

fn is_binary_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0c')
}

fn parse(ty: &str) -> Mime {
    ty.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
