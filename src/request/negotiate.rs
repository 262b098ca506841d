use std::cmp::Ordering;

/// Parse a quality-valued header such as `Accept-Language` into
/// `(token, quality)` pairs, most preferred first.
///
/// Tokens are lower-cased and stripped of parameters. A missing `q` means
/// `1.0`; ties keep their header order. A header with an unparseable `q`
/// yields nothing.
pub(crate) fn quality_list(header: Option<&str>) -> Vec<(String, f32)> {
    let header = match header {
        Some(header) => header,
        None => return Vec::new(),
    };

    let mut items = Vec::new();
    for item in header.split(',') {
        let mut params = item.split(';');
        let token = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if token.is_empty() {
            continue;
        }

        let mut quality = 1.0;
        for param in params {
            let (key, value) = match param.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            if !key.trim().eq_ignore_ascii_case("q") {
                continue;
            }
            match value.trim().parse::<f32>() {
                Ok(q) if q.is_finite() => quality = q,
                _ => return Vec::new(),
            }
        }

        items.push((token, quality));
    }

    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    items
}
