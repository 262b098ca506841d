/// The value(s) stored under one query key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum QueryValue {
    One(String),
    /// Every value, in arrival order, when a key occurs more than once.
    Many(Vec<String>),
}

impl QueryValue {
    pub fn first(&self) -> &str {
        match self {
            QueryValue::One(value) => value,
            QueryValue::Many(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn all(&self) -> Vec<&str> {
        match self {
            QueryValue::One(value) => vec![value.as_str()],
            QueryValue::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// A decoded query string. Keys keep the order of their first occurrence.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Query(Vec<(String, QueryValue)>);

impl Query {
    /// Decode a raw query string.
    pub fn parse(raw: &str) -> Query {
        Query::from_pairs(parse_pairs(raw))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Query {
        let mut entries: Vec<(String, QueryValue)> = Vec::new();

        for (key, value) in pairs {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, QueryValue::Many(values))) => values.push(value),
                Some((_, slot)) => {
                    if let QueryValue::One(first) = slot {
                        let first = std::mem::take(first);
                        *slot = QueryValue::Many(vec![first, value]);
                    }
                }
                None => entries.push((key, QueryValue::One(value))),
            }
        }

        Query(entries)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The first value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).map(QueryValue::first)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// `a=1&b=&a=2` -> `[("a", "1"), ("b", ""), ("a", "2")]`
pub(crate) fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(raw).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "undecodable query string");
        Vec::new()
    })
}

/// Split a `Cookie` header into name/value pairs, unquoting values.
pub(crate) fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.trim().trim_matches('"').to_owned()))
        })
        .collect()
}
