//! Turning a streamed request body into a typed value.

mod charset;
mod decode;
mod materialize;
mod part;
mod sniff;
mod storage;

pub use charset::{Charset, CharsetError};
pub use materialize::{classify, materialize, Format, Payload};
pub use part::BodyPart;
pub use sniff::{is_textual, sniff};
pub use storage::{FieldStorage, FileStorage};

pub(crate) use decode::boundary;
pub(crate) use materialize::content_charset;

use bytes::Bytes;
use serde_json::Value;

use std::mem;

/// A materialized request body.
#[derive(Debug)]
pub enum Body {
    Json(Value),
    /// A decoded url-encoded or multipart form.
    Form(FormData),
    Raw(Bytes),
    /// A binary body without a name, kept on disk.
    File(FileStorage),
}

/// The value stored under one form key.
#[derive(Debug)]
pub enum FormValue {
    Field(FieldStorage),
    File(FileStorage),
    /// Every value, in arrival order, when a key occurs more than once.
    List(Vec<FormValue>),
}

impl FormValue {
    /// The first scalar value.
    pub fn first(&self) -> Option<&FormValue> {
        match self {
            FormValue::List(values) => values.first(),
            value => Some(value),
        }
    }

    pub fn as_field(&self) -> Option<&FieldStorage> {
        match self {
            FormValue::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileStorage> {
        match self {
            FormValue::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(values) => Some(values),
            _ => None,
        }
    }
}

/// An ordered form mapping. Keys keep the order of their first occurrence.
#[derive(Debug, Default)]
pub struct FormData(Vec<(String, FormValue)>);

impl FormData {
    pub fn new() -> Self {
        FormData(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FormValue> {
        self.0.iter_mut().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Add a value. The first occurrence of a key is stored as a scalar, the
    /// second turns it into a list and later ones append to that list.
    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(FormValue::List(values)) => values.push(value),
            Some(slot) => {
                let first = mem::replace(slot, FormValue::List(Vec::with_capacity(2)));
                if let FormValue::List(values) = slot {
                    values.push(first);
                    values.push(value);
                }
            }
            None => self.0.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every non-file value, flattened.
    pub fn fields(&self) -> impl Iterator<Item = &FieldStorage> {
        self.0.iter().flat_map(|(_, v)| flatten(v)).filter_map(FormValue::as_field)
    }

    /// Every file value, flattened.
    pub fn files(&self) -> impl Iterator<Item = &FileStorage> {
        self.0.iter().flat_map(|(_, v)| flatten(v)).filter_map(FormValue::as_file)
    }

    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut FileStorage> {
        self.0
            .iter_mut()
            .flat_map(|(_, v)| match v {
                FormValue::List(values) => values.iter_mut().collect::<Vec<_>>(),
                value => vec![value],
            })
            .filter_map(|v| match v {
                FormValue::File(file) => Some(file),
                _ => None,
            })
    }
}

fn flatten(value: &FormValue) -> Box<dyn Iterator<Item = &FormValue> + '_> {
    match value {
        FormValue::List(values) => Box::new(values.iter()),
        value => Box::new(std::iter::once(value)),
    }
}
