use crate::error::FieldValidationError;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

lazy_static! {
    static ref SEGMENT_REGEX: Regex =
        Regex::new(r"^(?P<key>[^\[\]]*)(?P<indices>(?:\[[0-9]+\])*)$").unwrap();
    static ref INDEX_REGEX: Regex = Regex::new(r"\[(?P<index>[0-9]+)\]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed dotted/bracket path such as `booking.bookingdates.checkin` or
/// `$[0].bookingid`. `$` and the empty string denote the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl JsonPath {
    pub fn parse<S: AsRef<str>>(raw: S) -> Result<Self, FieldValidationError> {
        let raw = raw.as_ref();
        let invalid = || FieldValidationError::InvalidPath(raw.into());

        // `$` is the root only on its own or in front of `.` / `[`
        let trimmed = raw.trim();
        let rest = match trimmed.strip_prefix('$') {
            Some("") => "",
            Some(stripped) if stripped.starts_with('.') => &stripped[1..],
            Some(stripped) if stripped.starts_with('[') => stripped,
            _ => trimmed,
        };

        let mut segments = Vec::new();
        if rest.is_empty() {
            return Ok(Self {
                raw: raw.into(),
                segments,
            });
        }

        for part in rest.split('.') {
            let captures = SEGMENT_REGEX.captures(part).ok_or_else(invalid)?;
            let key = &captures["key"];
            let indices = &captures["indices"];

            if key.is_empty() && indices.is_empty() {
                return Err(invalid());
            }
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.into()));
            }
            for index in INDEX_REGEX.captures_iter(indices) {
                let index = index["index"].parse().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(index));
            }
        }

        Ok(Self {
            raw: raw.into(),
            segments,
        })
    }

    pub fn root() -> Self {
        Self {
            raw: "$".into(),
            segments: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walks `value` along the path. Returns `None` as soon as a key is missing,
    /// an index is out of bounds, or a segment meets the wrong kind of node.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |node, segment| match (segment, node) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }
}

impl FromStr for JsonPath {
    type Err = FieldValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
