//! Caller intents and the key/value types shared across the pipeline.
//!
//! An [`Intent`] is the caller's declarative description of a resource to
//! address, before any rule has been applied. It is ephemeral: one per build
//! call. Parameter and form values accept either a canonical pair list or a
//! plain map; maps are normalized to pair lists before building.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum accepted intent URI length.
pub(crate) const URI_MIN: usize = 5;
/// Maximum accepted intent URI length.
pub(crate) const URI_MAX: usize = 1000;

/// HTTP method carried by intents and descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    #[default]
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "PATCH")]
    Patch,
    #[serde(rename = "HEAD")]
    Head,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
        }
    }

    /// Parse a wire name. Returns `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Method> {
        match s {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "PATCH" => Some(Method::Patch),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value: verbatim text or a coerced integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairValue {
    Int(i64),
    Text(String),
}

impl From<&str> for PairValue {
    fn from(s: &str) -> Self {
        PairValue::Text(s.to_string())
    }
}

impl From<String> for PairValue {
    fn from(s: String) -> Self {
        PairValue::Text(s)
    }
}

impl From<i64> for PairValue {
    fn from(n: i64) -> Self {
        PairValue::Int(n)
    }
}

/// A single key/value pair, transient until folded into a map during
/// normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub k: String,
    pub v: PairValue,
}

impl Pair {
    pub fn new(k: impl Into<String>, v: impl Into<PairValue>) -> Self {
        Self {
            k: k.into(),
            v: v.into(),
        }
    }
}

/// Caller input for one build call.
///
/// Deserializes from the wire shape
/// `{ uri, method?, parameterList?|parameterObj?, formList?|formObj?, body?,
/// json?, tags? }`, or construct programmatically:
///
/// ```
/// use waymark::Intent;
///
/// let intent = Intent::get("https://api.example.com/items")
///     .with_parameter("page", "2")
///     .with_tag("internal");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,

    /// Query parameters as a canonical pair list.
    #[serde(
        default,
        rename = "parameterList",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_list: Option<Vec<Pair>>,

    /// Query parameters as a plain map (alternate shape).
    #[serde(
        default,
        rename = "parameterObj",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_obj: Option<BTreeMap<String, PairValue>>,

    /// Form fields as a canonical pair list.
    #[serde(default, rename = "formList", skip_serializing_if = "Option::is_none")]
    pub form_list: Option<Vec<Pair>>,

    /// Form fields as a plain map (alternate shape).
    #[serde(default, rename = "formObj", skip_serializing_if = "Option::is_none")]
    pub form_obj: Option<BTreeMap<String, PairValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,

    /// Free-form labels the tag triggers match against. Never reaches the
    /// final descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Intent {
    /// Create an intent with no method preference.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: None,
            parameter_list: None,
            parameter_obj: None,
            form_list: None,
            form_obj: None,
            body: None,
            json: None,
            tags: Vec::new(),
        }
    }

    /// GET intent.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Get)
    }

    /// HEAD intent.
    pub fn head(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Head)
    }

    /// DELETE intent.
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Delete)
    }

    /// POST intent.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Post)
    }

    /// PUT intent.
    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Put)
    }

    /// PATCH intent.
    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(uri).with_method(Method::Patch)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Append a query parameter.
    pub fn with_parameter(mut self, k: impl Into<String>, v: impl Into<PairValue>) -> Self {
        self.parameter_list
            .get_or_insert_with(Vec::new)
            .push(Pair::new(k, v));
        self
    }

    /// Supply query parameters as a map shape.
    pub fn with_parameters(mut self, map: BTreeMap<String, PairValue>) -> Self {
        self.parameter_obj = Some(map);
        self
    }

    /// Append a form field.
    pub fn with_form_field(mut self, k: impl Into<String>, v: impl Into<PairValue>) -> Self {
        self.form_list
            .get_or_insert_with(Vec::new)
            .push(Pair::new(k, v));
        self
    }

    /// Supply form fields as a map shape.
    pub fn with_form(mut self, map: BTreeMap<String, PairValue>) -> Self {
        self.form_obj = Some(map);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether the intent carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Query parameters normalized to a canonical pair list.
    pub(crate) fn parameter_pairs(&self) -> Vec<Pair> {
        normalize_pairs(&self.parameter_list, &self.parameter_obj)
    }

    /// Form fields normalized to a canonical pair list.
    pub(crate) fn form_pairs(&self) -> Vec<Pair> {
        normalize_pairs(&self.form_list, &self.form_obj)
    }

    /// Validate the intent shape. Runs before any rule evaluates.
    pub fn validate(&self) -> Result<()> {
        let len = self.uri.chars().count();
        if len < URI_MIN || len > URI_MAX {
            return Err(Error::Intent(format!(
                "uri must be {}-{} characters, got {} ('{}')",
                URI_MIN, URI_MAX, len, self.uri
            )));
        }

        if self.parameter_list.is_some() && self.parameter_obj.is_some() {
            return Err(Error::Intent(
                "parameterList and parameterObj are mutually exclusive".into(),
            ));
        }
        if self.form_list.is_some() && self.form_obj.is_some() {
            return Err(Error::Intent(
                "formList and formObj are mutually exclusive".into(),
            ));
        }

        for pair in self
            .parameter_list
            .iter()
            .flatten()
            .chain(self.form_list.iter().flatten())
        {
            if pair.k.is_empty() {
                return Err(Error::Intent("pair key cannot be empty".into()));
            }
        }
        for key in self
            .parameter_obj
            .iter()
            .flat_map(|m| m.keys())
            .chain(self.form_obj.iter().flat_map(|m| m.keys()))
        {
            if key.is_empty() {
                return Err(Error::Intent("pair key cannot be empty".into()));
            }
        }

        for tag in &self.tags {
            if tag.is_empty() {
                return Err(Error::Intent("tags cannot be empty strings".into()));
            }
        }

        Ok(())
    }
}

impl From<&str> for Intent {
    fn from(uri: &str) -> Self {
        Intent::new(uri)
    }
}

impl From<String> for Intent {
    fn from(uri: String) -> Self {
        Intent::new(uri)
    }
}

/// Fold the list-or-map alternates into one canonical pair list.
fn normalize_pairs(
    list: &Option<Vec<Pair>>,
    map: &Option<BTreeMap<String, PairValue>>,
) -> Vec<Pair> {
    if let Some(list) = list {
        return list.clone();
    }
    map.iter()
        .flat_map(|m| m.iter())
        .map(|(k, v)| Pair {
            k: k.clone(),
            v: v.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_uri_conversion() {
        let intent: Intent = "http://example.com".into();
        assert_eq!(intent.uri, "http://example.com");
        assert!(intent.method.is_none());
    }

    #[test]
    fn test_uri_length_bounds() {
        assert!(Intent::new("abcd").validate().is_err());
        assert!(Intent::new("abcde").validate().is_ok());
        assert!(Intent::new("a".repeat(1001)).validate().is_err());
    }

    #[test]
    fn test_list_and_map_are_exclusive() {
        let intent = Intent::new("http://example.com")
            .with_parameter("a", "1")
            .with_parameters(BTreeMap::from([("b".into(), "2".into())]));
        assert!(intent.validate().is_err());
    }

    #[test]
    fn test_map_shape_normalizes_to_pairs() {
        let intent = Intent::new("http://example.com")
            .with_parameters(BTreeMap::from([("k1".into(), PairValue::from("A1"))]));
        assert_eq!(intent.parameter_pairs(), vec![Pair::new("k1", "A1")]);
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let intent: Intent = serde_json::from_str(
            r#"{
                "uri": "http://example.com",
                "method": "POST",
                "parameterObj": {"page": 2},
                "tags": ["internal"]
            }"#,
        )
        .unwrap();
        assert_eq!(intent.method, Some(Method::Post));
        assert_eq!(
            intent.parameter_pairs(),
            vec![Pair::new("page", PairValue::Int(2))]
        );
        assert!(intent.has_tag("internal"));
    }

    #[test]
    fn test_empty_pair_key_rejected() {
        let intent = Intent::new("http://example.com").with_parameter("", "x");
        assert!(intent.validate().is_err());
    }

    #[test]
    fn test_method_parse_closed_set() {
        assert_eq!(Method::parse("PATCH"), Some(Method::Patch));
        assert_eq!(Method::parse("TRACE"), None);
        assert_eq!(Method::parse("get"), None);
    }

    #[test]
    fn test_default_method_is_get() {
        assert_eq!(Method::default(), Method::Get);
    }
}
