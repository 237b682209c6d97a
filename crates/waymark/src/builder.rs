//! Per-call descriptor accumulator.
//!
//! A [`DescriptorBuilder`] is seeded from one intent, mutated by every fired
//! action in order, validated, and then consumed by normalization. Each build
//! call allocates its own builder; nothing aliases across calls.

use std::collections::BTreeMap;

use crate::credentials::FileCache;
use crate::descriptor::{
    AgentOptions, Auth, Aws, Descriptor, OAuth, TIMEOUT_MAX_MS,
};
use crate::error::{Error, Result};
use crate::intent::{Intent, Method, Pair, PairValue};

/// Mutable accumulator shared by all actions fired in one build.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    pub(crate) uri: String,
    pub(crate) method: Option<Method>,
    /// Seeded from the intent's parameters.
    pub(crate) parameter_list: Vec<Pair>,
    /// Always starts empty; headers are never inherited from the intent.
    pub(crate) header_list: Vec<Pair>,
    pub(crate) form_list: Vec<Pair>,
    pub(crate) body: Option<String>,
    pub(crate) json: Option<serde_json::Value>,
    pub(crate) auth: Auth,
    pub(crate) oauth: OAuth,
    pub(crate) aws: Aws,
    pub(crate) agent_options: AgentOptions,
    pub(crate) custom: BTreeMap<String, String>,
    pub(crate) follow_redirect: Option<bool>,
    pub(crate) gzip: Option<bool>,
    pub(crate) jar: Option<bool>,
    pub(crate) strict_ssl: Option<bool>,
    pub(crate) time: Option<bool>,
    pub(crate) encoding: Option<String>,
    pub(crate) timeout: Option<i64>,
    pub(crate) proxy: Option<String>,
}

impl DescriptorBuilder {
    /// Seed a fresh builder from a validated intent.
    pub(crate) fn seed(intent: &Intent) -> Self {
        Self {
            uri: intent.uri.clone(),
            method: intent.method,
            parameter_list: intent.parameter_pairs(),
            header_list: Vec::new(),
            form_list: intent.form_pairs(),
            body: intent.body.clone(),
            json: intent.json.clone(),
            auth: Auth::default(),
            oauth: OAuth::default(),
            aws: Aws::default(),
            agent_options: AgentOptions::default(),
            custom: BTreeMap::new(),
            follow_redirect: None,
            gzip: None,
            jar: None,
            strict_ssl: None,
            time: None,
            encoding: None,
            timeout: None,
            proxy: None,
        }
    }

    /// Default the method if no intent field or action set one.
    pub(crate) fn default_method(&mut self) {
        if self.method.is_none() {
            self.method = Some(Method::default());
        }
    }

    /// Validate the post-application shape. Accepts both raw-path and
    /// resolved-content credential fields.
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.uri.starts_with("http://") || self.uri.starts_with("https://")) {
            return Err(Error::Descriptor(format!(
                "uri must be http or https after rule application, got '{}'",
                self.uri
            )));
        }
        if self.uri.chars().count() < 5 {
            return Err(Error::Descriptor("uri is too short".into()));
        }

        if let Some(timeout) = self.timeout {
            if timeout <= 0 || timeout >= TIMEOUT_MAX_MS {
                return Err(Error::Descriptor(format!(
                    "timeout must be between 1 and {} ms, got {}",
                    TIMEOUT_MAX_MS - 1,
                    timeout
                )));
            }
        }

        if !self.auth.is_empty() {
            self.auth.validate()?;
        }
        if !self.oauth.is_empty() {
            self.oauth.validate()?;
        }
        if !self.aws.is_empty() {
            self.aws.validate()?;
        }
        if !self.agent_options.is_empty() {
            self.agent_options.validate()?;
        }

        Ok(())
    }

    /// Consume the builder into the final wire-ready descriptor.
    ///
    /// Resolves file-backed credential fields through the engine's cache,
    /// folds the pair lists into maps, prunes empty sub-objects, and strips
    /// the internal-only fields (raw paths, pair lists, tags never made it in).
    pub(crate) fn normalize(mut self, files: &FileCache) -> Result<Descriptor> {
        self.resolve_credential_files(files)?;

        let method = self.method.unwrap_or_default();
        let qs = fold_pairs(self.parameter_list);
        let headers = fold_pairs(self.header_list);
        let form = {
            let folded = fold_pairs(self.form_list);
            (!folded.is_empty()).then_some(folded)
        };

        Ok(Descriptor {
            method,
            uri: self.uri,
            qs,
            headers,
            form,
            body: self.body,
            json: self.json,
            auth: (!self.auth.is_empty()).then_some(self.auth),
            oauth: (!self.oauth.is_empty()).then_some(self.oauth),
            aws: (!self.aws.is_empty()).then_some(self.aws),
            agent_options: (!self.agent_options.is_empty()).then_some(self.agent_options),
            follow_redirect: self.follow_redirect,
            gzip: self.gzip,
            jar: self.jar,
            strict_ssl: self.strict_ssl,
            time: self.time,
            encoding: self.encoding,
            timeout: self.timeout,
            proxy: self.proxy,
            custom: self.custom,
        })
    }

    /// Read every path-backed credential through the cache and strip the raw
    /// paths from the shape.
    fn resolve_credential_files(&mut self, files: &FileCache) -> Result<()> {
        let opts = &mut self.agent_options;
        if let Some(path) = opts.cert_path.take() {
            opts.cert = Some(files.read(path.as_ref())?.as_ref().clone());
        }
        if let Some(path) = opts.key_path.take() {
            opts.key = Some(files.read(path.as_ref())?.as_ref().clone());
        }
        if let Some(path) = opts.pfx_path.take() {
            opts.pfx = Some(files.read(path.as_ref())?.as_ref().clone());
        }
        if let Some(path) = opts.ca_path.take() {
            opts.ca = Some(files.read(path.as_ref())?.as_ref().clone());
        }
        // Resolved content must still look like credential material.
        opts.validate()
    }
}

/// Fold a pair list into a map; a later pair with the same key overwrites the
/// earlier one.
fn fold_pairs(pairs: Vec<Pair>) -> BTreeMap<String, PairValue> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        map.insert(pair.k, pair.v);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(uri: &str) -> DescriptorBuilder {
        DescriptorBuilder::seed(&Intent::new(uri))
    }

    #[test]
    fn test_seed_clones_intent_fields() {
        let intent = Intent::post("http://example.com")
            .with_parameter("k1", "A1")
            .with_body("payload");
        let builder = DescriptorBuilder::seed(&intent);
        assert_eq!(builder.uri, "http://example.com");
        assert_eq!(builder.method, Some(Method::Post));
        assert_eq!(builder.parameter_list, vec![Pair::new("k1", "A1")]);
        assert_eq!(builder.body.as_deref(), Some("payload"));
        assert!(builder.header_list.is_empty());
        assert!(builder.auth.is_empty());
    }

    #[test]
    fn test_default_method() {
        let mut builder = seeded("http://example.com");
        builder.default_method();
        assert_eq!(builder.method, Some(Method::Get));

        let mut builder = DescriptorBuilder::seed(&Intent::put("http://example.com"));
        builder.default_method();
        assert_eq!(builder.method, Some(Method::Put));
    }

    #[test]
    fn test_validate_rejects_non_http_uri() {
        let builder = seeded("gist:12345");
        let err = builder.validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut builder = seeded("http://example.com");
        builder.timeout = Some(TIMEOUT_MAX_MS);
        assert!(builder.validate().is_err());
        builder.timeout = Some(TIMEOUT_MAX_MS - 1);
        builder.validate().unwrap();
        builder.timeout = Some(0);
        assert!(builder.validate().is_err());
    }

    #[test]
    fn test_normalize_folds_lists_and_prunes() {
        let files = FileCache::new();
        let mut builder = seeded("http://example.com");
        builder.default_method();
        builder.parameter_list.push(Pair::new("a", "1"));
        builder.parameter_list.push(Pair::new("b", PairValue::Int(2)));
        builder.header_list.push(Pair::new("H1", "v1"));

        let descriptor = builder.normalize(&files).unwrap();
        assert_eq!(descriptor.qs["a"], PairValue::from("1"));
        assert_eq!(descriptor.qs["b"], PairValue::Int(2));
        assert_eq!(descriptor.headers["H1"], PairValue::from("v1"));
        assert!(descriptor.form.is_none());
        assert!(descriptor.auth.is_none());
        assert!(descriptor.oauth.is_none());
        assert!(descriptor.agent_options.is_none());
    }

    #[test]
    fn test_fold_later_pair_wins() {
        let folded = fold_pairs(vec![Pair::new("k", "first"), Pair::new("k", "second")]);
        assert_eq!(folded["k"], PairValue::from("second"));
    }

    #[test]
    fn test_normalize_resolves_credential_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let ca = tmp.path().join("ca.pem");
        std::fs::write(&ca, "-----BEGIN CERTIFICATE-----").unwrap();

        let files = FileCache::new();
        let mut builder = seeded("https://example.com");
        builder.default_method();
        builder.agent_options.ca_path = Some(ca.to_string_lossy().into_owned());

        let descriptor = builder.normalize(&files).unwrap();
        let opts = descriptor.agent_options.unwrap();
        assert_eq!(opts.ca.as_deref(), Some("-----BEGIN CERTIFICATE-----"));
        assert!(opts.ca_path.is_none());
    }

    #[test]
    fn test_normalize_missing_credential_file_fails() {
        let files = FileCache::new();
        let mut builder = seeded("https://example.com");
        builder.agent_options.ca_path = Some("/nonexistent/ca.pem".into());
        let err = builder.normalize(&files).unwrap_err();
        assert!(matches!(err, Error::CredentialFile { .. }));
    }
}
