//! Wire-ready request descriptors and their credential sub-objects.
//!
//! A [`Descriptor`] is the normalized output of one build: everything a
//! transport collaborator needs, serialized with the documented field names
//! (`followRedirect`, `strictSSL`, `agentOptions`, ...). Credential
//! sub-objects start life as empty scratch on the builder and support
//! field-level merges, so repeated actions enrich rather than replace them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::intent::{Method, PairValue};

/// Upper bound for `timeout`, exclusive (two minutes).
pub const TIMEOUT_MAX_MS: i64 = 2 * 60 * 1000;

/// HTTP authorization: basic credentials or a bearer token, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(
        default,
        rename = "sendImmediately",
        skip_serializing_if = "Option::is_none"
    )]
    pub send_immediately: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
}

impl Auth {
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.pass.is_none()
            && self.send_immediately.is_none()
            && self.bearer.is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.bearer.is_some() {
            if self.user.is_some() || self.pass.is_some() {
                return Err(Error::Descriptor(
                    "auth: bearer token and basic credentials are mutually exclusive".into(),
                ));
            }
            check_len("auth.bearer", self.bearer.as_deref(), true)?;
            return Ok(());
        }
        check_len("auth.user", self.user.as_deref(), true)?;
        check_len("auth.pass", self.pass.as_deref(), true)?;
        Ok(())
    }
}

/// OAuth 1.0a signing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureMethod {
    #[serde(rename = "RSA-SHA1")]
    RsaSha1,
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
}

/// Where OAuth credentials travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthTransport {
    Query,
    Body,
    Header,
}

impl OAuthTransport {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(OAuthTransport::Query),
            "body" => Some(OAuthTransport::Body),
            "header" => Some(OAuthTransport::Header),
            _ => None,
        }
    }
}

/// OAuth 1.0a credentials. `consumer_secret` (HMAC/plaintext flows) and
/// `private_key` (RSA-SHA1 flow) are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_method: Option<SignatureMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_hash: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_method: Option<OAuthTransport>,
}

impl OAuth {
    pub fn is_empty(&self) -> bool {
        self == &OAuth::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_len("oauth.consumer_key", self.consumer_key.as_deref(), true)?;
        check_len("oauth.token", self.token.as_deref(), true)?;
        check_len("oauth.token_secret", self.token_secret.as_deref(), true)?;

        match (&self.consumer_secret, &self.private_key) {
            (Some(_), Some(_)) => {
                return Err(Error::Descriptor(
                    "oauth: consumer_secret and private_key are mutually exclusive".into(),
                ));
            }
            (None, None) => {
                return Err(Error::Descriptor(
                    "oauth: one of consumer_secret or private_key is required".into(),
                ));
            }
            _ => {}
        }

        if self.signature_method == Some(SignatureMethod::RsaSha1) && self.private_key.is_none() {
            return Err(Error::Descriptor(
                "oauth: RSA-SHA1 signature method requires private_key".into(),
            ));
        }

        check_len("oauth.consumer_secret", self.consumer_secret.as_deref(), false)?;
        if let Some(key) = &self.private_key {
            if key.is_empty() || key.chars().count() > 5000 {
                return Err(Error::Descriptor(
                    "oauth.private_key must be 1-5000 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// AWS signing credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aws {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl Aws {
    pub fn is_empty(&self) -> bool {
        self == &Aws::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (field, value) in [("aws.key", &self.key), ("aws.secret", &self.secret)] {
            match value {
                None => return Err(Error::Descriptor(format!("{} is required", field))),
                Some(v) => {
                    let len = v.chars().count();
                    if len < 6 || len > 1000 {
                        return Err(Error::Descriptor(format!(
                            "{} must be 6-1000 characters",
                            field
                        )));
                    }
                }
            }
        }
        if let Some(bucket) = &self.bucket {
            if bucket.is_empty() {
                return Err(Error::Descriptor("aws.bucket cannot be empty".into()));
            }
        }
        Ok(())
    }
}

/// TLS agent options.
///
/// `*_path` fields are the raw file paths set by actions; normalization
/// resolves them into the content fields and strips the paths from the final
/// shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(default, rename = "certPath", skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, rename = "keyPath", skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfx: Option<String>,
    #[serde(default, rename = "pfxPath", skip_serializing_if = "Option::is_none")]
    pub pfx_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,
    #[serde(default, rename = "caPath", skip_serializing_if = "Option::is_none")]
    pub ca_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(
        default,
        rename = "securityOptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub security_options: Option<String>,
    #[serde(
        default,
        rename = "secureProtocol",
        skip_serializing_if = "Option::is_none"
    )]
    pub secure_protocol: Option<String>,
}

impl AgentOptions {
    pub fn is_empty(&self) -> bool {
        self == &AgentOptions::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.pfx_path.is_some() && (self.cert_path.is_some() || self.key_path.is_some()) {
            return Err(Error::Descriptor(
                "agentOptions: pfxPath is mutually exclusive with certPath/keyPath".into(),
            ));
        }
        for (field, path) in [
            ("agentOptions.certPath", &self.cert_path),
            ("agentOptions.keyPath", &self.key_path),
            ("agentOptions.pfxPath", &self.pfx_path),
            ("agentOptions.caPath", &self.ca_path),
        ] {
            if let Some(p) = path {
                let len = p.chars().count();
                if len < 4 || len > 1000 {
                    return Err(Error::Descriptor(format!(
                        "{} must be 4-1000 characters",
                        field
                    )));
                }
            }
        }
        for (field, content) in [
            ("agentOptions.cert", &self.cert),
            ("agentOptions.key", &self.key),
            ("agentOptions.pfx", &self.pfx),
            ("agentOptions.ca", &self.ca),
        ] {
            if let Some(c) = content {
                if c.len() < 10 {
                    return Err(Error::Descriptor(format!(
                        "{} content is implausibly short",
                        field
                    )));
                }
            }
        }
        check_len("agentOptions.passphrase", self.passphrase.as_deref(), false)?;
        if let Some(opt) = &self.security_options {
            if opt != "SSL_OP_NO_SSLv3" {
                return Err(Error::Descriptor(format!(
                    "agentOptions.securityOptions: unsupported value '{}'",
                    opt
                )));
            }
        }
        if let Some(proto) = &self.secure_protocol {
            if proto != "SSLv3_method" {
                return Err(Error::Descriptor(format!(
                    "agentOptions.secureProtocol: unsupported value '{}'",
                    proto
                )));
            }
        }
        Ok(())
    }
}

/// Fully built, normalized request configuration, ready for a transport
/// collaborator. Produced by [`crate::Engine::build`]; never constructed
/// piecemeal by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    pub method: Method,
    pub uri: String,

    /// Query string parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qs: BTreeMap<String, PairValue>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, PairValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<BTreeMap<String, PairValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<Aws>,

    #[serde(
        default,
        rename = "agentOptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_options: Option<AgentOptions>,

    #[serde(
        default,
        rename = "followRedirect",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_redirect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gzip: Option<bool>,

    /// Whether the transport should keep a cookie jar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<bool>,

    #[serde(default, rename = "strictSSL", skip_serializing_if = "Option::is_none")]
    pub strict_ssl: Option<bool>,

    /// Whether the transport should record timing phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Open side-channel populated by the `set custom` action; carried to the
    /// caller untouched, never interpreted by the transport mapping.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

/// Require a string in 1-1000 chars. `required` controls whether `None` is an
/// error.
fn check_len(field: &str, value: Option<&str>, required: bool) -> Result<()> {
    match value {
        None if required => Err(Error::Descriptor(format!("{} is required", field))),
        None => Ok(()),
        Some(v) => {
            let len = v.chars().count();
            if len == 0 || len > 1000 {
                Err(Error::Descriptor(format!(
                    "{} must be 1-1000 characters",
                    field
                )))
            } else {
                Ok(())
            }
        }
    }
}
