//! Rule-aware HTTP client.
//!
//! Binds a [`waymark::Engine`] to a `reqwest` client: every call builds the
//! descriptor for the caller's intent and maps it onto the wire. Request-level
//! descriptor fields (method, query, headers, form, body, auth, timeout) map
//! straight onto the request; client-level fields (proxy, redirect policy,
//! gzip, cookie jar, TLS material) build a dedicated `reqwest` client for
//! that one call.
//!
//! OAuth and AWS credential sub-objects are carried on the descriptor for
//! transports that implement request signing; this binding does not sign.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::redirect;
use tracing::debug;
use url::Url;

use waymark::{Descriptor, Engine, Intent, Method, PairValue};

use crate::error::{Error, Result};

/// Default timeout for requests without a `set timeout in ms` effect.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client that routes every request through a rule engine.
///
/// # Example
///
/// ```no_run
/// use waymark::Engine;
/// use waymark_client::Client;
///
/// # async fn example() -> waymark_client::Result<()> {
/// let engine = Engine::from_json(r#"{
///     "rules": [{
///         "when": [{"trigger": "uri starts with", "value": "http://"}],
///         "then": [{"action": "set header parameter", "values": ["X-Env", "staging"]}]
///     }]
/// }"#)?;
///
/// let client = Client::new(engine)?;
/// let exchange = client.execute("http://api.example.com/items").await?;
/// assert!(exchange.status.is_success());
/// # Ok(())
/// # }
/// ```
pub struct Client {
    engine: Engine,
    http: reqwest::Client,
    timeout: Duration,
}

impl Client {
    /// Bind an engine with default transport settings.
    pub fn new(engine: Engine) -> Result<Self> {
        ClientBuilder::new().build(engine)
    }

    /// Create a client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The bound rule engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Fire-and-continue: build the descriptor and dispatch it, returning the
    /// transport's native response handle. Non-2xx statuses are not errors
    /// here; they pass through exactly as the transport reports them.
    pub async fn dispatch(&self, intent: impl Into<Intent>) -> Result<reqwest::Response> {
        let descriptor = self.engine.build(intent)?;
        self.send_descriptor(&descriptor).await
    }

    /// Completion-style: dispatch and resolve to an [`Exchange`] carrying the
    /// response alongside the pipeline metadata (the original intent and any
    /// `custom` values its rules produced).
    pub async fn execute(&self, intent: impl Into<Intent>) -> Result<Exchange> {
        let intent = intent.into();
        let descriptor = self.engine.build(intent.clone())?;
        let custom = descriptor.custom.clone();

        let response = self.send_descriptor(&descriptor).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Exchange {
            status,
            headers,
            body,
            intent,
            custom,
        })
    }

    /// Dispatch an already-built descriptor.
    pub async fn send_descriptor(&self, descriptor: &Descriptor) -> Result<reqwest::Response> {
        let http = self.client_for(descriptor)?;
        let request = self.to_request(&http, descriptor)?;
        debug!(method = %descriptor.method, uri = %descriptor.uri, "dispatching request");
        Ok(request.send().await?)
    }

    /// Map the request-level descriptor fields onto a request builder.
    fn to_request(
        &self,
        http: &reqwest::Client,
        descriptor: &Descriptor,
    ) -> Result<reqwest::RequestBuilder> {
        let url = Url::parse(&descriptor.uri)?;
        let mut request = http.request(to_reqwest_method(descriptor.method), url);

        if !descriptor.qs.is_empty() {
            request = request.query(&descriptor.qs);
        }
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value_text(value));
        }

        if let Some(auth) = &descriptor.auth {
            if let Some(bearer) = &auth.bearer {
                request = request.bearer_auth(bearer);
            } else if let Some(user) = &auth.user {
                request = request.basic_auth(user, auth.pass.as_deref());
            }
        }

        if let Some(form) = &descriptor.form {
            let form: BTreeMap<&str, String> = form
                .iter()
                .map(|(k, v)| (k.as_str(), value_text(v)))
                .collect();
            request = request.form(&form);
        } else if let Some(json) = &descriptor.json {
            request = request.json(json);
        } else if let Some(body) = &descriptor.body {
            request = request.body(body.clone());
        }

        let timeout = descriptor
            .timeout
            .map(|ms| Duration::from_millis(ms as u64))
            .unwrap_or(self.timeout);
        request = request.timeout(timeout);

        Ok(request)
    }

    /// Pick the shared client, or build a dedicated one when the descriptor
    /// carries client-level options.
    fn client_for(&self, descriptor: &Descriptor) -> Result<reqwest::Client> {
        let needs_dedicated = descriptor.proxy.is_some()
            || descriptor.follow_redirect.is_some()
            || descriptor.strict_ssl.is_some()
            || descriptor.gzip.is_some()
            || descriptor.jar == Some(true)
            || descriptor.agent_options.is_some();
        if !needs_dedicated {
            return Ok(self.http.clone());
        }

        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &descriptor.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        if descriptor.follow_redirect == Some(false) {
            builder = builder.redirect(redirect::Policy::none());
        }
        if descriptor.strict_ssl == Some(false) {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if descriptor.gzip == Some(false) {
            builder = builder.no_gzip();
        }
        if descriptor.jar == Some(true) {
            builder = builder.cookie_store(true);
        }
        if let Some(options) = &descriptor.agent_options {
            if let Some(ca) = &options.ca {
                builder =
                    builder.add_root_certificate(reqwest::Certificate::from_pem(ca.as_bytes())?);
            }
            if let (Some(cert), Some(key)) = (&options.cert, &options.key) {
                let pem = format!("{}\n{}", key, cert);
                builder = builder.identity(reqwest::Identity::from_pem(pem.as_bytes())?);
            } else if let Some(pfx) = &options.pfx {
                builder = builder.identity(reqwest::Identity::from_pem(pfx.as_bytes())?);
            }
        }
        Ok(builder.build()?)
    }
}

/// One completed request/response round trip with pipeline metadata attached.
#[derive(Debug)]
pub struct Exchange {
    pub status: reqwest::StatusCode,
    pub headers: reqwest::header::HeaderMap,
    pub body: Vec<u8>,
    /// The intent this exchange was built from.
    pub intent: Intent,
    /// `set custom` values produced by the rules that fired.
    pub custom: BTreeMap<String, String>,
}

impl Exchange {
    /// Response body as (lossy) text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Builder for creating a [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Default timeout when no rule sets one.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client around a validated engine.
    pub fn build(self, engine: Engine) -> Result<Client> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("waymark-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(Client {
            engine,
            http,
            timeout: self.timeout,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn value_text(value: &PairValue) -> String {
    match value {
        PairValue::Text(s) => s.clone(),
        PairValue::Int(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough_engine() -> Engine {
        Engine::from_json(r#"{"rules": []}"#).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = Client::new(passthrough_engine()).unwrap();
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_to_request_rejects_bad_uri() {
        // The engine never emits a non-http uri, but send_descriptor is
        // public, so the parse failure path must hold on its own.
        let client = Client::new(passthrough_engine()).unwrap();
        let mut descriptor = client.engine.build("http://example.com").unwrap();
        descriptor.uri = "not a url".into();
        let err = client
            .to_request(&client.http, &descriptor)
            .err()
            .expect("parse should fail");
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_shared_client_reused_without_client_level_options() {
        let client = Client::new(passthrough_engine()).unwrap();
        let descriptor = client.engine.build("http://example.com").unwrap();
        // No proxy/redirect/TLS options: must not build a dedicated client.
        assert!(client.client_for(&descriptor).is_ok());
    }
}
