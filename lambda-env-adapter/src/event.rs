//! Inbound event classification.
//!
//! A raw Lambda payload is decoded once into an [`Invocation`] before any
//! field is used. API Gateway REST proxy events and ALB target-group events
//! share one wire shape; they differ only in the `requestContext.elb`
//! marker and in whether multi-value headers / query parameters are
//! present, and each of those is decided per field.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::headers::HeaderCollection;
use indexmap::IndexMap;

/// `source` values of scheduled keepalive and warmup-plugin pings.
pub const KEEPALIVE_SOURCES: [&str; 2] = ["aws.events", "serverless-plugin-warmup"];

/// Top-level field marking a remote-command event.
pub const REMOTE_COMMAND_FIELD: &str = "_serverless-rack";

/// A decoded inbound event.
#[derive(Debug)]
pub enum Invocation {
    /// Non-HTTP remote command, to be handed off untranslated.
    RemoteCommand(RemoteCommand),
    /// Scheduled keepalive or warmup ping.
    Keepalive,
    Http(Box<HttpEvent>),
}

impl Invocation {
    pub fn classify(event: Value) -> Result<Self> {
        if let Some(meta) = remote_command_marker(&event) {
            let command = RemoteCommand::deserialize(meta)?;
            return Ok(Self::RemoteCommand(command));
        }
        if is_keepalive(&event) {
            return Ok(Self::Keepalive);
        }
        let event = HttpEvent::decode(event)?;
        debug!(
            dialect = ?event.dialect(),
            multi_value_headers = event.uses_multi_value_headers(),
            multi_value_query = matches!(event.query, QueryParameters::Multi(_)),
            "classified HTTP event"
        );
        Ok(Self::Http(Box::new(event)))
    }
}

/// The remote-command marker, unless absent, `null` or `false`.
fn remote_command_marker(event: &Value) -> Option<&Value> {
    event
        .get(REMOTE_COMMAND_FIELD)
        .filter(|meta| !matches!(meta, Value::Null | Value::Bool(false)))
}

pub fn is_keepalive(event: &Value) -> bool {
    event
        .get("source")
        .and_then(Value::as_str)
        .is_some_and(|source| KEEPALIVE_SOURCES.contains(&source))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCommand {
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

impl RemoteCommand {
    /// The command payload as text; non-string payloads are rendered as JSON.
    pub fn data_text(&self) -> String {
        match &self.data {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Which gateway produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    ApiGateway,
    LoadBalancer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryParameters {
    Single(IndexMap<String, Option<String>>),
    Multi(IndexMap<String, Vec<Option<String>>>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub stage: Option<String>,
    pub identity: Option<Identity>,
    pub authorizer: Option<Value>,
    pub elb: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub source_ip: Option<String>,
}

/// An HTTP request event from API Gateway or an ALB.
#[derive(Debug, Clone)]
pub struct HttpEvent {
    pub http_method: String,
    pub path: String,
    pub query: QueryParameters,
    pub headers: HeaderCollection,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub request_context: RequestContext,
    multi_value_headers: bool,
    raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    http_method: String,
    path: String,
    query_string_parameters: Option<IndexMap<String, Option<String>>>,
    #[serde(default, deserialize_with = "present")]
    multi_value_query_string_parameters: Option<Option<IndexMap<String, Vec<Option<String>>>>>,
    headers: Option<HeaderCollection>,
    #[serde(default, deserialize_with = "present")]
    multi_value_headers: Option<Option<IndexMap<String, Vec<String>>>>,
    body: Option<String>,
    is_base64_encoded: Option<bool>,
    request_context: RequestContext,
}

/// Distinguishes a field that is present but `null` from one that is absent.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl HttpEvent {
    /// Decode an HTTP event. Events that carry neither dialect's optional
    /// markers are treated as single-value API Gateway events.
    pub fn decode(raw: Value) -> Result<Self> {
        let wire = WireEvent::deserialize(&raw)?;

        let query = match wire.multi_value_query_string_parameters {
            Some(params) => QueryParameters::Multi(params.unwrap_or_default()),
            None => QueryParameters::Single(wire.query_string_parameters.unwrap_or_default()),
        };

        let multi_value_headers = wire.multi_value_headers.is_some();
        let headers = match wire.multi_value_headers {
            Some(map) => HeaderCollection::from_multi_value(map.unwrap_or_default()),
            None => wire.headers.unwrap_or_default(),
        };

        Ok(Self {
            http_method: wire.http_method,
            path: wire.path,
            query,
            headers,
            body: wire.body,
            is_base64_encoded: wire.is_base64_encoded.unwrap_or(false),
            request_context: wire.request_context,
            multi_value_headers,
            raw,
        })
    }

    pub fn dialect(&self) -> Dialect {
        if self.request_context.elb.is_some() {
            Dialect::LoadBalancer
        } else {
            Dialect::ApiGateway
        }
    }

    /// Whether the gateway expects `multiValueHeaders` in the response.
    pub fn uses_multi_value_headers(&self) -> bool {
        self.multi_value_headers
    }

    /// The event exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
