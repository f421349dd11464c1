//! Call environment construction.
//!
//! Turns a decoded [`HttpEvent`] into the CGI-style environment handed to
//! the application: request line variables, one `HTTP_*` entry per header,
//! the decoded body as an input stream, and pass-through of the raw event,
//! Lambda context and authorizer claims.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Cursor, Read, Write};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::Value;

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::event::{HttpEvent, QueryParameters};
use crate::headers::HeaderCollection;

/// Environment interface version advertised to applications.
pub const ENV_VERSION: (u32, u32) = (1, 3);

/// Host suffix of API Gateway's default execute-api domains.
const GATEWAY_DOMAIN: &str = "amazonaws.com";

/// Standard alphabet, padding optional on decode.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DEFAULT_SERVER_NAME: &str = "lambda";
const DEFAULT_SERVER_PORT: &str = "80";
const DEFAULT_URL_SCHEME: &str = "http";

/// The environment for one application call.
pub struct Environ {
    vars: BTreeMap<String, String>,
    url_scheme: String,
    input: Cursor<Vec<u8>>,
    errors: Box<dyn Write + Send>,
    multithread: bool,
    multiprocess: bool,
    run_once: bool,
    event: Value,
    context: Value,
    authorizer: Option<Value>,
}

impl Environ {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All string variables, sorted by key.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn version(&self) -> (u32, u32) {
        ENV_VERSION
    }

    pub fn url_scheme(&self) -> &str {
        &self.url_scheme
    }

    /// The request body stream.
    pub fn input(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.input
    }

    /// Read the rest of the request body.
    pub fn read_body(&mut self) -> io::Result<Vec<u8>> {
        let mut body = Vec::new();
        self.input.read_to_end(&mut body)?;
        Ok(body)
    }

    /// Diagnostic output stream, process stderr unless replaced.
    pub fn errors(&mut self) -> &mut (dyn Write + Send) {
        self.errors.as_mut()
    }

    pub fn with_errors(mut self, sink: impl Write + Send + 'static) -> Self {
        self.errors = Box::new(sink);
        self
    }

    pub fn multithread(&self) -> bool {
        self.multithread
    }

    pub fn multiprocess(&self) -> bool {
        self.multiprocess
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// The inbound event, unmodified.
    pub fn event(&self) -> &Value {
        &self.event
    }

    /// The Lambda invocation context.
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Authorizer claims from the request context, if any.
    pub fn authorizer(&self) -> Option<&Value> {
        self.authorizer.as_ref()
    }
}

impl fmt::Debug for Environ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environ")
            .field("vars", &self.vars)
            .field("url_scheme", &self.url_scheme)
            .field("input_len", &self.input.get_ref().len())
            .finish_non_exhaustive()
    }
}

/// Build the call environment for an HTTP event.
pub fn build_environ(event: &HttpEvent, context: Value, config: &AdapterConfig) -> Result<Environ> {
    let body = decode_body(event)?;
    let headers = &event.headers;
    let base_path = config.base_path();

    let mut vars = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        vars.insert(key.to_string(), value);
    };
    put("REQUEST_METHOD", event.http_method.clone());
    put("SCRIPT_NAME", script_name(event, base_path));
    put("PATH_INFO", path_info(&event.path, base_path).to_string());
    put("QUERY_STRING", build_query(&event.query));
    put("SERVER_NAME", headers.get_or("Host", DEFAULT_SERVER_NAME).to_string());
    put("SERVER_PORT", headers.get_or("X-Forwarded-Port", DEFAULT_SERVER_PORT).to_string());
    put("CONTENT_LENGTH", body.len().to_string());
    put("CONTENT_TYPE", headers.get_or("Content-Type", "").to_string());
    put("SERVER_PROTOCOL", "HTTP/1.1".to_string());
    put("REMOTE_ADDR", remote_addr(event));
    put("REMOTE_USER", remote_user(event));
    vars.extend(http_variables(headers));

    let url_scheme = headers
        .get_or("X-Forwarded-Proto", DEFAULT_URL_SCHEME)
        .to_string();
    let authorizer = event.request_context.authorizer.clone();

    Ok(Environ {
        vars,
        url_scheme,
        input: Cursor::new(body),
        errors: Box::new(io::stderr()),
        multithread: false,
        multiprocess: false,
        run_once: false,
        event: event.raw().clone(),
        context,
        authorizer,
    })
}

fn decode_body(event: &HttpEvent) -> Result<Vec<u8>> {
    let body = event.body.as_deref().unwrap_or_default();
    if event.is_base64_encoded {
        Ok(BODY_ENGINE.decode(body)?)
    } else {
        Ok(body.as_bytes().to_vec())
    }
}

/// Mount point of the API: the base path on a custom domain, the stage on
/// a default execute-api domain, empty otherwise.
fn script_name(event: &HttpEvent, base_path: Option<&str>) -> String {
    match base_path {
        Some(base) => format!("/{base}"),
        None if event.headers.get_or("Host", "").contains(GATEWAY_DOMAIN) => {
            format!("/{}", event.request_context.stage.as_deref().unwrap_or_default())
        }
        None => String::new(),
    }
}

fn path_info<'a>(path: &'a str, base_path: Option<&str>) -> &'a str {
    base_path
        .and_then(|base| path.strip_prefix('/')?.strip_prefix(base))
        .unwrap_or(path)
}

fn remote_addr(event: &HttpEvent) -> String {
    event
        .request_context
        .identity
        .as_ref()
        .and_then(|identity| identity.source_ip.clone())
        .unwrap_or_default()
}

fn remote_user(event: &HttpEvent) -> String {
    event
        .request_context
        .authorizer
        .as_ref()
        .and_then(|authorizer| authorizer.get("principalId"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `HTTP_*` variables for every header except the two that have
/// dedicated variables.
fn http_variables(headers: &HeaderCollection) -> impl Iterator<Item = (String, String)> + '_ {
    headers
        .iter()
        .map(|(name, value)| {
            let key = format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"));
            (key, value.to_string())
        })
        .filter(|(key, _)| key != "HTTP_CONTENT_TYPE" && key != "HTTP_CONTENT_LENGTH")
}

/// Build a form-encoded query string. Existing `%XX` escapes in the
/// gateway's values are kept as they are.
pub fn build_query(query: &QueryParameters) -> String {
    let mut pairs = Vec::new();
    match query {
        QueryParameters::Single(params) => {
            for (key, value) in params.iter() {
                pairs.push(query_pair(key, value.as_deref()));
            }
        }
        QueryParameters::Multi(params) => {
            for (key, values) in params.iter() {
                for value in values {
                    pairs.push(query_pair(key, value.as_deref()));
                }
            }
        }
    }
    pairs.join("&")
}

fn query_pair(key: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{}={}", escape(key), escape(value)),
        None => escape(key),
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' | b'%' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
