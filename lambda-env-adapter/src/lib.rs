//! lambda-env-adapter — runs a synchronous environment-style application
//! behind API Gateway REST proxy events and ALB target-group events.
//!
//! # Flow
//!
//! ```text
//! raw event (serde_json::Value)
//!   │
//!   ├── event::Invocation::classify   remote command / keepalive / HTTP
//!   ├── environ::build_environ        CGI-style variables + body stream
//!   ├── app::invoke                   one Application::call
//!   ├── response::format_response     headers, base64, statusDescription
//!   │
//!   ▼
//! handler::Reply (serialized back to the gateway)
//! ```
//!
//! Every invocation is isolated and sequential; the only long-lived state
//! is the [`Adapter`] holding the application and its configuration.

pub mod app;
pub mod config;
pub mod environ;
pub mod error;
pub mod event;
pub mod handler;
pub mod headers;
pub mod response;

pub use app::{AppResponse, Application, Body};
pub use config::AdapterConfig;
pub use environ::Environ;
pub use error::{AdapterError, Result};
pub use event::{HttpEvent, Invocation, RemoteCommand};
pub use handler::{handle_request, Adapter, CommandHandler, RejectCommands, Reply};
pub use headers::HeaderCollection;
pub use response::GatewayResponse;
