//! Invocation entry point.
//!
//! Routes a raw event to the remote-command handler, answers keepalive
//! pings, and runs HTTP events through environment building, one
//! application call, and response formatting.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::app::{invoke, Application};
use crate::config::AdapterConfig;
use crate::environ::build_environ;
use crate::error::Result;
use crate::event::{HttpEvent, Invocation, RemoteCommand};
use crate::response::{format_response, GatewayResponse};

/// Command names understood by the remote-command channel.
pub const REMOTE_COMMANDS: [&str; 3] = ["exec", "command", "rake"];

/// Receives remote-command events before any HTTP translation happens.
pub trait CommandHandler: Send + Sync {
    /// Run the command and return its captured output.
    fn run(&self, command: &RemoteCommand) -> String;
}

/// Refuses every remote command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectCommands;

impl CommandHandler for RejectCommands {
    fn run(&self, command: &RemoteCommand) -> String {
        if REMOTE_COMMANDS.contains(&command.command.as_str()) {
            format!("Remote command '{}' is disabled for this function", command.command)
        } else {
            format!("Unknown command: {}", command.command)
        }
    }
}

/// The value returned to the Lambda runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Http(GatewayResponse),
    /// Output of a remote command.
    Command(String),
    /// Keepalive acknowledgement, serialized as `{}`.
    Empty {},
}

/// An application bound to its configuration, built once per container.
pub struct Adapter {
    app: Box<dyn Application>,
    config: AdapterConfig,
    commands: Box<dyn CommandHandler>,
}

impl Adapter {
    pub fn new(app: impl Application + 'static, config: AdapterConfig) -> Self {
        Self {
            app: Box::new(app),
            config,
            commands: Box::new(RejectCommands),
        }
    }

    pub fn with_command_handler(mut self, commands: impl CommandHandler + 'static) -> Self {
        self.commands = Box::new(commands);
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Handle one raw Lambda event.
    pub fn handle(&self, event: Value, context: Value) -> Result<Reply> {
        match Invocation::classify(event)? {
            Invocation::RemoteCommand(command) => {
                info!(command = %command.command, "dispatching remote command");
                Ok(Reply::Command(self.commands.run(&command)))
            }
            Invocation::Keepalive => {
                debug!("ignoring keepalive event");
                Ok(Reply::Empty {})
            }
            Invocation::Http(event) => {
                handle_request(&*self.app, &event, context, &self.config).map(Reply::Http)
            }
        }
    }
}

/// Build the environment, call the application once, and format its reply.
pub fn handle_request(
    app: &dyn Application,
    event: &HttpEvent,
    context: Value,
    config: &AdapterConfig,
) -> Result<GatewayResponse> {
    debug!(method = %event.http_method, path = %event.path, "handling HTTP event");
    let env = build_environ(event, context, config)?;
    let response = invoke(app, env)?;
    format_response(event, response, config)
}
