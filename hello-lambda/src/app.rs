//! Demo applications served by the function, picked by the configured
//! entry point name.

use std::io::Write;

use anyhow::{bail, Result};
use lambda_env_adapter::{AppResponse, Application, Body, Environ, HeaderCollection};
use serde::Serialize;

/// Entry point used when the config file names none.
pub const DEFAULT_ENTRY_POINT: &str = "hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoApp {
    /// Plain-text greeting that sets a couple of cookies.
    Hello,
    /// Reflects the call environment back as JSON.
    Echo,
}

impl DemoApp {
    pub fn from_entry_point(name: &str) -> Result<Self> {
        match name {
            "hello" => Ok(Self::Hello),
            "echo" => Ok(Self::Echo),
            other => bail!("Unknown application entry point: {}", other),
        }
    }
}

impl Application for DemoApp {
    fn call(&self, env: Environ) -> Result<AppResponse> {
        match self {
            Self::Hello => hello(env),
            Self::Echo => echo(env),
        }
    }
}

fn var<'a>(env: &'a Environ, key: &str) -> &'a str {
    env.get(key).unwrap_or_default()
}

fn hello(mut env: Environ) -> Result<AppResponse> {
    let line = format!("hello: {} {}", var(&env, "REQUEST_METHOD"), var(&env, "PATH_INFO"));
    writeln!(env.errors(), "{}", line)?;

    let mut headers = HeaderCollection::new();
    headers.set("Content-Type", "text/plain; charset=utf-8");
    headers.append("Set-Cookie", "greeted=1; Path=/");
    headers.append("Set-Cookie", "lang=en; Path=/");
    Ok(AppResponse::new(200, headers, Body::from_chunks(["Hello ", "World ☃!"])))
}

#[derive(Serialize)]
struct EchoReply<'a> {
    method: &'a str,
    script_name: &'a str,
    path_info: &'a str,
    query_string: &'a str,
    scheme: &'a str,
    remote_addr: &'a str,
    headers: Vec<(&'a str, &'a str)>,
    body_length: usize,
}

fn echo(mut env: Environ) -> Result<AppResponse> {
    let body = env.read_body()?;
    let reply = EchoReply {
        method: var(&env, "REQUEST_METHOD"),
        script_name: var(&env, "SCRIPT_NAME"),
        path_info: var(&env, "PATH_INFO"),
        query_string: var(&env, "QUERY_STRING"),
        scheme: env.url_scheme(),
        remote_addr: var(&env, "REMOTE_ADDR"),
        headers: env.vars().filter(|(k, _)| k.starts_with("HTTP_")).collect(),
        body_length: body.len(),
    };

    let mut headers = HeaderCollection::new();
    headers.set("Content-Type", "application/json");
    Ok(AppResponse::new(200, headers, serde_json::to_vec(&reply)?))
}
