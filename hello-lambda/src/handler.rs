use anyhow::Context as _;
use lambda_env_adapter::{Adapter, AdapterConfig, Reply};
use lambda_runtime::{Context, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::app::{DemoApp, DEFAULT_ENTRY_POINT};

/// Environment variable naming the adapter config file.
pub const CONFIG_PATH_VAR: &str = "ADAPTER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = ".serverless-rack";

/// Build the adapter (called once per Lambda container)
pub fn init_adapter() -> anyhow::Result<Adapter> {
    let config_path =
        std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AdapterConfig::load(&config_path)?.with_env_base_path();

    let entry_point = config.entry_point.as_deref().unwrap_or(DEFAULT_ENTRY_POINT);
    let app = DemoApp::from_entry_point(entry_point)
        .with_context(|| format!("Failed to load application from {}", config_path))?;

    info!(
        entry_point,
        base_path = config.base_path().unwrap_or_default(),
        extra_text_mime_types = config.text_mime_types.len(),
        "adapter initialized"
    );
    Ok(Adapter::new(app, config))
}

/// Lambda handler function
pub async fn function_handler(adapter: &Adapter, event: LambdaEvent<Value>) -> Result<Reply, Error> {
    let payload = event.payload;
    let context = event.context;
    info!("Processing event with request_id: {}", context.request_id);

    match adapter.handle(payload, context_value(&context)) {
        Ok(reply) => Ok(reply),
        Err(e) => {
            error!("Failed to handle event: {}", e);
            Err(Error::from(format!("Failed to handle event: {}", e)))
        }
    }
}

/// The invocation context as handed to the application.
fn context_value(context: &Context) -> Value {
    json!({
        "aws_request_id": context.request_id,
        "deadline_ms": context.deadline,
        "invoked_function_arn": context.invoked_function_arn,
        "xray_trace_id": context.xray_trace_id,
        "function_name": context.env_config.function_name,
        "function_version": context.env_config.version,
        "memory_limit_in_mb": context.env_config.memory,
    })
}
