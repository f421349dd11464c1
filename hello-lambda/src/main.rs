use hello_lambda::handler;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Built once per container and shared by every invocation
    let adapter = handler::init_adapter()
        .map_err(|e| Error::from(format!("Failed to initialize adapter: {:#}", e)))?;
    let adapter = &adapter;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler::function_handler(adapter, event).await
    }))
    .await
}
