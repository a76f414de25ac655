use std::io::{self, Read, Write};
use std::process::ExitCode;

use practice_ai_gateway::{config, init_tracing, GatewayConfig, OperationRequest, SecureAiGateway};

/// Reads one JSON `OperationRequest` from stdin and writes the
/// `OperationResult` to stdout. Logs go to stderr.
fn main() -> ExitCode {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            let _ = writeln!(io::stderr(), "error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = GatewayConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        provider = config.provider.as_str(),
        model = %config.model,
        hipaa_mode = config.hipaa_mode,
        deidentify = config.deidentify_before_call,
        "Gateway configured"
    );
    let gateway = SecureAiGateway::from_config(config).map_err(|e| e.to_string())?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("Failed to read request: {e}"))?;
    let request: OperationRequest =
        serde_json::from_str(&input).map_err(|e| format!("Invalid request: {e}"))?;

    let result = gateway.execute(request).map_err(|e| e.to_string())?;
    let output = serde_json::to_string_pretty(&result)
        .map_err(|e| format!("Failed to encode result: {e}"))?;
    writeln!(io::stdout(), "{output}").map_err(|e| format!("Failed to write result: {e}"))
}
