//! `munch` binary: load configuration, open the registry, serve the API.

use std::process::ExitCode;

use munch_lib::api::{build_context, serve, ServerError};
use munch_lib::config::{load_dotenv, AppConfig, APP_NAME, APP_VERSION};

fn main() -> ExitCode {
    let env_file = load_dotenv();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("munch: configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    munch_lib::init_tracing(&config.log_filter);
    tracing::info!("{} starting v{}", APP_NAME, APP_VERSION);
    if let Some(path) = &env_file {
        tracing::info!(path = %path.display(), "Loaded .env");
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Munch stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(config: AppConfig) -> Result<(), ServerError> {
    // The blocking oracle client must be created and dropped outside the
    // async runtime, so the context is built here and outlives `block_on`.
    let ctx = build_context(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)?;
    runtime.block_on(serve(ctx.clone(), config.bind, &config.allowed_origin))?;

    drop(runtime);
    drop(ctx);
    Ok(())
}
