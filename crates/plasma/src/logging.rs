use std::io;

use plasma_util_error::{Whatever, WhateverResult};
use snafu::FromString as _;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Env var overriding the log filter, in `EnvFilter` directive syntax
pub const PLASMA_LOG_ENV: &str = "PLASMA_LOG";

/// Log to stderr, so stdout carries only command output
pub fn init_logging(verbose: bool) -> WhateverResult<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var(PLASMA_LOG_ENV)
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
