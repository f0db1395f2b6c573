//! `db-manager` entry point.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use db_manager::app::{self, CliArgs};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Diagnostics go to stderr; stdout carries the command protocol.
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;

    let result = runtime.block_on(app::run(args));
    // A pending stdin read holds a blocking thread until the next newline.
    runtime.shutdown_timeout(Duration::from_millis(100));

    result.wrap_err("db-manager failed")?;
    Ok(())
}
