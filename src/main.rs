//! updater_release - build, sign and publish tauri updater artifacts.
//!
//! This binary drives the release pipeline from CI jobs and operator
//! machines, printing recovery suggestions when a step fails.

use std::process;

use updater_release::cli;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
