//! m365-packager - builds and publishes Microsoft 365 Apps packages.
//!
//! Edits the deployment configuration, packages it with the installer into an
//! `.intunewin` archive, writes the manifest, and publishes to Intune when a
//! newer version is available.

use std::process;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match m365_packager::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    process::exit(exit_code);
}
