//! cmdhub command-line entry point

mod cli;

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {e:#}");
        process::exit(cli::exit_code(&e));
    }
}
