/// steptrace command line
///
/// Interactive and headless front ends for the line-stepping debugger.
use steptrace_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
