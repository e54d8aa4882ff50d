//! Binary entry point: parse arguments, initialize logging, hand off to
//! the application façade and translate its outcome into an exit code.

use tracing_subscriber::EnvFilter;

use domainscope::app::App;
use domainscope::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    // RUST_LOG wins over the -v ladder when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match App::run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
