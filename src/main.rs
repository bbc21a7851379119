use clap::Parser;
use slack_react_stats::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    slack_react_stats::init_logging(cli.verbose);

    // Another provider may already be installed; either is fine.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    if let Err(e) = slack_react_stats::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
