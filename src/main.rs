use clap::Parser;
use ssh_relay::cancel::CancelFlag;
use ssh_relay::cli::Cli;
use ssh_relay::ssh::SshClient;
use ssh_relay::{forward, logging, Result};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let spec = cli.forward_spec()?;
    let parsed_host = cli.parse_host();

    let client = SshClient::connect(&parsed_host, cli.ssh_port, cli.identity_file.clone()).await?;

    let cancel = CancelFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            ctrl_c_flag.cancel();
        }
    });

    let outcome = forward::run_tunnel(client.handle(), &spec, cancel).await?;
    info!(
        bytes = outcome.bytes_tunneled,
        reason = ?outcome.reason,
        "relay finished"
    );
    Ok(())
}
