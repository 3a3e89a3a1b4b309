use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use sftp_message_exchange::{
    exchange::message_exchanger::MessageExchanger,
    sftp::{sftp_exchanger_config::SftpExchangerConfig, sftp_message_exchanger::SftpMessageExchanger},
};

/// Validates a new connection with the remote endpoint by receiving one message and sending a
/// test message.
#[derive(Parser, Debug)]
#[command(name = "sftp-exchange-validator", version)]
struct Args {
    #[arg(long, default_value = "settings_and_keys/ConnectionSettings.txt", help = "Path of the four line settings file")]
    settings: PathBuf,
    #[arg(long, help = "Remote endpoint as host or host:port (default: sftp-eu.amazonsedi.com:2222)")]
    host: Option<String>,
    #[arg(long, help = "Accept the server key without checking known_hosts")]
    insecure_accept_host_key: bool,
    #[arg(long, default_value = "This is a test.", help = "Text of the test message")]
    message: String,
    #[arg(long, default_value = "ConnectivityTest", help = "File name of the test message in the upload directory")]
    destination: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
    let args = Args::parse();

    let passphrase = match rpassword::prompt_password("Passphrase for the private keys: ") {
        Ok(passphrase) => passphrase,
        Err(err) => {
            eprintln!("Could not read the passphrase: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut builder = SftpExchangerConfig::builder()
    .settings_file(&args.settings)
    .passphrase(passphrase)
    .accept_any_host_key(args.insecure_accept_host_key);

    if let Some(host) = &args.host {
        builder = builder.host(host);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut exchanger = match SftpMessageExchanger::connect(config).await {
        Ok(exchanger) => exchanger,
        Err(err) => {
            eprintln!("{:#}", anyhow::Error::from(err));
            return ExitCode::FAILURE;
        }
    };
    println!("Connection created with no errors.");

    let result = validate(&mut exchanger, &args).await;
    exchanger.close().await;

    match result {
        Ok(()) => {
            println!("Validation completed with no errors.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn validate(exchanger: &mut SftpMessageExchanger, args: &Args) -> anyhow::Result<()> {
    match exchanger.receive_now().await? {
        Some(message) => println!("Received message:\n{}", message),
        None => println!("There are no messages to be received."),
    }

    exchanger.send_as(&args.message, &args.destination).await?;
    println!("Sent test message as upload/{}.", args.destination);
    Ok(())
}
