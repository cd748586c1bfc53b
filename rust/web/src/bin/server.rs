//! Standalone blackjack table server
//!
//! Usage: cargo run -p blackjack_web --bin blackjack-web-server -- --data-dir ./profiles

use blackjack_web::{init_logging, LogFormat, ServerConfig, WebServer};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let mut host = "127.0.0.1".to_string();
    let mut port = 8080u16;
    let mut static_dir: Option<PathBuf> = None;
    let mut data_dir: Option<PathBuf> = None;
    let mut log_format = LogFormat::Pretty;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--help" {
            print_help();
            return Ok(());
        }
        let Some(value) = args.get(i + 1) else {
            eprintln!("Error: {flag} requires a value");
            print_help();
            std::process::exit(2);
        };
        match flag {
            "--host" | "-h" => host = value.clone(),
            "--port" | "-p" => {
                port = value.parse().unwrap_or_else(|_| {
                    eprintln!("Error: invalid port number `{value}`");
                    std::process::exit(2);
                });
            }
            "--static-dir" | "-d" => static_dir = Some(PathBuf::from(value)),
            "--data-dir" => data_dir = Some(PathBuf::from(value)),
            "--log-format" => {
                log_format = value.parse().unwrap_or_else(|err| {
                    eprintln!("Error: {err}");
                    std::process::exit(2);
                });
            }
            _ => {
                eprintln!("Unknown argument: {flag}");
                print_help();
                std::process::exit(2);
            }
        }
        i += 2;
    }

    init_logging(log_format)?;

    // Without a directory on disk the embedded table page is served.
    let static_path = match static_dir {
        Some(dir) => dir,
        None => {
            let current_dir = std::env::current_dir()?;
            [
                current_dir.join("rust").join("web").join("static"),
                current_dir.join("static"),
            ]
            .into_iter()
            .find(|p| p.exists())
            .unwrap_or_else(|| current_dir.join("static"))
        }
    };

    let mut config = ServerConfig::new(host, port, static_path);
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }

    tracing::info!(
        host = config.host(),
        port = config.port(),
        static_dir = %config.static_dir().display(),
        data_dir = ?config.data_dir(),
        "starting blackjack server"
    );

    let server = WebServer::new(config)?;
    let handle = server.start().await?;

    println!("\nTable open at http://{}", handle.address());
    println!("Press Ctrl+C to stop\n");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;

    Ok(())
}

fn print_help() {
    println!("Blackjack Web Server");
    println!();
    println!("Usage: blackjack-web-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host, -h <HOST>           Host to bind to (default: 127.0.0.1)");
    println!("  --port, -p <PORT>           Port to bind to (default: 8080)");
    println!("  --static-dir, -d <DIR>      Static files directory");
    println!("  --data-dir <DIR>            Where named profiles are saved (default: in memory)");
    println!("  --log-format <FORMAT>       pretty or json (default: pretty)");
    println!("  --help                      Show this help message");
}
