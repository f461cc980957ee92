//! Arkive Web Server
//!
//! Backend for the hierarchical document archive.

use clap::Parser;

use arkive_web::{ArkiveServer, WebConfig};

/// Arkive Web Server - hierarchical document archive backend
#[derive(Parser)]
#[command(name = "arkive-web")]
#[command(about = "Backend server for the arkive document archive")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables before reading config from them.
    dotenvy::dotenv().ok();

    arkive_core::init_logging(&format!(
        "arkive_web={},arkive_access={},tower_http=info",
        args.log_level, args.log_level
    ));

    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    println!("🚀 Starting Arkive Web Server");
    println!("📍 Server: http://{}", config.address());
    println!("🗄️  Database: {}", config.database_url);

    let server = match ArkiveServer::new(config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parsing_defaults_and_overrides() {
        let args = Args::parse_from(["arkive-web"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert_eq!(args.log_level, "info");

        let args = Args::parse_from(["arkive-web", "--host", "0.0.0.0", "--port", "3000"]);
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(3000));
    }
}
