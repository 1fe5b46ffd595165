//! # SIP2 CLI Entry Point
//!
//! Main binary for the SIP2 daemon and client. Provides a command-line
//! interface for running an ACS and for talking to one.
//!
//! ## Usage
//!
//! ```bash
//! # Start a daemon on the default address (SIP2_BIND or 0.0.0.0:6001)
//! sip2 serve
//!
//! # Start a daemon that insists on checksums and sequence numbers
//! sip2 serve -b 127.0.0.1:6001 --strict-checksum --strict-sequence
//!
//! # Query ACS status (outputs raw JSON)
//! sip2 status --server 127.0.0.1:6001
//!
//! # Check out an item
//! sip2 send 11 --server 127.0.0.1:6001 \
//!   --fields '{"patron_identifier": "2000000", "item_identifier": "300000000"}'
//! ```
//!
//! Without `--server`, client commands read `SIP2_SERVER` and then fall back
//! to `127.0.0.1:6001`.

use anyhow::{Context, Result};
use argh::FromArgs;
use std::sync::Arc;
use std::time::Duration;

use sip2_cli::json;
use sip2_client::{Connection, ConnectionConfig};
use sip2_common::{catalog, Message};
use sip2_server::{bind_addr_from_env, Daemon, DemoDriver, SessionConfig};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// SIP2 - Standard Interchange Protocol 2 daemon and client
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
///
/// - **Serve**: Run an ACS daemon backed by the demo driver
/// - **Send**: Send one request and print the response as JSON
/// - **Status**: Perform the SC status exchange
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Send(SendArgs),
    Status(StatusArgs),
}

/// Arguments for running the daemon.
///
/// # Example
///
/// ```bash
/// sip2 serve -b 0.0.0.0:6001 --institution MAIN --idle-timeout-secs 300
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run a SIP2 daemon
struct ServeArgs {
    /// address to bind the daemon to
    ///
    /// Defaults to SIP2_BIND, then "0.0.0.0:6001". The actual bound
    /// address is logged at startup.
    #[argh(option, short = 'b')]
    bind: Option<String>,

    /// seconds a session may sit idle before it is closed
    ///
    /// Sessions never time out when omitted.
    #[argh(option, long = "idle-timeout-secs")]
    idle_timeout_secs: Option<u64>,

    /// require a checksum on every request
    #[argh(switch, long = "strict-checksum")]
    strict_checksum: bool,

    /// require sequence numbers on every request
    #[argh(switch, long = "strict-sequence")]
    strict_sequence: bool,

    /// institution id reported by the demo driver
    #[argh(option, long = "institution", default = "\"\".into()")]
    institution: String,

    /// library name reported in ACS status
    #[argh(option, long = "library-name")]
    library_name: Option<String>,

    /// screen message attached to every response
    #[argh(option, long = "screen-message")]
    screen_message: Option<String>,
}

/// Arguments for sending a single request.
///
/// Opens one connection, performs a single exchange with the configured
/// retry policy, and prints the response as raw JSON on stdout. Errors go
/// to stderr with a non-zero exit code.
///
/// # Example
///
/// ```bash
/// sip2 send 63 -f '{"patron_identifier": "2000000", "summary": "Y         "}' | jq .fields
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "send")]
/// send one SIP2 request and print the response
struct SendArgs {
    /// two-character command code of the request (e.g. 11 for checkout)
    #[argh(positional)]
    code: String,

    /// server address as host:port
    #[argh(option, short = 's', long = "server")]
    server: Option<String>,

    /// JSON object of field values
    ///
    /// Flags are booleans, counts are numbers, lists are arrays of strings
    /// and timestamps are "YYYY-MM-DD HH:MM:SS" or "now". A missing
    /// transaction_date is set to the current time. Defaults to `{}`.
    #[argh(option, short = 'f', long = "fields", default = "\"{}\".into()")]
    fields: String,

    /// append and verify checksums
    #[argh(switch, long = "strict-checksum")]
    strict_checksum: bool,

    /// append and verify sequence numbers
    #[argh(switch, long = "strict-sequence")]
    strict_sequence: bool,

    /// milliseconds to wait for each response
    #[argh(option, long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// extra attempts after a transient failure
    #[argh(option, long = "retries")]
    retries: Option<u32>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
/// query the ACS status
struct StatusArgs {
    /// server address as host:port
    #[argh(option, short = 's', long = "server")]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // send/status print JSON on stdout, keep them free of log lines
    if matches!(cli.command, Commands::Serve(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Send(args) => run_send(args).await,
        Commands::Status(args) => run_status(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let bind = args.bind.clone().unwrap_or_else(bind_addr_from_env);
    let config = SessionConfig::new()
        .with_idle_timeout(args.idle_timeout_secs.map(Duration::from_secs))
        .with_strict_checksum(args.strict_checksum)
        .with_strict_sequence(args.strict_sequence);

    let mut driver = DemoDriver::new().with_institution_id(args.institution);
    if let Some(name) = args.library_name {
        driver = driver.with_library_name(name);
    }
    if let Some(message) = args.screen_message {
        driver = driver.with_screen_message(message);
    }

    let daemon = Daemon::bind(&bind, config).await?;
    tracing::info!("SIP2 daemon listening on {}", daemon.local_addr()?);
    if args.strict_checksum || args.strict_sequence {
        tracing::info!(
            "Error detection forced: checksum={} sequence={}",
            args.strict_checksum,
            args.strict_sequence
        );
    }

    daemon
        .run_until(Arc::new(driver), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

/// Executes the `send` subcommand.
///
/// Parses the field JSON, builds the request, performs one exchange and
/// prints the decoded response as raw JSON.
async fn run_send(args: SendArgs) -> Result<()> {
    let fields = json::parse_fields(&args.fields)?;
    let request = json::from_json(&args.code, &fields)?;

    let mut config = client_config(args.server.as_deref())?
        .with_strict_checksum(args.strict_checksum)
        .with_strict_sequence(args.strict_sequence);
    if let Some(ms) = args.timeout_ms {
        config = config.with_idle_timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = args.retries {
        config = config.with_retry_attempts(retries);
    }

    let response = exchange(config, &request).await?;
    println!("{}", serde_json::to_string(&json::to_json(&response))?);
    Ok(())
}

async fn run_status(args: StatusArgs) -> Result<()> {
    let config = client_config(args.server.as_deref())?;
    let request = Message::new(&catalog::SC_STATUS);
    let response = exchange(config, &request).await?;
    println!("{}", serde_json::to_string(&json::to_json(&response))?);
    Ok(())
}

fn client_config(server: Option<&str>) -> Result<ConnectionConfig> {
    let config = match server {
        Some(addr) => ConnectionConfig::from_addr(addr)?,
        None => ConnectionConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

async fn exchange(config: ConnectionConfig, request: &Message) -> Result<Message> {
    let addr = config.addr();
    let mut connection = Connection::new(config);
    connection
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;

    let result = connection.send(request).await;
    connection.disconnect().await?;
    Ok(result?)
}
