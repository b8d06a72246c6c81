//! Trustkit CLI - fetch URLs under an explicit trust policy
//!
//! Usage:
//!   trustkit auth encode alice 'pa:ss'          # Print a Basic header value
//!   trustkit auth decode 'Basic YWxpY2U6cGE6c3M='
//!   trustkit check-addr 127.0.0.1:8080          # local / remote
//!   trustkit fetch https://host/ --ca-cert ca.pem --local-only

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trustkit::{ClientOptions, HttpClient, Method, VerificationMode, auth};

/// Trustkit - outbound HTTP trust configuration
#[derive(Parser, Debug)]
#[command(name = "trustkit")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode or decode Basic auth header values
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Report whether a host:port address is local (loopback)
    CheckAddr {
        /// Address in host:port form, IPv6 hosts bracketed
        addr: String,
    },
    /// Fetch a URL and print the status line and body
    Fetch(FetchArgs),
}

#[derive(Subcommand, Debug)]
enum AuthAction {
    /// Print the header value for a username/password pair
    Encode { username: String, password: String },
    /// Print the username and password carried by a header value
    Decode { header: String },
}

#[derive(clap::Args, Debug)]
struct FetchArgs {
    /// URL to fetch (http or https)
    url: String,

    /// Skip certificate chain and hostname verification
    #[arg(short = 'k', long)]
    insecure: bool,

    /// PEM file with certificate authorities to trust (repeatable)
    #[arg(long = "ca-cert", value_name = "FILE")]
    ca_certs: Vec<PathBuf>,

    /// Refuse to dial anything but loopback addresses
    #[arg(long)]
    local_only: bool,

    /// Extra request header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Basic auth credentials, `user:password`
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = trustkit::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Only print the status line and headers
    #[arg(short = 'I', long)]
    head: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Auth { action } => run_auth(action),
        Command::CheckAddr { addr } => {
            let kind = if trustkit::is_local(&addr) {
                "local"
            } else {
                "remote"
            };
            println!("{}", kind);
            Ok(())
        }
        Command::Fetch(fetch) => run_fetch(fetch).await,
    }
}

fn run_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Encode { username, password } => {
            println!("{}", auth::encode(&username, &password));
        }
        AuthAction::Decode { header } => {
            // Credentials are raw bytes; write them out unchanged
            let creds = auth::decode(&header)?;
            let mut out = std::io::stdout().lock();
            for field in [&creds.username, &creds.password] {
                out.write_all(field)?;
                out.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

async fn run_fetch(args: FetchArgs) -> Result<()> {
    // Process-wide switch; the factory picks it up through the global policy
    trustkit::set_outgoing_access_allowed(!args.local_only);

    let mode = if args.insecure {
        VerificationMode::NoVerify
    } else {
        VerificationMode::Verify
    };

    tracing::debug!(
        url = %args.url,
        ?mode,
        ca_certs = args.ca_certs.len(),
        local_only = args.local_only,
        "fetch"
    );

    let mut builder = HttpClient::builder()
        .verification(mode)
        .options(ClientOptions::new().timeout(Duration::from_secs(args.timeout)));
    for path in &args.ca_certs {
        let pem = std::fs::read(path)
            .with_context(|| format!("Failed to read CA certificate: {}", path.display()))?;
        builder = builder.root_certificate_pem(pem);
    }
    let client = builder.build().context("Failed to build HTTP client")?;

    if let Some(pool) = client.root_pool() {
        if pool.is_empty() {
            eprintln!("trustkit: warning: no usable certificates in --ca-cert files");
        }
    }

    let mut headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()?;
    if let Some(user) = &args.user {
        let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
        headers.push(("Authorization".to_string(), auth::encode(username, password)));
    }

    let method = if args.head { Method::Head } else { Method::Get };
    let response = client
        .request_with_headers(method, &args.url, None, &headers)
        .await
        .with_context(|| format!("Failed to fetch {}", args.url))?;

    println!("HTTP {}", response.status);
    if args.head {
        for (name, value) in &response.headers {
            println!("{}: {}", name, value);
        }
    } else {
        print!("{}", response.body_string());
    }
    if !response.is_success() {
        std::process::exit(22);
    }
    Ok(())
}

/// Parse `Name: value` into a header pair.
fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("invalid header (expected 'Name: value'): {}", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid header (empty name): {}", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: text/plain").unwrap(),
            ("Accept".to_string(), "text/plain".to_string())
        );
        assert_eq!(
            parse_header("X-Empty:").unwrap(),
            ("X-Empty".to_string(), String::new())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_fetch_args() {
        let args = Args::try_parse_from([
            "trustkit",
            "fetch",
            "https://127.0.0.1:8443/",
            "-k",
            "--ca-cert",
            "a.pem",
            "--ca-cert",
            "b.pem",
            "--local-only",
            "-H",
            "Accept: */*",
        ])
        .unwrap();

        let Command::Fetch(fetch) = args.command else {
            panic!("expected fetch");
        };
        assert!(fetch.insecure);
        assert!(fetch.local_only);
        assert_eq!(fetch.ca_certs.len(), 2);
        assert_eq!(fetch.headers, vec!["Accept: */*".to_string()]);
        assert_eq!(fetch.timeout, trustkit::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
