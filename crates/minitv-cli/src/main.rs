//! minitv — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use minitv::MiniTvExtractor;
use minitv_cli::config::resolve_client_config;
use minitv_cli::render::render_summary;

/// Exit status for content the provider withholds.
const EXIT_NOT_AVAILABLE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "minitv",
    about = "Extract metadata and DASH formats from Amazon miniTV pages",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// HTTP request timeout in milliseconds.
    /// Also reads from MINITV_TIMEOUT_MS env var.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// User agent sent with every request.
    /// Also reads from MINITV_USER_AGENT env var.
    #[arg(long, global = true)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the media record for a page URL.
    Extract {
        /// Page URL, e.g. https://www.amazon.in/minitv/tp/<id>
        url: String,

        /// Print the full record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a URL is supported and print its page id.
    Check {
        /// Page URL.
        url: String,
    },

    /// Print extractor details as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   minitv completions bash > ~/.local/share/bash-completion/completions/minitv
    ///   minitv completions zsh > ~/.zfunc/_minitv
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract { url, json } => {
            let config = resolve_client_config(cli.timeout_ms, cli.user_agent.as_deref());
            let extractor = MiniTvExtractor::with_config(&config)?;

            match extractor.extract(&url).await {
                Ok(record) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                    } else {
                        print!("{}", render_summary(&record));
                    }
                }
                Err(e) if e.is_expected() => {
                    eprintln!("{e}");
                    std::process::exit(EXIT_NOT_AVAILABLE);
                }
                Err(e) => {
                    tracing::error!(url = %url, "extraction failed: {e}");
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Check { url } => match minitv::page_id(&url) {
            Ok(id) => println!("Supported: {id}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },

        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&minitv::info())?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "minitv", &mut std::io::stdout());
        }
    }

    Ok(())
}
