use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "iqs",
    version,
    about = "Ask an interception query service whether a request is intercepted"
)]
struct Cli {
    /// Query service base URL
    #[arg(long, env = "IQS_API_URL", default_value = "http://localhost:9980")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Should the caller consume the request here? Prints a bare boolean
    ConsumeHere(QueryArgs),
    /// Full intercept status, including metadata
    InterceptInfo(QueryArgs),
    /// List builtin extensions and their interception mechanisms
    Extensions {
        /// Only show this extension (e.g. "/builtin/ambassador")
        #[arg(long)]
        name: Option<String>,
        /// Image registry of the builtin images
        #[arg(long, env = "IQS_IMAGE_REGISTRY")]
        registry: Option<String>,
        /// Cloud host serving extension images
        #[arg(long, env = "IQS_CLOUD_HOST")]
        cloud_host: Option<String>,
        /// Cloud port serving extension images
        #[arg(long, env = "IQS_CLOUD_PORT")]
        cloud_port: Option<u16>,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Value for the intercept-id correlation header
    #[arg(long)]
    intercept_id: Option<String>,
    /// Value for the caller-intercept-id correlation header
    #[arg(long)]
    caller_intercept_id: Option<String>,
    /// Extra header (repeatable): --header NAME=VALUE
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,
    /// Print compact JSON
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::ConsumeHere(args) => commands::query::consume_here(&cli.api_url, &args).await,
        Commands::InterceptInfo(args) => {
            commands::query::intercept_info(&cli.api_url, &args).await
        }
        Commands::Extensions {
            name,
            registry,
            cloud_host,
            cloud_port,
        } => commands::extensions::list(name.as_deref(), registry, cloud_host, cloud_port),
    };

    std::process::exit(code);
}
