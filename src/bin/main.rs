use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "foodgram-server")]
#[command(about = "Recipe sharing API server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "foodgram-server.yaml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load ingredients and tags from JSON files
    Import {
        #[arg(long)]
        ingredients: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "foodgram_rs=debug,tower_http=debug"
    } else {
        "foodgram_rs=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match args.command {
        Some(Command::Import { ingredients, tags }) => {
            foodgram_rs::import(&args.config, ingredients.as_deref(), tags.as_deref()).await
        }
        None => foodgram_rs::run(&args.config, args.debug).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
