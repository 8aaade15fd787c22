//! interior-design - image generation API for interior design prompts

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use interior_design::config::{Config, ConfigOptions};
use interior_design::enhancer::{KnowledgeTables, PromptEnhancer};
use interior_design::generation::{GenerationPipeline, StableDiffusionClient};
use interior_design::DesignServer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "interior-design")]
#[command(about = "Interior design image generation API with prompt enhancement")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Print the enhanced version of a prompt and exit
    Enhance {
        /// Raw prompt text
        prompt: String,

        /// Seed for the perspective choice (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the design suggestion tables as JSON
    Suggestions,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Base URL of the Stable Diffusion WebUI API
    #[arg(long, env = "INTERIOR_BACKEND_URL")]
    backend_url: String,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(long)]
    port: Option<u16>,

    /// Per-image render timeout in seconds
    #[arg(long)]
    render_timeout: Option<u64>,

    /// Maximum images per request
    #[arg(long)]
    max_images: Option<usize>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// JPEG quality for returned images (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Sampler name passed to the backend
    #[arg(long)]
    sampler: Option<String>,

    /// Negative prompt passed to the backend
    #[arg(long)]
    negative_prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `enhance` and `suggestions` output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Enhance { prompt, seed } => {
            let enhancer = PromptEnhancer::default();
            let enhanced = match seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    enhancer.enhance_with_rng(&prompt, &mut rng)
                }
                None => enhancer.enhance(&prompt),
            };
            println!("{}", enhanced);
            Ok(())
        }
        Command::Suggestions => {
            let tables = KnowledgeTables::shared();
            println!("{}", serde_json::to_string_pretty(tables.as_ref())?);
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = Config::new(
        args.backend_url,
        ConfigOptions {
            host: args.host,
            port: args.port,
            render_timeout: args.render_timeout,
            max_images: args.max_images,
            max_body_bytes: args.max_body_bytes,
            jpeg_quality: args.jpeg_quality,
            sampler: args.sampler,
            negative_prompt: args.negative_prompt,
        },
    )?;

    info!("Using render backend: {}", config.backend_url);

    let generator = Arc::new(StableDiffusionClient::new(&config)?);
    let pipeline = Arc::new(GenerationPipeline::new(
        generator,
        PromptEnhancer::default(),
    ));
    let server = DesignServer::new(config, pipeline);

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
