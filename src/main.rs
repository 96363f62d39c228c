use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{error, info};

use verifact::config::{GeminiArgs, GeminiConfig};
use verifact::render::render_text;
use verifact::web_server::{self, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use verifact::{chat, logging, GeminiClient, InlineImage, ResponseInterpreter, VerificationRequest};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    gemini: GeminiArgs,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web chat server.
    Serve {
        #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "static", help = "Directory served under /static.")]
        static_dir: PathBuf,
        #[arg(long, help = "Load templates from this directory and reload them on change.")]
        templates_dir: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, help = "Largest accepted request body in bytes.")]
        max_upload_bytes: usize,
    },
    /// Check a single message or screenshot and print the verdict.
    Check {
        /// Message text to verify.
        text: Option<String>,
        #[arg(long, help = "Screenshot to attach (png, jpg, webp, gif, heic).")]
        image: Option<PathBuf>,
        #[arg(long, help = "Print the result as JSON.")]
        json: bool,
    },
    /// Fact-check messages interactively in the terminal.
    Chat,
}

fn build_interpreter(args: GeminiArgs) -> Result<ResponseInterpreter> {
    let config = GeminiConfig::try_from(args)?;
    info!(model = %config.model, "Using Gemini model");
    let client = GeminiClient::new(config).context("Failed to initialize Gemini client")?;
    Ok(ResponseInterpreter::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for GEMINI_API_KEY and friends)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    info!("VeriFact starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve {
            port,
            static_dir,
            templates_dir,
            max_upload_bytes,
        } => {
            let interpreter = build_interpreter(cli.gemini)?;
            let config = ServerConfig {
                port,
                static_dir,
                templates_dir,
                max_upload_bytes,
            };

            let server = web_server::start_web_server(config, interpreter);
            tokio::select! {
                res = server => {
                    if let Err(e) = &res {
                        error!("Web server failed: {:?}", e);
                    }
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down.");
                }
            }
        }
        Commands::Check { text, image, json } => {
            let image = image
                .as_deref()
                .map(InlineImage::from_path)
                .transpose()?;
            let request = VerificationRequest::new(text.unwrap_or_default(), image)?;
            let interpreter = build_interpreter(cli.gemini)?;

            let result = interpreter.verify(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_text(&result));
            }
        }
        Commands::Chat => {
            let interpreter = build_interpreter(cli.gemini)?;
            let stdin = BufReader::new(tokio::io::stdin());
            chat::run_chat(&interpreter, stdin, tokio::io::stdout())
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
