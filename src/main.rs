use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use idps_client::{urls, ClientConfig, ImageClient, ImageService};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "idps")]
#[command(about = "Upload, fetch and delete images on an IDPS image server")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload an image file and print its id.
    Upload {
        path: PathBuf,
        /// Display name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 0)]
        min_width: u32,
        #[arg(long, default_value_t = 0)]
        min_height: u32,
    },
    /// Download an image to a file.
    Download {
        image_id: String,
        #[arg(long = "type", value_name = "EXT")]
        image_type: String,
        #[arg(long)]
        scale: Option<String>,
        /// Output path; defaults to `<id>[_<scale>]<ext>` in the current directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete an image.
    Delete { image_id: String },
    /// Print the public URL of an image.
    Url {
        image_id: String,
        #[arg(long = "type", value_name = "EXT")]
        image_type: String,
        #[arg(long)]
        scale: Option<String>,
    },
    /// Print the auth token for the configured identity.
    Token,
}

fn display_name(path: &Path, name: Option<String>) -> Result<String> {
    match name {
        Some(name) => Ok(name),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a name from {}", path.display())),
    }
}

fn default_output(image_id: &str, image_type: &str, scale: Option<&str>) -> PathBuf {
    PathBuf::from(urls::image_file_name(image_id, image_type, scale))
}

async fn run(client: &ImageClient, command: Command) -> Result<()> {
    match command {
        Command::Upload {
            path,
            name,
            min_width,
            min_height,
        } => {
            let image = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = display_name(&path, name)?;
            let id = client
                .upload_image_with_min_size(&image, &name, min_width, min_height)
                .await?;
            println!("{}", id);
        }
        Command::Download {
            image_id,
            image_type,
            scale,
            output,
        } => {
            let output = output
                .unwrap_or_else(|| default_output(&image_id, &image_type, scale.as_deref()));
            let mut stream = client
                .get_image_stream(&image_id, &image_type, scale.as_deref())
                .await?;
            let mut file = tokio::fs::File::create(&output)
                .await
                .with_context(|| format!("Failed to create {}", output.display()))?;
            while let Some(chunk) = stream.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await?;
            info!("Saved {} to {}", image_id, output.display());
        }
        Command::Delete { image_id } => {
            let deleted = client.delete_image(&image_id).await?;
            println!("{}", deleted);
        }
        Command::Url {
            image_id,
            image_type,
            scale,
        } => {
            let url = match scale {
                Some(scale) => client.scaled_image_url(&image_id, &image_type, &scale),
                None => client.image_url(&image_id, &image_type),
            };
            println!("{}", url);
        }
        Command::Token => match client.create_token()? {
            Some(token) => println!("{}", token),
            None => println!("(no token: IDPS_PID is blank)"),
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idps=info,idps_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let client = ImageClient::new(ClientConfig::from_env()?)?;

    if let Err(e) = run(&client, args.command).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
