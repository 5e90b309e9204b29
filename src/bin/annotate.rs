//! annotate - run the fusion pipeline once on a still image
//!
//! Writes the annotated JPEG and prints the detections as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use roadsight::{codec, runtime::build_handler, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Annotate a single image with fused detections")]
struct Args {
    /// Input image (JPEG or PNG).
    input: PathBuf,

    /// Where to write the annotated JPEG.
    #[arg(short, long, default_value = "annotated.jpg")]
    output: PathBuf,

    /// JSON configuration file.
    #[arg(long, env = "ROADSIGHT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::load_from(args.config.as_deref())?;
    let handler = build_handler(&config, None)?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let frame = codec::decode_image_bytes(&bytes)?;
    let output = handler.pipeline().run(frame)?;

    let jpeg = codec::encode_jpeg(&output.frame, config.jpeg_quality)?;
    std::fs::write(&args.output, jpeg)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!(
        "{} detections, annotated image written to {}",
        output.detections.len(),
        args.output.display()
    );

    println!("{}", serde_json::to_string_pretty(&output.detections)?);
    Ok(())
}
