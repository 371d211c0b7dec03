//! icmark: IC marking OCR and authenticity check.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI, load config, init logger
//!   3. Read the marking (OCR over the ROI, or `--text`)
//!   4. Validate with the first configured backend
//!   5. Print the report

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::{info, warn};

use icmark::config::{self, Config};
use icmark::error::AppError;
use icmark::imaging::preprocess::save_png;
use icmark::imaging::{self, CropRect, PreprocessOptions};
use icmark::logger;
use icmark::ocr::{Recognizer, TesseractRecognizer};
use icmark::validation::Validator;
use icmark::validation::report::{self, Report};

#[derive(Parser)]
#[command(name = "icmark")]
#[command(about = "Read the marking on an IC photo and check whether it looks genuine")]
#[command(version)]
struct Cli {
    /// Photo of the chip
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    image: Option<PathBuf>,

    /// Region of interest in pixels: X,Y,W,H
    #[arg(long, value_name = "X,Y,W,H")]
    crop: Option<CropRect>,

    /// Skip histogram equalization
    #[arg(long)]
    no_contrast: bool,

    /// Skip adaptive thresholding
    #[arg(long)]
    no_binarize: bool,

    /// Skip median denoising
    #[arg(long)]
    no_denoise: bool,

    /// Write the preprocessed ROI to this PNG
    #[arg(long, value_name = "PATH")]
    save_roi: Option<PathBuf>,

    /// Tesseract executable
    #[arg(long, value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Webhook delegate URL
    #[arg(long, value_name = "URL", value_parser = parse_url)]
    webhook: Option<String>,

    /// Validate this text instead of running OCR
    #[arg(long)]
    text: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Config file [default: config/default.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level for this run; overrides RUST_LOG and the config
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level, conflicts_with = "verbose")]
    log_level: Option<String>,

    /// More logging: -v debug, -vv trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_log_level(s: &str) -> Result<String, String> {
    logger::parse_level(s)
        .map(|_| s.trim().to_string())
        .map_err(|e| e.to_string())
}

fn parse_url(s: &str) -> Result<String, String> {
    url::Url::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| format!("invalid URL '{s}': {e}"))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Optional file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;

    let (effective_log_level, from_cli) = log_level(&cli, &config);
    logger::init(&effective_log_level, from_cli)?;
    apply_cli(&cli, &mut config);

    info!(
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        gemini = config.gemini_api_key.is_some(),
        deepseek = config.deepseek_api_key.is_some(),
        search = config.serpapi_key.is_some(),
        webhook = config.webhook.url.is_some(),
        "config loaded"
    );

    let text = match &cli.text {
        Some(t) => t.trim().to_string(),
        None => read_marking(&cli, &config)?,
    };

    let validator = Validator::from_config(&config)?;
    let result = validator.validate(&text);

    if cli.json {
        let out = serde_json::to_string_pretty(&Report::new(&text, &result))
            .map_err(|e| AppError::Output(e.to_string()))?;
        println!("{out}");
    } else {
        println!("OCR text:\n{}\n", if text.is_empty() { "(none)" } else { &text });
        print!("{}", report::render_text(&result));
    }
    Ok(())
}

/// `--log-level` or `-v` when given, else the configured level.
fn log_level(cli: &Cli, config: &Config) -> (String, bool) {
    match cli.log_level.as_deref().or(logger::verbosity_level(cli.verbose)) {
        Some(level) => (level.to_string(), true),
        None => (config.log_level.clone(), false),
    }
}

fn apply_cli(cli: &Cli, config: &mut Config) {
    if let Some(cmd) = &cli.tesseract {
        config.ocr.tesseract_cmd = cmd.clone();
    }
    if let Some(url) = &cli.webhook {
        config.webhook.url = Some(url.clone());
    }
    let p = &mut config.preprocess;
    p.contrast &= !cli.no_contrast;
    p.binarize &= !cli.no_binarize;
    p.denoise &= !cli.no_denoise;
}

/// Load, crop, clean up and recognize. Only the image and a missing
/// recognizer are fatal; a failed recognition yields empty text.
fn read_marking(cli: &Cli, config: &Config) -> Result<String, AppError> {
    let Some(path) = cli.image.as_deref() else {
        return Err(AppError::Config("an image path or --text is required".into()));
    };

    let image = imaging::load_image(path)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");

    let roi = imaging::crop(&image, cli.crop);
    let bitmap = imaging::preprocess_roi(&roi, PreprocessOptions::from(config.preprocess));
    if let Some(out) = &cli.save_roi {
        save_png(&bitmap, out)?;
        info!(path = %out.display(), "preprocessed ROI saved");
    }

    let recognizer = TesseractRecognizer::from_config(&config.ocr);
    recognizer.check_available()?;
    match recognizer.recognize(&bitmap) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(error = %e, "recognition failed; continuing with empty text");
            Ok(String::new())
        }
    }
}
