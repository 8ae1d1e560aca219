//! Command-line interface
//!
//! Runs the server, classifies local files and produces credential hashes.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{InferenceConfig, InferenceEngine};
use crate::security::{generate_password_hash, DEFAULT_ROUNDS};
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    eprintln!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cifar10-serve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CIFAR-10 image classification service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default when no command is given)
    Serve {
        /// Address to bind (defaults to $HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to $PORT or 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// ONNX model file (defaults to $MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Classify a local image file and print the prediction as JSON
    Classify {
        /// Image file (PNG, JPEG or GIF)
        image: PathBuf,

        /// ONNX model file (defaults to $MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Apply softmax to the model output
        #[arg(long)]
        softmax: bool,
    },

    /// Print a password hash for use in a credentials file
    HashPassword {
        password: String,

        /// PBKDF2 iterations
        #[arg(long, default_value_t = DEFAULT_ROUNDS)]
        rounds: u32,
    },
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { host, port, model }) => cmd_serve(host, port, model).await,
        Some(Commands::Classify { image, model, softmax }) => {
            tokio::task::spawn_blocking(move || cmd_classify(&image, model, softmax)).await?
        }
        Some(Commands::HashPassword { password, rounds }) => {
            cmd_hash_password(&password, rounds);
            Ok(())
        }
        None => cmd_serve(None, None, None).await,
    }
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(model) = model {
        config.inference.model_path = model;
    }

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "CIFAR-10 Classifier".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("http://{}:{}/", config.host, config.port)));
    line_box(&kv("Upload ", &format!("http://{}:{}/predict", config.host, config.port)));
    line_box(&kv("Health ", &format!("http://{}:{}/health", config.host, config.port)));
    line_box(&kv("Model  ", &config.inference.model_path.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

pub fn cmd_classify(image: &Path, model: Option<PathBuf>, softmax: bool) -> anyhow::Result<()> {
    let mut config = InferenceConfig::default();
    if let Some(model) = model {
        config.model_path = model;
    }
    config.apply_softmax |= softmax;

    let start = Instant::now();
    let engine = InferenceEngine::load(config)?;
    step_ok(&format!("model loaded in {:.0?}", start.elapsed()));

    let bytes = std::fs::read(image)?;
    let start = Instant::now();
    let prediction = engine.classify(&bytes)?;
    step_ok(&format!(
        "{} classified as {} ({:.1}%) in {:.0?}",
        image.display(),
        prediction.class,
        prediction.confidence * 100.0,
        start.elapsed()
    ));

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

pub fn cmd_hash_password(password: &str, rounds: u32) {
    println!("{}", generate_password_hash(password, rounds));
}
