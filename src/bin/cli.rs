use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use clap::Subcommand;
use reqwest::Url;
use tokio::io::AsyncReadExt;

use scam_radar::analysis::prompt::SYSTEM_PROMPT;
use scam_radar::{AnalysisRequest, AnalysisResult, HttpErrorResponse};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a job posting with a running server
    Analyze {
        /// Base URL of the server
        #[clap(short, long, env = "SCAM_RADAR_URL", default_value = "http://127.0.0.1:25566")]
        url: String,

        /// File holding the job posting, stdin when omitted
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Print the raw JSON response instead of a summary
        #[clap(long)]
        json: bool,
    },
    /// Print the instructions sent to the model with every posting
    Prompt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.cmd {
        Commands::Analyze { url, file, json } => {
            let posting = read_posting(file).await?;
            let result = analyze(&url, posting).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
        Commands::Prompt => println!("{SYSTEM_PROMPT}"),
    }
    Ok(())
}

async fn read_posting(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut posting = String::new();
            tokio::io::stdin().read_to_string(&mut posting).await?;
            Ok(posting)
        }
    }
}

/// Resolves the analyze route under `base`, keeping any path prefix it has.
fn analyze_endpoint(base: &str) -> Result<Url> {
    let mut base = Url::parse(base).with_context(|| format!("Invalid server URL {base}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("analyze-job")?)
}

async fn analyze(base: &str, posting: String) -> Result<AnalysisResult> {
    let endpoint = analyze_endpoint(base)?;
    let response = reqwest::Client::new()
        .post(endpoint)
        .json(&AnalysisRequest::new(posting))
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    match response.json::<HttpErrorResponse>().await {
        Ok(body) => bail!("{} ({})", body.error, status),
        Err(_) => Err(anyhow!("Server responded with {}", status)),
    }
}

fn print_summary(result: &AnalysisResult) {
    println!("Score: {}/100 ({})", result.score, result.band());
    println!("\n{}", result.explanation);
    if !result.factors.is_empty() {
        println!("\nFactors:");
        for factor in &result.factors {
            println!("  - {factor}");
        }
    }
}
