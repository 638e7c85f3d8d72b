use anyhow::{Context, Result};
use clap::Parser;
use jobnote_common::JobnoteError;
use jobnote_common::observability::{LogConfig, init_logging};
use jobnote_config::JobnoteConfigLoader;
use jobnote_llm::build_llm_client;
use jobnote_pipeline::Pipeline;
use jobnote_web::browser::WebDriverRenderer;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Save a job posting as a Markdown note.
#[derive(Debug, Parser)]
#[command(name = "jobnote", version)]
struct Args {
    /// Job posting URL; prompted for on stdin when omitted.
    url: Option<String>,

    /// YAML configuration file. Missing files are ignored.
    #[arg(long, short, env = "JOBNOTE_CONFIG", default_value = "jobnote.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // 1) Config (env wins); nothing touches the network before this passes.
    let cfg = match JobnoteConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
    {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{}: {err}", err.kind());
            return ExitCode::from(2);
        }
    };

    if let Err(err) = init_logging(LogConfig {
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        ..LogConfig::default()
    }) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    match run(args.url, cfg).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "run failed");
            eprintln!("{}", failure_report(&err));
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Configuration problems exit with 2, everything else with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<JobnoteError>() {
        Some(JobnoteError::Config(_)) => 2,
        _ => 1,
    }
}

/// Console line naming the error kind, followed by the raw model output
/// when extraction could not parse it.
fn failure_report(err: &anyhow::Error) -> String {
    let jobnote_err = err.downcast_ref::<JobnoteError>();
    let kind = jobnote_err.map_or("Error", JobnoteError::kind);
    let mut report = format!("{kind}: {err:#}");
    if let Some(JobnoteError::Extraction(failure)) = jobnote_err {
        if let Some(raw) = failure.raw_response() {
            report.push_str("\n--- raw model output ---\n");
            report.push_str(raw);
        }
    }
    report
}

async fn run(url: Option<String>, cfg: jobnote_common::JobnoteConfig) -> Result<PathBuf> {
    // Backend construction is still configuration; fail before prompting.
    let llm = build_llm_client(&cfg.llm)?;

    let url = match url {
        Some(url) => url,
        None => prompt_for_url().await?,
    };

    let renderer = Arc::new(WebDriverRenderer::new(cfg.browser.clone()));
    let pipeline = Pipeline::new(cfg, renderer, llm);

    let outcome = pipeline.run(&url).await?;
    tracing::info!(
        path = %outcome.path.display(),
        format = ?outcome.format_kind,
        "saved job posting"
    );
    Ok(outcome.path)
}

async fn prompt_for_url() -> Result<String> {
    print!("Enter the job posting URL: ");
    std::io::stdout().flush().context("flushing prompt")?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading URL from stdin")?;

    let url = line.trim();
    if url.is_empty() {
        anyhow::bail!("no URL given");
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobnote_common::ExtractionFailure;

    #[test]
    fn backend_construction_error_exits_like_config_error() {
        let err = anyhow::Error::from(JobnoteError::Config("bad base URL".into()));
        assert_eq!(exit_status(&err), 2);
        assert!(failure_report(&err).starts_with("ConfigurationError: "));

        let err = anyhow::Error::from(JobnoteError::SelectionEmpty);
        assert_eq!(exit_status(&err), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("no URL given")), 1);
    }

    #[test]
    fn decode_failure_report_includes_raw_output() {
        let err = anyhow::Error::from(JobnoteError::from(ExtractionFailure::JsonDecode {
            message: "expected value at line 1 column 1".into(),
            raw: "Sorry, I cannot help with that.".into(),
        }));
        let report = failure_report(&err);
        assert!(report.starts_with("ExtractionFailure: "));
        assert!(report.ends_with("Sorry, I cannot help with that."));

        let err = anyhow::Error::from(JobnoteError::from(ExtractionFailure::Backend(
            "timed out".into(),
        )));
        assert!(!failure_report(&err).contains("raw model output"));
    }
}
