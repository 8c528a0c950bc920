use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vid2article::cli::{Cli, Commands, ConfigAction};
use vid2article::config::Config;
use vid2article::output::{self, RunReport};
use vid2article::pipeline::{Pipeline, PipelineState, Session};
use vid2article::transcribe::HttpTranscriptSource;
use vid2article::{render, resolve, utils, FailureReason};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Convert {
            input,
            transcript_file,
            output,
            no_render,
            json,
        } => {
            let config = Config::load()?.with_backend_url(cli.backend_url)?;
            let pipeline = Pipeline::from_config(&config)?;
            let started = Instant::now();

            let progress = Progress::track(&pipeline, cli.quiet);
            let session = pipeline.run_automatic(&input).await;
            progress.finish();

            let session = if session.manual_input_open() {
                if let Some(reason) = &session.failure {
                    eprintln!("{} {}", style("⚠").yellow(), reason);
                }
                let text = read_manual_transcript(transcript_file.as_deref()).await?;

                let progress = Progress::track(&pipeline, cli.quiet);
                let session = pipeline.run_manual(&text).await;
                progress.finish();
                session
            } else {
                session
            };

            finish_run(&session, &config, output.as_deref(), no_render, json, started.elapsed())?;
        }
        Commands::Manual {
            file,
            output,
            no_render,
            json,
        } => {
            let config = Config::load()?.with_backend_url(cli.backend_url)?;
            let pipeline = Pipeline::from_config(&config)?;
            let started = Instant::now();

            let text = read_manual_transcript(file.as_deref()).await?;
            let progress = Progress::track(&pipeline, cli.quiet);
            let session = pipeline.run_manual(&text).await;
            progress.finish();

            finish_run(&session, &config, output.as_deref(), no_render, json, started.elapsed())?;
        }
        Commands::Resolve { input } => {
            let reference = resolve(&input)?;
            println!("{}", reference);
        }
        Commands::Render { file, html } => {
            utils::check_file_accessible(&file)?;
            let markdown = fs_err::read_to_string(&file).context("Failed to read markdown file")?;
            let document = render::render(&markdown);
            if html {
                print!("{}", document.to_html());
            } else {
                println!("{}", document.to_terminal());
            }
        }
        Commands::Health => {
            let config = Config::load()?.with_backend_url(cli.backend_url)?;
            let source = HttpTranscriptSource::new(&config.backend)?;
            let health = source
                .health()
                .await
                .with_context(|| format!("Backend at {} is not reachable", config.backend.base_url))?;

            if !health.is_ok() {
                anyhow::bail!("Backend reported status {:?}: {}", health.status, health.message);
            }
            println!("{} {} ({})", style("✓").green(), health.message, config.backend.base_url);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => Config::load()?.display(),
            ConfigAction::Path => println!("{}", Config::config_path()?.display()),
            ConfigAction::Init => {
                let path = Config::config_path()?;
                if path.exists() {
                    anyhow::bail!("Config file already exists: {}", path.display());
                }
                let path = Config::default().save()?;
                println!("Configuration written to: {}", path.display());
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "vid2article=debug"
    } else {
        "vid2article=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Spinner following the pipeline's stage labels
struct Progress {
    bar: Option<ProgressBar>,
    watcher: Option<JoinHandle<()>>,
}

impl Progress {
    fn track(pipeline: &Pipeline, quiet: bool) -> Self {
        if quiet || !std::io::stderr().is_terminal() {
            return Self {
                bar: None,
                watcher: None,
            };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(pipeline.snapshot().state.label());

        let mut rx = pipeline.subscribe();
        let watcher = tokio::spawn({
            let bar = bar.clone();
            async move {
                while rx.changed().await.is_ok() {
                    let label = rx.borrow_and_update().state.label();
                    bar.set_message(label);
                }
            }
        });

        Self {
            bar: Some(bar),
            watcher: Some(watcher),
        }
    }

    fn finish(self) {
        if let Some(watcher) = self.watcher {
            watcher.abort();
        }
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Transcript text from a file, or from stdin when no file is given
async fn read_manual_transcript(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        utils::check_file_accessible(path)?;
        return fs_err::read_to_string(path).context("Failed to read transcript file");
    }

    if std::io::stdin().is_terminal() {
        eprintln!(
            "{}",
            style("Paste the transcript below, then press Ctrl-D (Ctrl-Z on Windows):").bold()
        );
        eprintln!("  On YouTube: open the video, \"...\" → \"Show transcript\", copy the text.");
    }

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("Failed to read transcript from stdin")?;

    tracing::debug!("Manual transcript: {}", utils::preview(&text, 60));
    Ok(text)
}

fn finish_run(
    session: &Session,
    config: &Config,
    output: Option<&Path>,
    no_render: bool,
    json: bool,
    elapsed: Duration,
) -> Result<()> {
    if json {
        println!("{}", RunReport::new(session, elapsed).to_json()?);
    }

    match &session.state {
        PipelineState::Completed => {
            let artifact = output::export(session, &config.output.file_name)?;
            let article = session
                .article
                .as_ref()
                .ok_or(vid2article::ConverterError::NothingToExport)?;

            match output {
                Some(path) => {
                    let written: PathBuf = output::save_to_file(&artifact, path)?;
                    let sections = render::render(article.as_str()).headings().count();
                    eprintln!(
                        "{} Article saved to: {} ({} sections, {} words, {})",
                        style("✓").green(),
                        written.display(),
                        sections,
                        utils::word_count(article.as_str()),
                        utils::format_duration(elapsed.as_secs_f64())
                    );
                }
                None if !json => output::print_to_console(article, !no_render),
                None => {}
            }
            Ok(())
        }
        PipelineState::Failed(reason) => Err(reason.clone().into()),
        _ => Err(session
            .failure
            .clone()
            .unwrap_or(FailureReason::EmptyManualInput)
            .into()),
    }
}
