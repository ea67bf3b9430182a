use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;

use vibe_review::capability::{GeminiCapability, ReplayCapability, ReviewCapability};
use vibe_review::cli::{self, Commands, Overrides, ReviewArgs};
use vibe_review::config::VibeConfig;
use vibe_review::logging::{self, LogSink};
use vibe_review::pipeline::{ReviewOutcome, ReviewPipeline, Session};
use vibe_review::prompt::output_schema;
use vibe_review::tui::{App, run_tui};

fn main() -> Result<ExitCode> {
    let args = cli::parse_args();

    let sink = match args.command {
        Commands::Tui(_) => LogSink::File(logging::default_log_file()),
        _ => LogSink::Stderr,
    };
    logging::init_tracing(args.quiet, args.verbose, sink)?;

    match args.command {
        Commands::Review(review_args) => {
            let config = load_config(&review_args.overrides)?;
            runtime()?.block_on(handle_review(&config, review_args))
        }
        Commands::Tui(tui_args) => {
            let config = load_config(&tui_args.overrides)?;
            let runtime = runtime()?;
            let pipeline = ReviewPipeline::from_config(&config, gemini(&config)?)?;
            let app = App::new(
                pipeline,
                &config.leaderboard,
                runtime.handle().clone(),
                tui_args.url,
            );
            run_tui(app)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&output_schema())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Prompt(prompt_args) => {
            let config = load_config(&prompt_args.overrides)?;
            // The request is only built, never sent.
            let pipeline =
                ReviewPipeline::from_config(&config, Arc::new(ReplayCapability::new("")))?;
            match runtime()?.block_on(pipeline.prepare(&prompt_args.url)) {
                Ok(prepared) => {
                    println!("{}", prepared.request.instruction_document);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Load configuration and apply command-line overrides.
fn load_config(overrides: &Overrides) -> Result<VibeConfig> {
    let mut config = VibeConfig::load_with_dotenv().context("Failed to load configuration")?;
    if let Some(model) = &overrides.model {
        config.reviewer.model = model.clone();
    }
    if let Some(api_base) = &overrides.api_base {
        config.github.api_base = api_base.clone();
    }
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

fn gemini(config: &VibeConfig) -> Result<Arc<dyn ReviewCapability>> {
    let key = config
        .reviewer_key()
        .context("Set GEMINI_API_KEY or reviewer.api_key to call the reviewer")?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(
        GeminiCapability::new(client, config.reviewer.endpoint.as_str(), key)
            .with_temperature(config.reviewer.temperature),
    ))
}

/// Review each URL in order, folding successes into one session.
async fn handle_review(config: &VibeConfig, args: ReviewArgs) -> Result<ExitCode> {
    let capability: Arc<dyn ReviewCapability> = match &args.replay {
        Some(path) => {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read replay file {}", path.display()))?;
            Arc::new(ReplayCapability::new(payload))
        }
        None => gemini(config)?,
    };
    let pipeline = ReviewPipeline::from_config(config, capability)?;
    let mut session = Session::new();

    let mut outcomes = Vec::new();
    let mut errors = Vec::new();

    for url in &args.urls {
        match session.review(&pipeline, url).await {
            Ok(outcome) => {
                if !args.json {
                    print_outcome(outcome);
                }
                outcomes.push(outcome.clone());
            }
            Err(e) => {
                let message = e.user_message();
                if !args.json {
                    eprintln!("Error reviewing {url}: {message}");
                }
                errors.push(serde_json::json!({ "input": url, "message": message }));
            }
        }
    }

    if args.json {
        let report = serde_json::json!({
            "outcomes": outcomes,
            "errors": errors,
            "leaderboard": session.leaderboard().entries(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !session.leaderboard().is_empty() {
        println!("Top Smashed Repos");
        for (rank, entry) in session.leaderboard().entries().iter().enumerate() {
            println!(
                "  {:>2}. {:<40} reviews: {:<3} bugs: {:<4} last: {}",
                rank + 1,
                entry.repo_key,
                entry.review_count,
                entry.bugs_found,
                entry.last_score
            );
        }
    }

    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_outcome(outcome: &ReviewOutcome) {
    let result = &outcome.result;
    println!("{}: {}", outcome.repo, result.overall_score.headline());
    println!(
        "  score: {} (rule-derived: {})",
        outcome.score.reported, outcome.score.derived
    );
    println!("  files: {}", outcome.files.join(", "));

    if !result.good_vibes.is_empty() {
        println!("  Good Vibes Checklist");
        for check in &result.good_vibes {
            let mark = if check.passed { "✓" } else { "✗" };
            println!("    {mark} {}", check.check);
        }
    }

    if result.findings.is_empty() {
        println!("  No vulnerabilities found. That's a clean vibe!");
    } else {
        println!("  Detailed Breakdown");
        for finding in &result.findings {
            println!(
                "    [{}] {}: {}",
                finding.severity.badge(),
                finding.category.label(),
                finding.description
            );
            println!("        Why: {}", finding.impact);
            println!("        Fix: {}", finding.remediation);
        }
    }
    println!();
}
