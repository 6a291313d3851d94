use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use assist_core::{
    load_settings_from, AssistSession, DraftOutcome, MatchMode, MatchView, NoMatchCause,
    SubmitOutcome,
};
use clap::{Parser, Subcommand};
use shared::domain::{ConversationTail, ParticipantId, ProfileRole};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod seed;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = assist_core::config::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draft an onboarding bio once and print the bio field.
    DraftBio {
        #[arg(long)]
        role: ProfileRole,
        #[arg(long)]
        keywords: String,
        #[arg(long)]
        tone: Option<String>,
    },
    /// Search the seed catalog.
    Match {
        #[arg(long)]
        semantic: bool,
        #[arg(default_value = "")]
        query: String,
    },
    /// Replay the seed transcript and print the resulting reply suggestion.
    SuggestReply {
        #[arg(long, default_value = seed::BRAND_ID)]
        viewer: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings_from(&cli.config);
    if let Command::DraftBio {
        tone: Some(tone), ..
    } = &cli.command
    {
        settings.bio_tone = tone.clone();
    }

    let session = AssistSession::connect(&settings, Arc::new(seed::catalog()))?;
    info!(
        model = %settings.model,
        credential = session.gateway.has_credential(),
        "assist session ready"
    );

    match cli.command {
        Command::DraftBio { role, keywords, .. } => {
            match session.bio_drafts.draft(role, &keywords).await {
                DraftOutcome::Written { text, source } => {
                    println!("bio ({source:?}):\n{text}");
                }
                DraftOutcome::Ignored(reason) => {
                    return Err(anyhow!("draft ignored: {reason:?}"));
                }
            }
        }
        Command::Match { semantic, query } => {
            let mode = if semantic {
                MatchMode::Semantic
            } else {
                MatchMode::Literal
            };
            session.matcher.set_mode(mode).await;
            match session.matcher.submit(&query).await? {
                SubmitOutcome::Applied(view) => print_view(&view),
                SubmitOutcome::Discarded => println!("match superseded"),
            }
        }
        Command::SuggestReply { viewer } => {
            let role = if viewer == seed::BRAND_ID {
                ProfileRole::Brand
            } else {
                ProfileRole::Creator
            };
            let viewer = ParticipantId::new(viewer);
            let transcript = seed::transcript();

            let (tx, rx) = broadcast::channel(transcript.len().max(1));
            let subscription = session.replies.subscribe(rx);
            for end in 1..=transcript.len() {
                if let Some(tail) =
                    ConversationTail::from_transcript(viewer.clone(), role, &transcript[..end])
                {
                    tx.send(tail)?;
                }
            }
            drop(tx);
            subscription.await?;

            let deadline = tokio::time::Instant::now() + settings.request_timeout();
            while session.replies.is_pending().await && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }

            match session.replies.suggestion().await {
                Some(suggestion) => println!("suggestion: {suggestion}"),
                None => println!("no suggestion"),
            }
        }
    }

    Ok(())
}

fn print_view(view: &MatchView) {
    match view {
        MatchView::AllCreators(entries) | MatchView::Matches(entries) => {
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t${}-${}",
                    entry.id,
                    entry.name,
                    entry.niches.join(", "),
                    entry.price.min,
                    entry.price.max
                );
            }
        }
        MatchView::NoMatches(NoMatchCause::Empty) => println!("no results"),
        MatchView::NoMatches(NoMatchCause::Failed(failure)) => {
            println!("no results ({failure})")
        }
    }
}
