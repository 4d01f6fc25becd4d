use crate::{
    app::state::AppState,
    config::{StartArgs, INPUT_PLACEHOLDER, INTRO, PAGE_TITLE, WORKING_INDICATOR},
    core::{
        model::{Role, Turn},
        service::chat::Phase,
        session::SessionStore,
    },
    error::{GroundedErr, GroundedError},
    map_err,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "grounded", author = "grounded", version = "0.1", about = "Chat with the startup dataset", long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub start: StartArgs,

    #[command(subcommand)]
    pub command: Execute,
}

#[derive(Debug, Subcommand)]
pub enum Execute {
    /// Start an interactive session. `/history` prints the transcript, `/exit` ends the session.
    Chat,

    /// Answer a single question.
    Ask(AskArg),

    /// Load a CSV dataset into the vector collection.
    Ingest(IngestArg),
}

#[derive(Debug, Args, Clone)]
pub struct AskArg {
    /// The question to answer.
    pub question: String,
}

#[derive(Debug, Args, Clone)]
pub struct IngestArg {
    /// Path to a CSV file with a header row.
    #[arg(long, short)]
    pub path: PathBuf,

    /// Amount of records embedded per request.
    #[arg(long, short)]
    pub batch_size: Option<usize>,
}

const HISTORY: &str = "/history";
const EXIT: &str = "/exit";

pub async fn run(command: Execute, state: AppState) -> Result<(), GroundedError> {
    match command {
        Execute::Chat => chat(&state).await,

        Execute::Ask(AskArg { question }) => {
            let mut session = SessionStore::new();
            let reply = state.chat.ask_observed(&mut session, &question, indicator).await?;
            println!("{}", reply.answer);
            Ok(())
        }

        Execute::Ingest(IngestArg { path, batch_size }) => {
            let service = match batch_size {
                Some(size) => state.ingest.clone().with_batch_size(size),
                None => state.ingest.clone(),
            };
            let stored = service.ingest_file(&path).await?;
            println!("Stored {stored} record(s) from {}", path.display());
            Ok(())
        }
    }
}

async fn chat(state: &AppState) -> Result<(), GroundedError> {
    let mut session = SessionStore::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{PAGE_TITLE}\n\n{INTRO}\n{INPUT_PLACEHOLDER}\n");

    loop {
        map_err!(stdout.write_all(b"> ").await);
        map_err!(stdout.flush().await);

        let Some(line) = map_err!(lines.next_line().await) else {
            break;
        };

        match line.trim() {
            EXIT => break,

            HISTORY => {
                for turn in session.enumerate() {
                    println!("{}", render_turn(turn));
                }
            }

            question => match state.chat.ask_observed(&mut session, question, indicator).await {
                Ok(reply) => println!("{}\n", reply.answer),
                Err(GroundedError {
                    error: GroundedErr::EmptyInput,
                    ..
                }) => continue,
                Err(e) => return Err(e),
            },
        }
    }

    Ok(())
}

fn indicator(phase: Phase) {
    if phase == Phase::Retrieving {
        println!("{WORKING_INDICATOR}");
    }
}

/// Format a single turn of the transcript for display.
fn render_turn(turn: &Turn) -> String {
    let who = match turn.role() {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    format!(
        "[{}] {who}: {}",
        turn.created_at().format("%H:%M:%S"),
        turn.content()
    )
}

#[cfg(test)]
mod tests {
    use super::{render_turn, CliArgs, Execute, IngestArg};
    use crate::core::model::Turn;
    use clap::Parser;

    #[test]
    fn renders_turns_with_their_author() {
        let rendered = render_turn(&Turn::user("Who?"));
        assert!(rendered.ends_with("] You: Who?"));

        let rendered = render_turn(&Turn::assistant("StartupX"));
        assert!(rendered.ends_with("] Assistant: StartupX"));
    }

    #[test]
    fn parses_ingest_arguments() {
        let args = CliArgs::parse_from([
            "grounded",
            "--collection",
            "startups_test",
            "ingest",
            "--path",
            "startups.csv",
            "--batch-size",
            "16",
        ]);

        assert_eq!("startups_test", args.start.collection());

        let Execute::Ingest(IngestArg { path, batch_size }) = args.command else {
            panic!("expected ingest");
        };

        assert_eq!("startups.csv", path.to_str().unwrap());
        assert_eq!(Some(16), batch_size);
    }
}
