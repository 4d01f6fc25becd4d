use crate::err;
use crate::error::GroundedError;
use clap::Parser;
use std::{fmt::Display, str::FromStr, time::Duration};

/// Title shown at the top of every chat surface.
pub const PAGE_TITLE: &str = "Startup Intelligence Assistant";
/// Line shown below the title when a session starts.
pub const INTRO: &str =
    "Ask me anything about the startup dataset (funding, city, founders, relationships, milestones, etc.)";
/// Hint shown in the input field.
pub const INPUT_PLACEHOLDER: &str =
    "Ask a startup-related question (e.g., 'Which startups were founded in 2012?')";
/// Shown while a question is being answered.
pub const WORKING_INDICATOR: &str = "Analyzing startup dataset...";

/// The default address to listen on.
const DEFAULT_ADDRESS: &str = "0.0.0.0:42069";
/// The default Ollama server.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// The default model answering questions.
pub const DEFAULT_GENERATION_MODEL: &str = "gemma3:1b";
/// The default embedding provider.
const DEFAULT_EMBEDDING_PROVIDER: &str = "ollama";
/// The default Qdrant gRPC endpoint.
const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
/// The default collection holding the startup dataset.
pub const DEFAULT_COLLECTION: &str = "startups";
/// The default amount of records retrieved per question.
pub const DEFAULT_RETRIEVAL_LIMIT: u32 = 5;
/// The default amount of seconds a session is kept without questions or reads.
const DEFAULT_SESSION_IDLE_TIMEOUT: u64 = 3600;

#[derive(Debug, Clone, Parser)]
#[command(name = "grounded", author = "grounded", version = "0.1", about = "Chat with the startup dataset", long_about = None)]
pub struct StartArgs {
    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Address to listen on.
    #[arg(short, long)]
    address: Option<String>,

    /// CORS allowed origins.
    #[arg(long)]
    cors_allowed_origins: Option<String>,

    /// Ollama URL, used for generating answers and, when selected, for embeddings.
    #[arg(long)]
    ollama_url: Option<String>,

    /// Model answering the questions.
    #[arg(long)]
    generation_model: Option<String>,

    /// Embedding provider used for questions and records.
    #[arg(long)]
    embedding_provider: Option<String>,

    /// Embedding model. Defaults to the provider's default model.
    #[arg(long)]
    embedding_model: Option<String>,

    /// Qdrant URL.
    #[arg(short, long)]
    qdrant_url: Option<String>,

    /// Vector collection holding the dataset records.
    #[arg(short, long)]
    collection: Option<String>,

    /// Amount of records to retrieve for every question.
    #[arg(long)]
    retrieval_limit: Option<u32>,

    /// Seconds after which an unused session is dropped.
    #[arg(long)]
    session_idle_timeout: Option<u64>,
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and either default or return `None` if neither the argument nor the environment variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
    ($id:ident, $var:literal, optional) => {
        impl StartArgs {
            pub fn $id(&self) -> Option<String> {
                match &self.$id {
                    Some(val) => Some(val.to_string()),
                    None => std::env::var($var).ok(),
                }
            }
        }
    };
}

impl StartArgs {
    pub fn allowed_origins(&self) -> Vec<String> {
        let origins = match &self.cors_allowed_origins {
            Some(origins) => origins.clone(),
            None => std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
        };
        csv_to_vec(&origins)
    }

    pub fn retrieval_limit(&self) -> Result<u32, GroundedError> {
        match self.retrieval_limit {
            Some(limit) => positive("retrieval limit", limit),
            None => match std::env::var("RETRIEVAL_LIMIT") {
                Ok(limit) => parse_positive("RETRIEVAL_LIMIT", &limit),
                Err(_) => Ok(DEFAULT_RETRIEVAL_LIMIT),
            },
        }
    }

    pub fn session_idle_timeout(&self) -> Result<Duration, GroundedError> {
        let secs = match self.session_idle_timeout {
            Some(secs) => positive("session idle timeout", secs)?,
            None => match std::env::var("SESSION_IDLE_TIMEOUT") {
                Ok(secs) => parse_positive("SESSION_IDLE_TIMEOUT", &secs)?,
                Err(_) => DEFAULT_SESSION_IDLE_TIMEOUT,
            },
        };
        Ok(Duration::from_secs(secs))
    }

    #[cfg(feature = "openai")]
    pub fn open_ai_key(&self) -> Result<String, GroundedError> {
        match std::env::var("OPENAI_KEY") {
            Ok(key) => Ok(key),
            Err(_) => err!(ParseConfig, "Missing OPENAI_KEY in env"),
        }
    }
}

arg!(log,                "RUST_LOG",           default "info".to_string());
arg!(address,            "ADDRESS",            default DEFAULT_ADDRESS.to_string());
arg!(ollama_url,         "OLLAMA_URL",         default DEFAULT_OLLAMA_URL.to_string());
arg!(generation_model,   "GENERATION_MODEL",   default DEFAULT_GENERATION_MODEL.to_string());
arg!(embedding_provider, "EMBEDDING_PROVIDER", default DEFAULT_EMBEDDING_PROVIDER.to_string());
arg!(embedding_model,    "EMBEDDING_MODEL",    optional);
arg!(qdrant_url,         "QDRANT_URL",         default DEFAULT_QDRANT_URL.to_string());
arg!(collection,         "COLLECTION",         default DEFAULT_COLLECTION.to_string());

fn positive<T>(name: &str, value: T) -> Result<T, GroundedError>
where
    T: Default + PartialEq,
{
    if value == T::default() {
        return err!(ParseConfig, "{name} must be greater than 0");
    }
    Ok(value)
}

/// Parse a numeric environment value, rejecting zero.
fn parse_positive<T>(var: &str, value: &str) -> Result<T, GroundedError>
where
    T: FromStr + Default + PartialEq,
    T::Err: Display,
{
    match value.trim().parse::<T>() {
        Ok(value) => positive(var, value),
        Err(e) => err!(ParseConfig, "{var}: invalid value '{value}'; {e}"),
    }
}

fn csv_to_vec(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter_map(|o| (!o.is_empty()).then_some(String::from(o)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GroundedErr;

    #[test]
    fn flags_take_precedence() {
        let args = StartArgs::parse_from([
            "grounded",
            "--collection",
            "Startups_2024",
            "--retrieval-limit",
            "12",
            "--cors-allowed-origins",
            "http://localhost:3000, ,http://localhost:5173",
        ]);

        assert_eq!("Startups_2024", args.collection());
        assert_eq!(12, args.retrieval_limit().unwrap());
        assert_eq!(
            vec!["http://localhost:3000", "http://localhost:5173"],
            args.allowed_origins()
        );
    }

    #[test]
    fn zero_retrieval_limit_is_rejected() {
        let args = StartArgs::parse_from(["grounded", "--retrieval-limit", "0"]);
        assert!(args.retrieval_limit().is_err());

        let args = StartArgs::parse_from(["grounded", "--session-idle-timeout", "0"]);
        assert!(args.session_idle_timeout().is_err());
    }

    #[test]
    fn session_idle_timeout_is_in_seconds() {
        let args = StartArgs::parse_from(["grounded", "--session-idle-timeout", "90"]);
        assert_eq!(Duration::from_secs(90), args.session_idle_timeout().unwrap());
    }

    #[test]
    fn malformed_env_values_are_configuration_errors() {
        let err = parse_positive::<u32>("RETRIEVAL_LIMIT", "five").unwrap_err();
        assert!(matches!(err.error, GroundedErr::ParseConfig(_)));
        assert!(err.to_string().contains("RETRIEVAL_LIMIT"));

        let err = parse_positive::<u64>("SESSION_IDLE_TIMEOUT", "-1").unwrap_err();
        assert!(matches!(err.error, GroundedErr::ParseConfig(_)));

        let err = parse_positive::<u32>("RETRIEVAL_LIMIT", "0").unwrap_err();
        assert!(matches!(err.error, GroundedErr::ParseConfig(_)));

        assert_eq!(7, parse_positive::<u32>("RETRIEVAL_LIMIT", " 7 ").unwrap());
    }
}
