//! Bankbot CLI - banking FAQ assistant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bankbot_assistant::{AskReply, Assistant, VoiceReply};
use bankbot_core::{BotConfig, KnowledgeBase, Language};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bankbot")]
#[command(about = "Banking FAQ assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./bankbot.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Knowledge base JSON file (overrides the config)
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Answer language (en, hi, kn)
        #[arg(short, long, default_value = "en")]
        language: Language,
        /// Skip speech synthesis
        #[arg(long)]
        no_audio: bool,
    },
    /// Ask a spoken question from a WAV file
    Speak {
        /// WAV recording of the question
        #[arg(long)]
        audio: PathBuf,
        /// Spoken and answer language (en, hi, kn)
        #[arg(short, long, default_value = "en")]
        language: Language,
        /// Skip speech synthesis
        #[arg(long)]
        no_audio: bool,
    },
    /// Interactive session over stdin
    Chat {
        /// Answer language (en, hi, kn)
        #[arg(short, long, default_value = "en")]
        language: Language,
    },
    /// List knowledge base topics
    Topics,
    /// Validate a knowledge base file
    Check {
        /// File to validate (defaults to the configured knowledge base)
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(verbose: bool) {
    // Answers go to stdout, logs stay on stderr.
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<BotConfig> {
    let mut config = BotConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    config.apply_env();
    if let Some(path) = &cli.knowledge {
        config.knowledge_path = Some(path.clone());
    }
    debug!(
        "Knowledge base: {}",
        config
            .knowledge_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );
    Ok(config)
}

fn load_knowledge(path: Option<&Path>) -> Result<KnowledgeBase> {
    match path {
        Some(path) => KnowledgeBase::load(path)
            .with_context(|| format!("Invalid knowledge base {}", path.display())),
        None => KnowledgeBase::builtin().context("Invalid built-in knowledge base"),
    }
}

fn build_assistant(config: &BotConfig) -> Result<Assistant> {
    let knowledge = load_knowledge(config.knowledge_path.as_deref())?;
    info!("Loaded {} topics", knowledge.len());
    Ok(Assistant::from_config(config, Arc::new(knowledge)))
}

fn print_ask(reply: &AskReply, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reply)?),
        OutputFormat::Text => {
            println!("{}", reply.response);
            if let Some(audio) = &reply.audio {
                println!("\nAudio: {}", audio);
            }
        }
    }
    Ok(())
}

fn print_voice(reply: &VoiceReply, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reply)?),
        OutputFormat::Text => {
            if let Some(query) = &reply.query {
                println!("You said: {}\n", query);
            }
            println!("{}", reply.response);
            if let Some(audio) = &reply.audio {
                println!("\nAudio: {}", audio);
            }
        }
    }
    Ok(())
}

async fn chat(assistant: &Assistant, language: Language, format: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("Ask me about banking. Type 'exit' to quit.");
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit(&line) {
            break;
        }

        let reply = assistant.ask(&line, language).await;
        print_ask(&reply, format)?;
        println!();
    }
    Ok(())
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Ask {
            question,
            language,
            no_audio,
        } => {
            if no_audio {
                config.speech.synthesis_enabled = false;
            }
            let assistant = build_assistant(&config)?;
            let reply = assistant.ask(&question.join(" "), language).await;
            print_ask(&reply, cli.format)?;
        }
        Commands::Speak {
            audio,
            language,
            no_audio,
        } => {
            if !config.speech.recognition_enabled {
                anyhow::bail!("Speech recognition is disabled (set speech.recognition_enabled)");
            }
            if no_audio {
                config.speech.synthesis_enabled = false;
            }
            let bytes = tokio::fs::read(&audio)
                .await
                .with_context(|| format!("Failed to read {}", audio.display()))?;

            let assistant = build_assistant(&config)?;
            let reply = assistant.speak(bytes, language).await;
            print_voice(&reply, cli.format)?;
        }
        Commands::Chat { language } => {
            let assistant = build_assistant(&config)?;
            chat(&assistant, language, cli.format).await?;
        }
        Commands::Topics => {
            let knowledge = load_knowledge(config.knowledge_path.as_deref())?;
            match cli.format {
                OutputFormat::Json => {
                    let keys: Vec<&str> = knowledge.iter().map(|t| t.key.as_str()).collect();
                    println!("{}", serde_json::to_string_pretty(&keys)?);
                }
                OutputFormat::Text => {
                    println!("Topics ({})", knowledge.len());
                    for topic in &knowledge {
                        println!("  {}", topic.key);
                    }
                }
            }
        }
        Commands::Check { file } => {
            let path = file.or(config.knowledge_path);
            let knowledge = load_knowledge(path.as_deref())?;
            let source = path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in knowledge base".to_string());
            println!("OK: {} topics in {}", knowledge.len(), source);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["bankbot", "ask", "-l", "HI", "what", "is", "upi"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                language,
                no_audio,
            } => {
                assert_eq!(question.join(" "), "what is upi");
                assert_eq!(language, Language::Hindi);
                assert!(!no_audio);
            }
            _ => panic!("expected ask"),
        }
        assert!(cli.format == OutputFormat::Text);
    }

    #[test]
    fn test_parse_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["bankbot", "ask", "--language", "fr", "loan"]).is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bankbot",
            "topics",
            "--format",
            "json",
            "--knowledge",
            "kb.json",
            "-v",
        ])
        .unwrap();
        assert!(cli.format == OutputFormat::Json);
        assert_eq!(cli.knowledge, Some(PathBuf::from("kb.json")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_is_exit() {
        assert!(is_exit("exit"));
        assert!(is_exit("  QUIT "));
        assert!(!is_exit("exit fees"));
    }

    #[test]
    fn test_load_knowledge_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "[]").unwrap();

        let err = load_knowledge(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("kb.json"));

        std::fs::write(&path, r#"[{"topic": "atm", "answer": "Cash machine."}]"#).unwrap();
        assert_eq!(load_knowledge(Some(path.as_path())).unwrap().len(), 1);
        assert!(load_knowledge(None).unwrap().len() > 1);
    }
}
