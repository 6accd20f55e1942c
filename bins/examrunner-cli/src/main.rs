mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "examrunner-cli")]
#[command(about = "Examrunner CLI - Run and grade submissions, manage language versions", long_about = None)]
struct Cli {
    /// Execution service base URL (overrides EXECUTION_API_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file against a test case file
    Run {
        /// Language name as understood by the execution service (e.g. python, java)
        #[arg(short, long)]
        language: String,

        /// Source file to execute
        #[arg(short, long)]
        file: String,

        /// JSON file with an array of {input, expectedOutput} test cases
        #[arg(short, long)]
        cases: String,
    },

    /// Grade a whole exam attempt from an answers file
    Grade {
        /// JSON file with an array of {questionId, language, sourceCode, testCases}
        #[arg(short, long)]
        answers: String,
    },

    /// List languages and their pinned versions
    ListLangs,

    /// Pin a language to a specific runtime version
    Pin {
        /// Language name
        #[arg(short, long)]
        name: String,

        /// Runtime version (e.g. 3.10.0)
        #[arg(short, long)]
        version: String,
    },

    /// Remove a version pin so the newest runtime is used
    Unpin {
        /// Language name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = examrunner_common::Config::from_env();
    if let Some(url) = cli.url {
        config.execution_api_url = url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Commands::Run { language, file, cases } => {
            commands::run_file(&config, &language, &file, &cases).await?;
        }
        Commands::Grade { answers } => {
            commands::grade_answers(&config, &answers).await?;
        }
        Commands::ListLangs => {
            commands::list_languages(&config)?;
        }
        Commands::Pin { name, version } => {
            commands::pin_language(&config, &name, &version)?;
        }
        Commands::Unpin { name } => {
            commands::unpin_language(&config, &name)?;
        }
    }

    Ok(())
}
