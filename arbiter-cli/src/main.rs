mod app;
mod client;
mod error;
mod output;
mod session;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use app::{App, EvaluateInput, Status};
use client::{RulesClient, DEFAULT_SERVER_URL};
use error::CliError;
use output::render_error;
use session::SessionStore;

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "Create, combine and evaluate rules against the Arbiter service", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the rule service
    #[arg(long, global = true, env = "ARBITER_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,
    /// Directory holding the draft rows and the last shown rule
    #[arg(long, global = true, env = "ARBITER_STATE_DIR")]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a rule string into an AST
    Create {
        /// Rule such as "age > 30 AND department = 'Sales'"
        rule: String,
    },
    /// Combine several rules into one stored AST
    Combine {
        /// Rules to combine; defaults to the file or the draft rows
        rules: Vec<String>,
        /// Read rules from a .rules/.txt/.json/.yaml file or a directory
        #[arg(long, conflicts_with = "rules")]
        file: Option<PathBuf>,
    },
    /// Evaluate a rule AST against a JSON data record
    Evaluate(EvaluateArgs),
    /// Manage draft rule rows used by `combine`
    #[command(subcommand)]
    Draft(DraftCommands),
    /// Print a stored combined rule
    Show {
        rule_id: String,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// Data record as JSON
    #[arg(long, conflicts_with = "data_file", required_unless_present = "data_file")]
    data: Option<String>,
    #[arg(long)]
    data_file: Option<PathBuf>,
    /// Rule AST as JSON; defaults to the last rule shown
    #[arg(long, conflicts_with = "rule_file")]
    rule: Option<String>,
    #[arg(long)]
    rule_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Append a row, empty unless a rule is given
    Add { rule: Option<String> },
    /// Remove one row by id
    Remove { id: u64 },
    /// List the rows
    List,
    /// Remove every row
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = arbiter_core::logging::init_cli_tracing(None) {
        eprintln!("failed to initialise tracing: {err}");
    }
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(Status::Succeeded) => ExitCode::SUCCESS,
        Ok(Status::Failed) => ExitCode::FAILURE,
        Err(err) => {
            println!("{}", render_error(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Status, CliError> {
    let client = RulesClient::new(&cli.server)?;
    let session = SessionStore::open(cli.state_dir.as_deref())?;
    tracing::debug!(
        server = %client.base_url(),
        state = %session.path().display(),
        "arbiter cli ready"
    );
    let mut app = App::new(client, session, io::stdout());

    match cli.command {
        Commands::Create { rule } => app.create(&rule).await,
        Commands::Combine { rules, file } => app.combine(rules, file.as_deref()).await,
        Commands::Evaluate(args) => {
            let input = EvaluateInput {
                data: args.data,
                data_file: args.data_file,
                rule: args.rule,
                rule_file: args.rule_file,
            };
            app.evaluate(&input).await
        }
        Commands::Draft(DraftCommands::Add { rule }) => app.draft_add(rule),
        Commands::Draft(DraftCommands::Remove { id }) => app.draft_remove(id),
        Commands::Draft(DraftCommands::List) => app.draft_list(),
        Commands::Draft(DraftCommands::Clear) => app.draft_clear(),
        Commands::Show { rule_id } => app.show(&rule_id).await,
    }
}
