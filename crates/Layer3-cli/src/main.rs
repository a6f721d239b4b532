//! skillbox CLI - Main entry point

mod output;

use clap::{Parser, Subcommand};
use output::Printer;
use skillbox_core::{GitCli, SkillCommands, DEFAULT_HISTORY_LIMIT};
use skillbox_foundation::StoreConfig;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// skillbox - git-backed local skill store
#[derive(Parser, Debug)]
#[command(name = "skillbox")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List local skills
    List,
    /// Create a new skill from the manifest template
    Init {
        /// Skill name (letters, digits, `-`, `_`)
        name: String,
    },
    /// Delete a skill or a file inside it
    Delete {
        /// `@skill` or `@skill/path`
        reference: String,
    },
    /// Copy a skill under a new name
    Copy { source: String, destination: String },
    /// Rename a skill
    Rename { source: String, destination: String },
    /// Print a file, list a directory, or show the manifest
    View {
        /// `@skill` or `@skill/path`
        reference: String,
    },
    /// Copy a skill or one of its files out of the store
    Download {
        reference: String,
        destination: PathBuf,
    },
    /// Write a local file into an existing skill
    Upsert {
        local_file: PathBuf,
        /// `@skill/path`
        reference: String,
        /// Commit body
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Browse and add skills from GitHub or local directories
    Remote {
        #[command(subcommand)]
        command: RemoteCommand,
    },
    /// Revert the most recent change
    Undo,
    /// Show recent changes, newest first
    History {
        /// Entries to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Entries to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum RemoteCommand {
    /// List skills offered by `github.com@owner/repo` or `localhost@path`
    List { repo: String },
    /// Add `<repo>@<skill>` to the store
    Add {
        reference: String,
        /// Local name for the added skill
        #[arg(long)]
        rename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let printer = Printer::new(args.json);
    if let Err(e) = run(args.command, &printer).await {
        printer.error(&e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, printer: &Printer) -> anyhow::Result<()> {
    let config = StoreConfig::from_env()?;
    let commands = SkillCommands::new(config.clone(), GitCli::new(&config));
    debug!("Running {:?}", command);

    match command {
        Command::List => printer.skills(&commands.list()?)?,
        Command::Init { name } => printer.report(&commands.init(&name).await?)?,
        Command::Delete { reference } => printer.report(&commands.delete(&reference).await?)?,
        Command::Copy {
            source,
            destination,
        } => printer.report(&commands.copy(&source, &destination).await?)?,
        Command::Rename {
            source,
            destination,
        } => printer.report(&commands.rename(&source, &destination).await?)?,
        Command::View { reference } => printer.view(&commands.view(&reference).await?)?,
        Command::Download {
            reference,
            destination,
        } => printer.download(&commands.download(&reference, &destination).await?)?,
        Command::Upsert {
            local_file,
            reference,
            message,
        } => printer.report(
            &commands
                .upsert(&local_file, &reference, message.as_deref())
                .await?,
        )?,
        Command::Remote { command } => match command {
            RemoteCommand::List { repo } => printer.remote(&commands.remote_list(&repo).await?)?,
            RemoteCommand::Add { reference, rename } => printer.report(
                &commands
                    .remote_add(&reference, rename.as_deref())
                    .await?,
            )?,
        },
        Command::Undo => printer.undo(&commands.undo().await?)?,
        Command::History { offset, limit } => {
            printer.history(&commands.history(offset, limit).await?)?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_verify() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_history_defaults() {
        let args = Args::try_parse_from(["skillbox", "history"]).unwrap();
        match args.command {
            Command::History { offset, limit } => {
                assert_eq!(offset, 0);
                assert_eq!(limit, DEFAULT_HISTORY_LIMIT);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_remote_add_with_rename() {
        let args = Args::try_parse_from([
            "skillbox",
            "--json",
            "remote",
            "add",
            "github.com@anthropics/skills@pdf",
            "--rename",
            "my-pdf",
        ])
        .unwrap();
        assert!(args.json);
        match args.command {
            Command::Remote {
                command: RemoteCommand::Add { reference, rename },
            } => {
                assert_eq!(reference, "github.com@anthropics/skills@pdf");
                assert_eq!(rename.as_deref(), Some("my-pdf"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_upsert_message() {
        let args = Args::try_parse_from([
            "skillbox", "upsert", "notes.md", "@pdf/notes.md", "-m", "why",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Upsert { message: Some(ref m), .. } if m == "why"
        ));
    }
}
