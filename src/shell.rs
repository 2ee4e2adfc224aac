use colored::*;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::client::MongoMcpClient;
use crate::error::Result;
use crate::ui::{panel, Tone};

const INTERRUPT_HINT: &str = "Use 'quit' to exit.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Quit,
    Help,
    Databases,
    Empty,
    Query(String),
}

impl ShellCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" => ShellCommand::Empty,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            "help" => ShellCommand::Help,
            "databases" => ShellCommand::Databases,
            _ => ShellCommand::Query(trimmed.to_string()),
        }
    }
}

pub fn welcome_text() -> String {
    format!(
        "{}\n\nAsk questions about your MongoDB data in plain English.\n\
         Type {} or {} to leave.\n\
         Type {} for example queries.",
        "MongoDB Natural Language Query Shell".bold().cyan(),
        "'quit'".bold(),
        "'exit'".bold(),
        "'help'".bold()
    )
}

pub fn help_text() -> String {
    format!(
        "{}\n\n\
         • How many documents are in the movies collection?\n\
         • What databases are available?\n\
         • Show me the schema for sample_mflix.movies\n\
         • What are the top 10 highest rated movies?\n\
         • Find movies directed by Christopher Nolan\n\
         • What's the average runtime by genre?\n\
         • How many movies were released each year since 2000?\n\n\
         {}\n\n\
         • {} - List all databases\n\
         • {} - Show this help\n\
         • {} - Exit the shell",
        "Example Queries:".bold(),
        "Special Commands:".bold(),
        "databases".cyan(),
        "help".cyan(),
        "quit".cyan()
    )
}

fn prompt() -> io::Result<()> {
    print!("\n{}: ", "You".bold().cyan());
    io::stdout().flush()
}

/// Read commands from `input` until `quit` or end of input.
///
/// Query failures are printed and the loop continues. Ctrl-C never ends
/// the shell: at the prompt it prints a hint, during a query it cancels the
/// query. Errors from `input` itself end the shell.
pub async fn run<R>(client: &mut MongoMcpClient, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", INTERRUPT_HINT.yellow());
                continue;
            }
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match ShellCommand::parse(&line) {
            ShellCommand::Quit => {
                println!("{}", "Goodbye!".yellow());
                break;
            }
            ShellCommand::Help => print!("{}", panel("Help", &help_text(), Tone::Blue)),
            ShellCommand::Empty => continue,
            ShellCommand::Databases => match client.list_databases().await {
                Ok(result) => println!("{}", result),
                Err(e) => println!("{} {}", "Query Error:".red(), e),
            },
            ShellCommand::Query(query) => {
                tokio::select! {
                    outcome = client.query(&query, None) => {
                        if let Err(e) = outcome {
                            println!("{} {}", "Query Error:".red(), e);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("\n{}", INTERRUPT_HINT.yellow());
                    }
                }
            }
        }
    }

    Ok(())
}

pub fn print_welcome() {
    print!("{}", panel("Welcome", &welcome_text(), Tone::Cyan));
}
