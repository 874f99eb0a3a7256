// Command-line surface. With no subcommand the binary runs the summary.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "draftcast", version, about = "Fantasy draft league dashboard data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Generate the caption bundle for the dashboard (default)
    Summary,
    /// Print the league's standings as served by the league API
    Standings,
    /// Print the league's squads as served by the league API
    Squads,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Summary)
    }
}
