use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::api::Noise;
use crate::error::MoveError;

#[derive(Parser, Debug)]
#[command(name = "move_division")]
#[command(version)]
#[command(about = "Move every record in the source divisions into the destination division")]
pub struct Cli {
    /// Repository identifier
    #[arg(value_name = "REPOSITORY_ID")]
    pub repository_id: String,

    /// Source divisions followed by the destination division
    #[arg(value_name = "DIVISION")]
    pub divisions: Vec<String>,

    /// Suppress progress and summary output
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Move without asking for confirmation
    #[arg(short, long, action = ArgAction::Count)]
    pub force: u8,

    /// Report each moved record
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file listing the known repositories
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// A validated invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub repository_id: String,
    pub sources: Vec<String>,
    pub destination: String,
    pub noise: Noise,
    pub force: bool,
    pub config: Option<PathBuf>,
}

impl Invocation {
    pub fn quiet(&self) -> bool {
        self.noise.is_silent()
    }
}

impl TryFrom<Cli> for Invocation {
    type Error = MoveError;

    /// Split the positionals into sources and destination
    ///
    /// At least one source and the destination must follow the repository.
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let mut divisions = cli.divisions;
        if divisions.len() < 2 {
            return Err(MoveError::usage(format!(
                "expected at least 3 arguments, got {}",
                divisions.len() + 1
            )));
        }

        let destination = divisions.pop().unwrap_or_default();
        Ok(Self {
            repository_id: cli.repository_id,
            sources: divisions,
            destination,
            noise: Noise::from_flags(cli.quiet, cli.verbose),
            force: cli.force > 0,
            config: cli.config,
        })
    }
}

/// Parse and validate a full argument list, program name first
///
/// Help and version requests come back as [`MoveError::Help`] carrying the
/// text to print; every other parse failure is a usage error.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, MoveError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => MoveError::Help(e.to_string()),
        _ => MoveError::usage(e.to_string()),
    })?;
    Invocation::try_from(cli)
}
