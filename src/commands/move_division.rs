use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::io::{BufRead, Write};

use crate::api::{Filter, Platform, Record, RecordVisitor, Session, SqlitePlatform};
use crate::cli::{Invocation, parse_args};
use crate::config::Config;
use crate::error::MoveError;
use crate::ui::prompts::confirm;

/// Multi-valued field holding a record's divisions
pub const DIVISIONS_FIELD: &str = "divisions";

const SEPARATOR: &str =
    "------------------------------------------------------------------------";

/// What to move and where
#[derive(Debug, Clone)]
pub struct MoveOptions {
    pub sources: Vec<String>,
    pub destination: String,
    pub dataset: String,
    pub force: bool,
}

/// Outcome of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MoveSummary {
    /// Records moved across all confirmed sources
    pub moved: usize,
    /// Sources the user declined to move
    pub declined: Vec<String>,
}

/// Rewrites each visited record's divisions to the destination alone
struct MoveToDivision<'a, W> {
    destination: &'a str,
    verbose: bool,
    output: &'a mut W,
    moved: usize,
}

#[async_trait]
impl<'a, W: Write + Send> RecordVisitor for MoveToDivision<'a, W> {
    async fn visit(&mut self, record: &mut dyn Record) -> Result<()> {
        record.set_field(DIVISIONS_FIELD, vec![self.destination.to_string()]);
        record.commit().await?;
        self.moved += 1;

        debug!("Moved record {} to '{}'", record.id(), self.destination);
        if self.verbose {
            writeln!(self.output, "  moved record {}", record.id())?;
        }
        Ok(())
    }
}

/// Move every record in each source division into the destination division
///
/// Sources are processed in order. Unless `force` is set each source is
/// confirmed on `input` first; a declined source is left untouched. Each
/// record is committed on its own, so a failure part way leaves earlier
/// records moved.
///
/// # Arguments
/// * `session` - Open session against the repository
/// * `options` - Sources, destination, dataset and whether to skip confirmation
/// * `input` - Where confirmation answers are read from
/// * `output` - Where prompts, progress and the summary are written
///
/// # Returns
/// * `Ok(MoveSummary)` - All confirmed sources were moved
/// * `Err(anyhow::Error)` - Search, commit or input failure; the run stops there
pub async fn move_command<R, W>(
    session: &dyn Session,
    options: &MoveOptions,
    input: &mut R,
    output: &mut W,
) -> Result<MoveSummary>
where
    R: BufRead,
    W: Write + Send,
{
    let noise = session.noise();
    let dataset = session.dataset(&options.dataset)?;
    let mut summary = MoveSummary::default();

    info!(
        "Moving {:?} to '{}' in '{}' ({} dataset)",
        options.sources,
        options.destination,
        session.repository_id(),
        dataset
    );

    for source in &options.sources {
        let filters = [Filter::exact(DIVISIONS_FIELD, source.as_str())];
        let mut results = session.search(&dataset, &filters, true).await?;
        let count = results.count();
        info!("Found {} records in '{}'", count, source);

        if !options.force {
            let prompt = format!(
                "Move {} prints from {} to {}?",
                count, source, options.destination
            );
            if !confirm(input, output, &prompt)? {
                info!("Skipping '{}' at user request", source);
                summary.declined.push(source.clone());
                continue;
            }
        }

        if !noise.is_silent() {
            writeln!(
                output,
                "Moving {} prints from {} to {}...",
                count, source, options.destination
            )?;
            output.flush()?;
        }

        let mut mover = MoveToDivision {
            destination: &options.destination,
            verbose: noise.is_verbose(),
            output: &mut *output,
            moved: 0,
        };
        results.for_each(&mut mover).await?;
        let moved = mover.moved;

        if !noise.is_silent() {
            writeln!(output, "done.")?;
        }

        info!("Moved {} records from '{}'", moved, source);
        summary.moved += moved;
    }

    if !noise.is_silent() {
        print_summary(output, summary.moved, session.repository_id())?;
    }

    Ok(summary)
}

/// Open a session for a validated invocation and run the move
///
/// A session that cannot be opened is reported as [`MoveError::Session`];
/// anything failing after that is [`MoveError::Platform`]. The session is
/// released whether or not the move succeeded, and a failed move is
/// reported ahead of a failed release.
pub async fn execute<R, W>(
    invocation: Invocation,
    platform: &dyn Platform,
    input: &mut R,
    output: &mut W,
) -> Result<MoveSummary, MoveError>
where
    R: BufRead,
    W: Write + Send,
{
    let session = platform
        .open_session(&invocation.repository_id, invocation.noise)
        .await
        .map_err(|e| MoveError::session(invocation.repository_id.as_str(), &e))?;

    let options = MoveOptions {
        dataset: platform.default_dataset(&invocation.repository_id),
        sources: invocation.sources,
        destination: invocation.destination,
        force: invocation.force,
    };

    let outcome = move_command(session.as_ref(), &options, input, output).await;
    let closed = session.terminate().await;
    if let Err(e) = &closed {
        warn!("Failed to close session for '{}': {:#}", invocation.repository_id, e);
    }

    let summary = outcome?;
    closed?;
    Ok(summary)
}

/// Build the SQLite platform from the configuration an invocation points at
///
/// Configuration that can't be loaded means no session can be established,
/// so it is reported as [`MoveError::Session`].
pub fn sqlite_platform(invocation: &Invocation) -> Result<Box<dyn Platform>, MoveError> {
    let config = Config::load(invocation.config.as_deref())
        .map_err(|e| MoveError::session(invocation.repository_id.as_str(), &e))?;
    Ok(Box::new(SqlitePlatform::new(config)))
}

/// Run the tool for a raw argument list, program name first
///
/// Arguments are validated before `connect` is called, so a malformed
/// invocation never reaches a repository. `connect` builds the platform for
/// a validated invocation.
pub async fn run_from_args<A, T, F, R, W>(
    args: A,
    connect: F,
    input: &mut R,
    output: &mut W,
) -> Result<MoveSummary, MoveError>
where
    A: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&Invocation) -> Result<Box<dyn Platform>, MoveError>,
    R: BufRead,
    W: Write + Send,
{
    let invocation = parse_args(args)?;
    let platform = connect(&invocation)?;
    execute(invocation, platform.as_ref(), input, output).await
}

/// Total line followed by the views warning banner
fn print_summary<W: Write>(output: &mut W, moved: usize, repository_id: &str) -> Result<()> {
    writeln!(output, "Moved {} prints.", moved)?;
    writeln!(output)?;
    writeln!(output, "{}", SEPARATOR)?;
    writeln!(
        output,
        "{}",
        "WARNING: browse views have NOT been updated.".yellow().bold()
    )?;
    writeln!(
        output,
        "Run generate_views for '{}' to regenerate them.",
        repository_id
    )?;
    writeln!(output, "{}", SEPARATOR)?;
    output.flush()?;
    Ok(())
}
