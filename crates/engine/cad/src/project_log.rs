//! Project log file codec
//!
//! A project log is UTF-8 text with one placement event per line:
//!
//! ```text
//! # cubecad project log v1
//! 1: P(3,4)
//! 2: E(3,4)
//! ```
//!
//! Blank lines and `#` comments are ignored. The older numeric-flag form
//! (`1:3,4` to place, `0:P(3,4)` to erase) is still read, never written.
//! Malformed lines are skipped with a warning and reported in [`LoadReport`];
//! only I/O failures abort a load.

use crate::error::{Error, Result};
use crate::grid::{GridCell, GridSize};
use crate::placement::{PlacementAction, PlacementLog};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, i32 as nom_i32, satisfy, space0, u32 as nom_u32},
    combinator::{all_consuming, map, rest},
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult, Parser,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// First line written by [`save`]
pub const HEADER: &str = "# cubecad project log v1";

// ============================================================================
// Line Errors
// ============================================================================

/// Why a single log line was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineFault {
    #[error("unrecognized entry")]
    Syntax,

    #[error("unknown action code {0:?}")]
    UnknownAction(char),

    #[error("unknown action flag {0}")]
    UnknownFlag(u32),

    #[error("coordinates are not two integers")]
    BadCoordinates,

    #[error("cell {0} is outside the grid")]
    OutOfBounds(GridCell),
}

/// A rejected line together with where it was found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {fault}: {text:?}")]
pub struct LogLineError {
    /// 1-based line number
    pub line: usize,
    pub text: String,
    pub fault: LineFault,
}

// ============================================================================
// Line Parsing
// ============================================================================

/// One successfully parsed log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    /// Sequence number written in the file; `None` for numeric-flag lines
    pub sequence: Option<u32>,
    pub action: PlacementAction,
    pub cell: GridCell,
}

enum Body<'a> {
    /// `P(3,4)`
    Tagged { code: char, coords: &'a str },
    /// `3,4`
    Bare(&'a str),
}

// Leading number up to and including the colon
fn leading_number(input: &str) -> IResult<&str, u32> {
    terminated(delimited(space0, nom_u32, space0), char(':')).parse(input)
}

fn tagged_body(input: &str) -> IResult<&str, Body<'_>> {
    map(
        (
            satisfy(|c: char| c.is_ascii_alphabetic()),
            space0,
            delimited(char('('), take_while(|c: char| c != ')'), char(')')),
            space0,
        ),
        |(code, _, coords, _)| Body::Tagged { code, coords },
    )
    .parse(input)
}

fn body(input: &str) -> IResult<&str, Body<'_>> {
    preceded(space0, alt((all_consuming(tagged_body), map(rest, Body::Bare)))).parse(input)
}

fn coordinate_pair(input: &str) -> IResult<&str, (i32, i32)> {
    all_consuming(separated_pair(
        delimited(space0, nom_i32, space0),
        char(','),
        delimited(space0, nom_i32, space0),
    ))
    .parse(input)
}

fn cell_from(coords: &str) -> std::result::Result<GridCell, LineFault> {
    coordinate_pair(coords)
        .map(|(_, pair)| GridCell::from(pair))
        .map_err(|_| LineFault::BadCoordinates)
}

/// Parse one line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> std::result::Result<Option<LogEntry>, LineFault> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (_, (number, body)) = (leading_number, body)
        .parse(line)
        .map_err(|_| LineFault::Syntax)?;

    let entry = match body {
        Body::Tagged { code, coords } => {
            let action = PlacementAction::from_code(code).ok_or(LineFault::UnknownAction(code))?;
            let cell = cell_from(coords)?;
            match (number, action) {
                (1.., _) => LogEntry {
                    sequence: Some(number),
                    action,
                    cell,
                },
                // `0:P(x,y)` is the numeric-flag erase
                (0, PlacementAction::Place) => LogEntry {
                    sequence: None,
                    action: PlacementAction::Erase,
                    cell,
                },
                (0, PlacementAction::Erase) => return Err(LineFault::UnknownFlag(0)),
            }
        }
        Body::Bare(coords) => {
            let action = match number {
                1 => PlacementAction::Place,
                0 => PlacementAction::Erase,
                flag => return Err(LineFault::UnknownFlag(flag)),
            };
            LogEntry {
                sequence: None,
                action,
                cell: cell_from(coords)?,
            }
        }
    };
    Ok(Some(entry))
}

// ============================================================================
// Whole-file Load and Save
// ============================================================================

/// Outcome of reading a project log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Events in the rebuilt log
    pub applied: usize,
    /// Well-formed entries dropped because they would not change occupancy
    pub ignored: usize,
    /// Malformed or out-of-grid lines
    pub skipped: Vec<LogLineError>,
    /// Sequence numbers in the file did not match the rebuilt order
    pub renumbered: bool,
}

impl LoadReport {
    /// True when every entry was applied exactly as written
    pub fn is_clean(&self) -> bool {
        self.ignored == 0 && self.skipped.is_empty() && !self.renumbered
    }

    fn skip(&mut self, line: usize, text: &str, fault: LineFault) {
        warn!(line, text = text.trim(), %fault, "skipping project log line");
        self.skipped.push(LogLineError {
            line,
            text: text.trim().to_string(),
            fault,
        });
    }
}

/// Rebuild a placement log from project-log text
///
/// Entries are applied in file order to an empty log. Events are renumbered
/// 1..n in replay order.
pub fn parse_log(text: &str, grid: GridSize) -> (PlacementLog, LoadReport) {
    let mut log = PlacementLog::new();
    let mut report = LoadReport::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let entry = match parse_line(raw) {
            Ok(Some(entry)) if grid.contains(entry.cell) => entry,
            Ok(Some(entry)) => {
                report.skip(line, raw, LineFault::OutOfBounds(entry.cell));
                continue;
            }
            Ok(None) => continue,
            Err(fault) => {
                report.skip(line, raw, fault);
                continue;
            }
        };

        match log.apply(entry.action, entry.cell) {
            Some(event) => {
                if entry.sequence.is_some_and(|written| written != event.sequence) {
                    report.renumbered = true;
                }
            }
            None => {
                debug!(line, cell = %entry.cell, "log entry does not change occupancy");
                report.ignored += 1;
            }
        }
    }

    report.applied = log.len();
    if report.renumbered {
        warn!("log sequence numbers did not match replay order, events renumbered");
    }
    (log, report)
}

/// Render a log in the canonical on-disk form, header included
pub fn render(log: &PlacementLog) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + log.len() * 12);
    out.push_str(HEADER);
    out.push('\n');
    for line in log.display_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Load a project log from `path`
///
/// The caller's state is untouched on failure: the rebuilt log is only
/// returned once the whole file has been read.
pub fn load(path: impl AsRef<Path>, grid: GridSize) -> Result<(PlacementLog, LoadReport)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let (log, report) = parse_log(&text, grid);
    info!(
        path = %path.display(),
        events = report.applied,
        skipped = report.skipped.len(),
        "loaded project log"
    );
    Ok((log, report))
}

/// Save a project log to `path` through a sibling temp file and a rename
pub fn save(log: &PlacementLog, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_path(path);
    fs::write(&tmp, render(log)).map_err(|err| Error::io(&tmp, err))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, err));
    }
    info!(path = %path.display(), events = log.len(), "saved project log");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("project_log"));
    name.push(".tmp");
    path.with_file_name(name)
}
