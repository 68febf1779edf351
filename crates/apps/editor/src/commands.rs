//! Subcommand implementations
//!
//! Each command builds its own session from the configuration and returns
//! the text to print, so the binary only has to handle errors and output.

use crate::cli::{CameraArgs, ResolverArg};
use crate::script::InputScript;
use cad::project_log::LoadReport;
use cad::{CubeSet, EditorSession, SessionConfig};
use glam::DVec2;
use std::fmt::Write as _;
use std::path::Path;
use tracing::warn;

/// `editor replay <LOG>`
pub fn replay(config: &SessionConfig, log: &Path) -> cad::Result<String> {
    let mut session = EditorSession::new(config)?;
    let report = session.load_log(log)?;

    let mut out = String::new();
    write_report(&mut out, &report);
    write_cubes(&mut out, session.cubes());
    for line in session.log().display_lines() {
        let _ = writeln!(out, "{line}");
    }
    Ok(out)
}

/// `editor run <SCRIPT> [--log <LOG>] [--save <OUT>]`
pub fn run(
    config: &SessionConfig,
    script: &Path,
    log: Option<&Path>,
    save: Option<&Path>,
) -> cad::Result<String> {
    let script = InputScript::from_file(script)?;
    let mut session = EditorSession::new(config)?;

    let mut out = String::new();
    if let Some(log) = log {
        let report = session.load_log(log)?;
        write_report(&mut out, &report);
    }

    let report = script.run(&mut session);
    let _ = writeln!(
        out,
        "ran {} steps: {} placements, {} missed clicks",
        report.steps,
        report.placements.len(),
        report.misses
    );
    for placement in &report.placements {
        let _ = writeln!(out, "{placement}");
    }
    write_cubes(&mut out, session.cubes());

    if let Some(path) = save {
        session.save_log(path)?;
        let _ = writeln!(out, "saved {} events to {}", session.log().len(), path.display());
    }
    Ok(out)
}

/// `editor resolve <X> <Y> [camera options]`
pub fn resolve(
    config: &SessionConfig,
    pointer: DVec2,
    camera: &CameraArgs,
    resolver: Option<ResolverArg>,
) -> cad::Result<String> {
    let mut config = config.clone();
    if let Some(kind) = resolver {
        config.editor.resolver = kind.into();
    }

    let mut session = EditorSession::new(&config)?;
    session.set_camera_state(camera.state());

    let located = session.locate(pointer);
    Ok(match located {
        Ok(cell) => format!("{cell}\n"),
        Err(miss) => format!("no cell: {miss}\n"),
    })
}

fn write_report(out: &mut String, report: &LoadReport) {
    if report.renumbered {
        let _ = writeln!(out, "note: events were renumbered");
    }
    for skipped in &report.skipped {
        warn!(%skipped, "skipped log line");
        let _ = writeln!(out, "skipped {skipped}");
    }
}

fn write_cubes(out: &mut String, cubes: &CubeSet) {
    let cells: Vec<String> = cubes.iter().map(|cell| cell.to_string()).collect();
    let _ = writeln!(out, "cubes ({}): {}", cells.len(), cells.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_camera() -> CameraArgs {
        CameraArgs {
            tilt: 0.0,
            turn: 0.0,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    #[test]
    fn test_replay_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "1: P(3,4)\n2: P(0,0)\nbad line\n").unwrap();

        let out = replay(&SessionConfig::default(), &path).unwrap();
        assert!(out.contains("cubes (2): (0,0) (3,4)\n"));
        assert!(out.contains("1: P(3,4)\n2: P(0,0)\n"));
        assert!(out.contains("skipped line 3"));
    }

    #[test]
    fn test_run_saves_log() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.toml");
        let saved = dir.path().join("out.txt");
        std::fs::write(
            &script,
            "[[steps]]\ntype = \"click_cell\"\ncolumn = 3\nrow = 4\n",
        )
        .unwrap();

        let out = run(&SessionConfig::default(), &script, None, Some(&saved)).unwrap();
        assert!(out.contains("1 placements"));
        assert!(out.contains("cubes (1): (3,4)"));

        let text = std::fs::read_to_string(&saved).unwrap();
        assert!(text.ends_with("1: P(3,4)\n"));
    }

    #[test]
    fn test_run_seeded_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.toml");
        let log = dir.path().join("log.txt");
        std::fs::write(&log, "1: P(3,4)\n").unwrap();
        std::fs::write(
            &script,
            "[[steps]]\ntype = \"mode\"\nmode = \"erasing\"\n\n[[steps]]\ntype = \"click_cell\"\ncolumn = 3\nrow = 4\n",
        )
        .unwrap();

        let out = run(&SessionConfig::default(), &script, Some(&log), None).unwrap();
        assert!(out.contains("2: E(3,4)"));
        assert!(out.contains("cubes (0): "));
    }

    #[test]
    fn test_resolve() {
        let config = SessionConfig::default();
        // (416, 284) is the centre of cell (0,0) in the default view
        let out = resolve(&config, DVec2::new(416.0, 284.0), &flat_camera(), None).unwrap();
        assert_eq!(out, "(0,0)\n");

        let out = resolve(
            &config,
            DVec2::new(416.0, 284.0),
            &flat_camera(),
            Some(ResolverArg::Buckets),
        )
        .unwrap();
        assert_eq!(out, "(0,0)\n");

        let out = resolve(&config, DVec2::new(10.0, 10.0), &flat_camera(), None).unwrap();
        assert!(out.starts_with("no cell: "));
    }

    #[test]
    fn test_replay_missing_log_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = replay(&SessionConfig::default(), &dir.path().join("none.txt")).unwrap_err();
        assert!(matches!(err, cad::Error::Io { .. }));
    }
}
