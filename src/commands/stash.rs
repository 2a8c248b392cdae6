//! Stash and restore command handlers.
//!
//! Moves whole footprint formats between the static directory and its stash,
//! for manual runs with only some formats visible to modelpy.

use std::path::PathBuf;

use crate::config::load_effective_config;
use crate::error::Result;
use crate::footprint::FootprintFormat;
use crate::output::{print_info, GRAY, GREEN, RESET};
use crate::stash::ModelRunFileManager;

use super::parse_formats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToStash,
    FromStash,
}

/// Move the files of `formats` into `<static>/stash/`.
pub fn stash_command(formats: &[String], static_dir: Option<PathBuf>) -> Result<()> {
    run(formats, static_dir, Direction::ToStash)
}

/// Move the files of `formats` back out of the stash.
///
/// Every format is restored when `formats` is empty.
pub fn restore_command(formats: &[String], static_dir: Option<PathBuf>) -> Result<()> {
    run(formats, static_dir, Direction::FromStash)
}

fn run(formats: &[String], static_dir: Option<PathBuf>, direction: Direction) -> Result<()> {
    let formats = if formats.is_empty() {
        FootprintFormat::ALL.to_vec()
    } else {
        parse_formats(formats)?
    };
    let static_dir = match static_dir {
        Some(dir) => dir,
        None => load_effective_config()?.static_dir,
    };

    let manager = ModelRunFileManager::new(static_dir)?;
    let moved = move_formats(&manager, &formats, direction)?;

    if moved.is_empty() {
        print_info("Nothing to move");
        return Ok(());
    }

    let target = match direction {
        Direction::ToStash => manager.stash_path(),
        Direction::FromStash => manager.static_path().to_path_buf(),
    };
    for name in &moved {
        println!("{GREEN}moved{RESET} {}", name);
    }
    println!("{GRAY}into {}{RESET}", target.display());
    Ok(())
}

fn move_formats(
    manager: &ModelRunFileManager,
    formats: &[FootprintFormat],
    direction: Direction,
) -> Result<Vec<&'static str>> {
    let mut moved = Vec::new();
    for format in formats {
        for &(name, kind) in format.entries() {
            let did_move = match direction {
                Direction::ToStash => manager.move_to_stash(name, kind)?,
                Direction::FromStash => manager.get_from_stash(name, kind)?,
            };
            if did_move {
                moved.push(name);
            }
        }
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_stash_then_restore_format() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("footprint.bin"), "bin").unwrap();
        fs::write(temp_dir.path().join("footprint.idx"), "idx").unwrap();
        fs::write(temp_dir.path().join("footprint.csv"), "csv").unwrap();
        let manager = ModelRunFileManager::new(temp_dir.path()).unwrap();

        let moved =
            move_formats(&manager, &[FootprintFormat::Binary], Direction::ToStash).unwrap();
        assert_eq!(moved, vec!["footprint.bin", "footprint.idx"]);
        assert!(!temp_dir.path().join("footprint.bin").exists());
        assert!(temp_dir.path().join("footprint.csv").exists());

        let restored = move_formats(
            &manager,
            &FootprintFormat::ALL,
            Direction::FromStash,
        )
        .unwrap();
        assert_eq!(restored, vec!["footprint.bin", "footprint.idx"]);
        assert!(temp_dir.path().join("footprint.bin").exists());
    }

    #[test]
    fn test_missing_format_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ModelRunFileManager::new(temp_dir.path()).unwrap();

        let moved =
            move_formats(&manager, &[FootprintFormat::Parquet], Direction::ToStash).unwrap();
        assert!(moved.is_empty());
    }
}
