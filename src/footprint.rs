//! Footprint file formats and the compression command.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::stash::EntryKind;

/// A footprint format modelpy can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FootprintFormat {
    Binary,
    CompressedBinary,
    Csv,
    Parquet,
}

impl FootprintFormat {
    pub const ALL: [FootprintFormat; 4] = [
        FootprintFormat::Binary,
        FootprintFormat::CompressedBinary,
        FootprintFormat::Csv,
        FootprintFormat::Parquet,
    ];

    /// Entries in the static directory that make up this format.
    pub fn entries(&self) -> &'static [(&'static str, EntryKind)] {
        match self {
            FootprintFormat::Binary => &[
                ("footprint.bin", EntryKind::File),
                ("footprint.idx", EntryKind::File),
            ],
            FootprintFormat::CompressedBinary => &[
                ("footprint.bin.z", EntryKind::File),
                ("footprint.idx.z", EntryKind::File),
            ],
            FootprintFormat::Csv => &[("footprint.csv", EntryKind::File)],
            FootprintFormat::Parquet => &[("footprint.parquet", EntryKind::Directory)],
        }
    }

    /// Token modelpy's `--ignore-file-type` accepts for this format.
    pub fn ignore_token(&self) -> &'static str {
        match self {
            FootprintFormat::Binary => "bin",
            FootprintFormat::CompressedBinary => "z",
            FootprintFormat::Csv => "csv",
            FootprintFormat::Parquet => "parquet",
        }
    }

    /// modelpy arguments that leave this format as the only readable one.
    pub fn isolation_args(&self) -> String {
        let ignored: Vec<&str> = Self::ALL
            .iter()
            .filter(|format| *format != self)
            .map(FootprintFormat::ignore_token)
            .collect();
        format!("--ignore-file-type {}", ignored.join(" "))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bin" | "binary" => Some(FootprintFormat::Binary),
            "z" | "compressed" | "compressed-binary" => Some(FootprintFormat::CompressedBinary),
            "csv" => Some(FootprintFormat::Csv),
            "parquet" => Some(FootprintFormat::Parquet),
            _ => None,
        }
    }
}

impl fmt::Display for FootprintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FootprintFormat::Binary => "binary",
            FootprintFormat::CompressedBinary => "compressed binary",
            FootprintFormat::Csv => "csv",
            FootprintFormat::Parquet => "parquet",
        };
        f.write_str(label)
    }
}

/// Builds the pipeline that converts `footprint.bin` into `footprint.bin.z`.
///
/// ```
/// use modelbench::footprint::compress_command;
///
/// let command = compress_command("./static".as_ref(), 12);
/// assert!(command.starts_with("footprinttocsv -b ./static/footprint.bin"));
/// assert!(command.ends_with("-i 12"));
/// ```
pub fn compress_command(static_path: &Path, intensity_bins: u32) -> String {
    let dir = static_path.display().to_string();
    let dir = dir.trim_end_matches('/');
    format!(
        "footprinttocsv -b {dir}/footprint.bin -x {dir}/footprint.idx | \
         footprinttobin -z -u -b {dir}/footprint.bin.z -x {dir}/footprint.idx.z -i {intensity_bins}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_args_exclude_own_format() {
        assert_eq!(
            FootprintFormat::Binary.isolation_args(),
            "--ignore-file-type z csv parquet"
        );
        assert_eq!(
            FootprintFormat::Parquet.isolation_args(),
            "--ignore-file-type bin z csv"
        );
    }

    #[test]
    fn test_parquet_is_a_directory() {
        assert_eq!(
            FootprintFormat::Parquet.entries(),
            &[("footprint.parquet", EntryKind::Directory)]
        );
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(FootprintFormat::from_name("BIN"), Some(FootprintFormat::Binary));
        assert_eq!(
            FootprintFormat::from_name("z"),
            Some(FootprintFormat::CompressedBinary)
        );
        assert_eq!(FootprintFormat::from_name("feather"), None);
    }

    #[test]
    fn test_compress_command_template() {
        let command = compress_command(Path::new("./static/"), 5);
        assert_eq!(
            command,
            "footprinttocsv -b ./static/footprint.bin -x ./static/footprint.idx | \
             footprinttobin -z -u -b ./static/footprint.bin.z -x ./static/footprint.idx.z -i 5"
        );
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&FootprintFormat::CompressedBinary).unwrap();
        assert_eq!(json, "\"compressed-binary\"");
    }
}
