//! modelbench CLI entry point.
//!
//! Parses command-line arguments and dispatches to the appropriate command handler.

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use modelbench::commands::{
    compress_command, config_display_command, config_init_command, diff_runs_command,
    formats_command, oasis_compare_command, profile_command, restore_command, server_command,
    stash_command, BenchOverrides, OasisCompareOptions,
};
use modelbench::output::{print_error, print_header};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modelbench")]
#[command(
    version,
    about = "Time and memory benchmarks for modelpy model runs",
    after_help = "EXAMPLES:
    # Sample the memory of any commands run side by side
    modelbench profile -- 'sleep 2' 'python script.py'

    # Compare footprint formats over 4 eve/modelpy partitions
    modelbench formats --partitions 4

    # Compare reading footprints directly against servedata
    modelbench server

    # Check two oasislmf runs produced the same losses
    modelbench diff-runs runs/binary --rename parquet

    # Run oasislmf on two location files and diff the losses
    modelbench oasis-compare --location-a full.csv --location-b reduced.csv"
)]
struct Cli {
    /// Log sampler and launcher activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Sampling and run settings shared by the benchmark commands.
#[derive(Args, Debug, Default)]
struct BenchArgs {
    /// Delay between sampling passes in milliseconds (0 polls continuously)
    #[arg(long = "poll-interval", value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Stop sampling after this many seconds
    #[arg(long = "timeout", value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Model static directory holding the footprint files
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Directory for session samples and stop markers
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Number of eve/modelpy partitions
    #[arg(short, long)]
    partitions: Option<u32>,

    /// Keep samples.json on disk after reporting
    #[arg(long)]
    keep_samples: bool,
}

impl From<BenchArgs> for BenchOverrides {
    fn from(args: BenchArgs) -> Self {
        BenchOverrides {
            poll_interval_ms: args.poll_interval_ms,
            timeout_secs: args.timeout_secs,
            static_dir: args.static_dir,
            session_dir: args.session_dir,
            partitions: args.partitions,
            keep_samples: args.keep_samples,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run shell commands side by side and sample their memory
    #[command(after_help = "EXAMPLES:
    modelbench profile -- 'eve 1 2 | modelpy > /dev/null' 'eve 2 2 | modelpy > /dev/null'
    modelbench profile --label baseline --poll-interval 0 -- 'sleep 5'

Each command runs through `sh -c` as its own process.")]
    Profile {
        /// Name shown in the report
        #[arg(long)]
        label: Option<String>,

        #[command(flatten)]
        bench: BenchArgs,

        /// Commands to run, one process each
        #[arg(last = true, required = true, value_name = "COMMAND")]
        commands: Vec<String>,
    },

    /// Compare footprint formats, one model run per format
    #[command(after_help = "EXAMPLES:
    modelbench formats                                # Formats from the config
    modelbench formats --format bin --format parquet  # Only these formats

FORMATS:
    binary (bin), compressed-binary (z), csv, parquet.
    Footprint files of the other formats are stashed during each run.")]
    Formats {
        /// Format to compare (repeatable)
        #[arg(long = "format", value_name = "FORMAT")]
        formats: Vec<String>,

        #[command(flatten)]
        bench: BenchArgs,
    },

    /// Compare runs with and without the servedata data server
    Server {
        #[command(flatten)]
        bench: BenchArgs,
    },

    /// Move footprint formats into <static>/stash/
    Stash {
        /// Formats to stash
        #[arg(required = true, value_name = "FORMAT")]
        formats: Vec<String>,

        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Move stashed footprint formats back (all formats by default)
    Restore {
        #[arg(value_name = "FORMAT")]
        formats: Vec<String>,

        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Build footprint.bin.z and footprint.idx.z from the binary footprint
    Compress {
        /// Number of intensity bins in the footprint
        #[arg(short = 'i', long)]
        intensity_bins: u32,

        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Compare the output CSVs of two oasislmf runs
    #[command(after_help = "EXAMPLES:
    modelbench diff-runs runs/binary runs/parquet
    modelbench diff-runs runs/binary --rename parquet  # Latest losses-* run, renamed first")]
    DiffRuns {
        /// Reference run directory
        left: PathBuf,

        /// Run to compare; the latest losses-* run in --runs-dir when omitted
        right: Option<PathBuf>,

        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,

        /// Rename the latest run before comparing
        #[arg(long, conflicts_with = "right")]
        rename: Option<String>,
    },

    /// Run oasislmf with two location files and compare the outputs
    #[command(after_help = "EXAMPLES:
    modelbench oasis-compare --location-a tests/full_locations.csv --location-b tests/reduced_locations.csv
    modelbench oasis-compare --base-config oasislmf.json --location-a a.csv --location-b b.csv --clean

Each side gets its own <name>_mdk.json, removed once its run finishes.")]
    OasisCompare {
        /// MDK config both runs start from (built-in defaults when omitted)
        #[arg(long, value_name = "JSON")]
        base_config: Option<PathBuf>,

        /// OED location file for the first run
        #[arg(long, value_name = "CSV")]
        location_a: String,

        /// OED location file for the second run
        #[arg(long, value_name = "CSV")]
        location_b: String,

        #[arg(long, default_value = "full_location_run")]
        name_a: String,

        #[arg(long, default_value = "reduced_locations_run")]
        name_b: String,

        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,

        /// Run without hashed group ids
        #[arg(long)]
        no_hashed_group_id: bool,

        /// Remove the runs directory before the first run
        #[arg(long)]
        clean: bool,
    },

    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: Option<ConfigSubcommand>,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Write a commented default config file
    Init {
        /// Write ./modelbench.toml instead of the global config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
    {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match cli.command {
        Commands::Profile {
            label,
            bench,
            commands,
        } => {
            print_header();
            profile_command(commands, label, &bench.into())
        }
        Commands::Formats { formats, bench } => {
            print_header();
            formats_command(&formats, &bench.into())
        }
        Commands::Server { bench } => {
            print_header();
            server_command(&bench.into())
        }
        Commands::Stash {
            formats,
            static_dir,
        } => stash_command(&formats, static_dir),
        Commands::Restore {
            formats,
            static_dir,
        } => restore_command(&formats, static_dir),
        Commands::Compress {
            intensity_bins,
            static_dir,
        } => compress_command(intensity_bins, static_dir),
        Commands::DiffRuns {
            left,
            right,
            runs_dir,
            rename,
        } => diff_runs_command(left, right, &runs_dir, rename.as_deref()),
        Commands::OasisCompare {
            base_config,
            location_a,
            location_b,
            name_a,
            name_b,
            runs_dir,
            no_hashed_group_id,
            clean,
        } => {
            print_header();
            oasis_compare_command(OasisCompareOptions {
                base_config,
                location_a,
                location_b,
                name_a,
                name_b,
                runs_dir,
                hashed_group_id: !no_hashed_group_id,
                clean_runs: clean,
            })
        }
        Commands::Config { subcommand } => match subcommand {
            None => config_display_command(),
            Some(ConfigSubcommand::Init { local, force }) => config_init_command(local, force),
        },
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_collects_trailing_commands() {
        let cli =
            Cli::try_parse_from(["modelbench", "profile", "--", "sleep 1", "echo hi"]).unwrap();
        match cli.command {
            Commands::Profile {
                commands, label, ..
            } => {
                assert_eq!(commands, vec!["sleep 1", "echo hi"]);
                assert!(label.is_none());
            }
            _ => panic!("expected profile"),
        }
    }

    #[test]
    fn test_profile_requires_commands() {
        assert!(Cli::try_parse_from(["modelbench", "profile"]).is_err());
    }

    #[test]
    fn test_bench_args_become_overrides() {
        let cli = Cli::try_parse_from([
            "modelbench",
            "formats",
            "--format",
            "bin",
            "--format",
            "parquet",
            "--poll-interval",
            "0",
            "--timeout",
            "30",
            "-p",
            "8",
            "--keep-samples",
        ])
        .unwrap();

        let Commands::Formats { formats, bench } = cli.command else {
            panic!("expected formats");
        };
        assert_eq!(formats, vec!["bin", "parquet"]);

        let overrides: BenchOverrides = bench.into();
        assert_eq!(overrides.poll_interval_ms, Some(0));
        assert_eq!(overrides.timeout_secs, Some(30));
        assert_eq!(overrides.partitions, Some(8));
        assert!(overrides.keep_samples);
        assert!(overrides.static_dir.is_none());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["modelbench", "server", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Server { .. }));
    }

    #[test]
    fn test_stash_requires_a_format() {
        assert!(Cli::try_parse_from(["modelbench", "stash"]).is_err());
        assert!(Cli::try_parse_from(["modelbench", "restore"]).is_ok());
    }

    #[test]
    fn test_diff_runs_rename_conflicts_with_right() {
        assert!(Cli::try_parse_from([
            "modelbench",
            "diff-runs",
            "runs/a",
            "runs/b",
            "--rename",
            "c"
        ])
        .is_err());

        let cli =
            Cli::try_parse_from(["modelbench", "diff-runs", "runs/a", "--rename", "c"]).unwrap();
        let Commands::DiffRuns {
            right,
            runs_dir,
            rename,
            ..
        } = cli.command
        else {
            panic!("expected diff-runs");
        };
        assert!(right.is_none());
        assert_eq!(runs_dir, PathBuf::from("runs"));
        assert_eq!(rename.as_deref(), Some("c"));
    }

    #[test]
    fn test_oasis_compare_defaults() {
        let cli = Cli::try_parse_from([
            "modelbench",
            "oasis-compare",
            "--location-a",
            "full.csv",
            "--location-b",
            "reduced.csv",
        ])
        .unwrap();
        let Commands::OasisCompare {
            location_a,
            name_a,
            name_b,
            runs_dir,
            no_hashed_group_id,
            clean,
            ..
        } = cli.command
        else {
            panic!("expected oasis-compare");
        };
        assert_eq!(location_a, "full.csv");
        assert_eq!(name_a, "full_location_run");
        assert_eq!(name_b, "reduced_locations_run");
        assert_eq!(runs_dir, PathBuf::from("runs"));
        assert!(!no_hashed_group_id);
        assert!(!clean);
    }

    #[test]
    fn test_oasis_compare_requires_both_locations() {
        assert!(
            Cli::try_parse_from(["modelbench", "oasis-compare", "--location-a", "a.csv"]).is_err()
        );
    }

    #[test]
    fn test_config_init_flags() {
        let cli = Cli::try_parse_from(["modelbench", "config", "init", "--local"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                subcommand: Some(ConfigSubcommand::Init {
                    local: true,
                    force: false
                })
            }
        ));
    }

    #[test]
    fn test_compress_requires_bins() {
        assert!(Cli::try_parse_from(["modelbench", "compress"]).is_err());
        assert!(Cli::try_parse_from(["modelbench", "compress", "-i", "12"]).is_ok());
    }
}
