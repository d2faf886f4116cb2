use chunktar::cli::{default_output_path, join_chunks, show_info, split_file, JoinOptions, SplitOptions};
use chunktar::pipeline::CipherKey;
use chunktar::size::{format_size, parse_size};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("CHUNKTAR_VERSION");
const PROFILE: &str = env!("CHUNKTAR_PROFILE");
const GIT_HASH: &str = env!("CHUNKTAR_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} ({})", PROFILE, VERSION, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "chunktar")]
#[command(author, about = "Split large files into numbered, optionally encrypted chunks", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into <FILE>.00, <FILE>.01, ...
    #[command(alias = "c")]
    Split {
        /// File to split
        file: PathBuf,

        /// Maximum payload per chunk, e.g. 4096, 512K, 100M, 2G (0 = single chunk)
        #[arg(short = 's', long, default_value = "0", value_parser = parse_split_size)]
        split_size: u64,

        /// AES key as hex (16, 24 or 32 bytes)
        #[arg(short = 'e', long, env = "CHUNKTAR_KEY", hide_env_values = true, value_parser = parse_key)]
        key: Option<CipherKey>,

        /// No banner or progress line
        #[arg(short, long)]
        quiet: bool,
    },

    /// Join <BASE>.00, <BASE>.01, ... back into one file
    #[command(alias = "d")]
    Join {
        /// Base path of the chunk set (without the .NN suffix)
        base: PathBuf,

        /// AES key as hex (16, 24 or 32 bytes)
        #[arg(short = 'e', long, env = "CHUNKTAR_KEY", hide_env_values = true, value_parser = parse_key)]
        key: Option<CipherKey>,

        /// Output file (default: joined_<name> in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// No banner or progress line
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the chunks of a chunk set
    #[command(alias = "i")]
    Info {
        /// Base path of the chunk set
        base: PathBuf,
    },
}

fn parse_split_size(s: &str) -> Result<u64, String> {
    parse_size(s).map_err(|e| format!("{}", e))
}

fn parse_key(s: &str) -> Result<CipherKey, String> {
    CipherKey::from_hex(s).map_err(|e| format!("{}", e))
}

fn show_banner() {
    println!("========================================");
    println!("    chunktar {}", VERSION);
    println!("    split / join with optional AES-CFB");
    println!("========================================");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("chunktar {}", get_version());
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // Show help when no command provided
            if Cli::command().print_help().is_err() {
                return ExitCode::FAILURE;
            }
            println!();
            return ExitCode::SUCCESS;
        }
    };

    let result = match command {
        Commands::Split {
            file,
            split_size,
            key,
            quiet,
        } => {
            if !quiet {
                show_banner();
                println!("Splitting {}...", file.display());
            }
            let options = SplitOptions {
                split_size,
                key,
                show_progress: !quiet,
            };
            split_file(&file, &options).map(|summary| {
                println!(
                    "Wrote {} chunk(s), {} of payload",
                    summary.chunks.len(),
                    format_size(summary.bytes)
                );
            })
        }

        Commands::Join {
            base,
            key,
            output,
            quiet,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&base));
            if !quiet {
                show_banner();
                println!("Joining chunks into {}", output.display());
            }
            let options = JoinOptions {
                key,
                show_progress: !quiet,
            };
            join_chunks(&base, &output, &options).map(|summary| {
                println!(
                    "Joined {} chunk(s), {} written to {}",
                    summary.chunks,
                    format_size(summary.bytes),
                    summary.output.display()
                );
            })
        }

        Commands::Info { base } => show_info(&base).map(|info| print!("{}", info)),
    };

    match result {
        Ok(()) => {
            println!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
