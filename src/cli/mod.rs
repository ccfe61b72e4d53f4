//! Command-line interface for stackform
//!
//! - `convert`: turn documents into platform manifests
//! - `validate`: decode and validate documents without writing anything
//! - `version`: print the crate and input format versions
//! - `completions`: generate shell completions

pub mod completions;
pub mod convert;
pub mod validate;
pub mod version;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use stackform::{Config, Distro, infrastructure};
use std::path::PathBuf;

/// CLI arguments for stackform
#[derive(Parser, Debug)]
#[command(name = "stackform")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, env = "STACKFORM_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert documents into platform manifests
    Convert {
        /// Input documents; `-` reads stdin, http(s) URLs are fetched
        #[arg(
            short,
            long = "file",
            required = true,
            value_delimiter = ',',
            env = "STACKFORM_FILES"
        )]
        files: Vec<String>,
        /// Output directory; `-` writes to stdout
        #[arg(short, long, env = "STACKFORM_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
        /// Target distribution
        #[arg(long, value_enum, env = "STACKFORM_DISTRO")]
        distro: Option<DistroArg>,
    },

    /// Decode and validate documents
    Validate {
        /// Input documents; `-` reads stdin, http(s) URLs are fetched
        #[arg(
            short,
            long = "file",
            required = true,
            value_delimiter = ',',
            env = "STACKFORM_FILES"
        )]
        files: Vec<String>,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DistroArg {
    Kubernetes,
    #[value(name = "openshift")]
    OpenShift,
}

impl From<DistroArg> for Distro {
    fn from(arg: DistroArg) -> Self {
        match arg {
            DistroArg::Kubernetes => Distro::Kubernetes,
            DistroArg::OpenShift => Distro::OpenShift,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

impl From<ShellArg> for clap_complete::Shell {
    fn from(arg: ShellArg) -> Self {
        match arg {
            ShellArg::Bash => Self::Bash,
            ShellArg::Zsh => Self::Zsh,
            ShellArg::Fish => Self::Fish,
            ShellArg::PowerShell => Self::PowerShell,
            ShellArg::Elvish => Self::Elvish,
        }
    }
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    infrastructure::init_logging(&config.log_level);

    match args.command {
        Command::Convert {
            files,
            output_dir,
            distro,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(distro) = distro {
                config.distro = distro.into();
            }
            convert::convert(&files, &config)?;
        }
        Command::Validate { files } => {
            for line in validate::validate(&files, &config)? {
                println!("{line}");
            }
        }
        Command::Version => {
            println!("{}", version::version());
        }
        Command::Completions { shell, output } => {
            let completions = completions::generate_completions(shell.into())?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                print!("{completions}");
            }
        }
    }

    Ok(())
}
