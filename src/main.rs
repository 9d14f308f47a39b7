use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use toli_installer::commands::{self, GlobalOptions};
use toli_installer::config::DEFAULT_TIMEOUT_SECS;
use toli_installer::platform::PlatformKey;
use toli_installer::runtime::RealRuntime;

/// toli-installer - install prebuilt toli releases
///
/// Downloads the archive published for this platform, checks its SHA-256
/// digest, and places the binary and shell completions under a prefix.
///
/// If the GITHUB_TOKEN environment variable is set, it is sent as a bearer
/// token with every download.
///
/// Examples:
///   toli-installer install                       # Install the built-in release
///   toli-installer --prefix ~/.local install     # Install into ~/.local
///   toli-installer verify                        # Run `toli --version`
#[derive(Parser, Debug)]
#[command(author, version = env!("TOLI_INSTALLER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Destination prefix (default: /usr/local as root, ~/.local otherwise)
    #[arg(long, env = "TOLI_PREFIX", value_name = "PATH", global = true)]
    prefix: Option<PathBuf>,

    /// Release descriptor JSON to use instead of the built-in one
    #[arg(long, env = "TOLI_DESCRIPTOR", value_name = "FILE", global = true)]
    descriptor: Option<PathBuf>,

    /// Download timeout in seconds
    #[arg(
        long,
        env = "TOLI_HTTP_TIMEOUT",
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    timeout: u64,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify and install the release for this platform
    Install(TargetArgs),

    /// Print the archive URL and checksum for this platform
    Locate(TargetArgs),

    /// Print shell alias suggestions and installed files
    Caveats,

    /// Run `<prefix>/bin/toli --version` and check the version
    Verify(VersionArgs),
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Version to install (defaults to the descriptor's version)
    #[arg(long, value_name = "VERSION")]
    version: Option<String>,

    /// Platform key or target triple, e.g. linux-x86_64 (defaults to the host)
    #[arg(long, value_name = "KEY")]
    platform: Option<PlatformKey>,
}

#[derive(clap::Args, Debug)]
struct VersionArgs {
    /// Expected version (defaults to the descriptor's version)
    #[arg(long, value_name = "VERSION")]
    version: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;
    let options = GlobalOptions {
        prefix: cli.prefix,
        descriptor: cli.descriptor,
        timeout_secs: cli.timeout,
    };

    match cli.command {
        Commands::Install(args) => {
            commands::install(runtime, &options, args.version.as_deref(), args.platform).await?
        }
        Commands::Locate(args) => {
            commands::locate(runtime, &options, args.version.as_deref(), args.platform)?
        }
        Commands::Caveats => commands::caveats(runtime, &options)?,
        Commands::Verify(args) => {
            if !commands::verify(runtime, &options, args.version.as_deref())? {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
