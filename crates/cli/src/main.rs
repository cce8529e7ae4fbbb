use clap::Parser;
use noticeboard::{AppContext, Commands, ContextOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "noticeboard")]
#[command(about = "Manage site-wide admin notices", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the notice store and shared cache
    #[arg(long, global = true, env = "NOTICEBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Refuse every change; expired notices are still cleaned up when listing
    #[arg(long, global = true)]
    read_only: bool,

    /// Name recorded in the audit trail for changes made by this run
    #[arg(long = "as", global = true, env = "USER", default_value = "cli")]
    principal: String,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    let directive = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = noticeboard_utils::tracing::init(directive) {
        eprintln!("failed to initialize logging: {e}");
    }

    let ctx = AppContext::open(ContextOptions {
        data_dir: cli.data_dir,
        read_only: cli.read_only,
        principal: cli.principal,
    })?;

    // Listing is the default when no command is given
    let command = cli.command.unwrap_or(Commands::List {
        json: false,
        all: false,
    });
    let mut stdout = std::io::stdout().lock();
    command.execute(&ctx, &mut stdout).await?;
    Ok(())
}
