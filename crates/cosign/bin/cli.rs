use clap::{
    builder::{styling::AnsiColor, Styles},
    Parser, Subcommand,
};
use cosign::{
    cmd::{
        authorize::AuthorizeCommand, digest::DigestCommand, info::InfoCommand,
        signers::SignersCommand,
    },
    utils::{init_tracing, load_config},
};

use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "cosign",
    about = "Collects owner signatures for Safe multisig transactions and executes them.",
    version,
    term_width = 80,
    styles = get_color_style()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "COSIGN_CONFIG",
        default_value = "cosign.yaml",
        help = "Authorizer configuration file."
    )]
    pub config: PathBuf,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Authorize(AuthorizeCommand),
    Digest(DigestCommand),
    Info(InfoCommand),
    Signers(SignersCommand),
}

impl Cli {
    pub fn run(self) -> eyre::Result<()> {
        init_tracing(self.debug);

        let config = load_config(&self.config)?;

        // Signer calls are issued one at a time, a single thread is enough.
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        match self.command {
            Commands::Authorize(authorize) => runtime.block_on(authorize.execute(config)),
            Commands::Digest(digest) => digest.execute(config),
            Commands::Info(info) => runtime.block_on(info.execute(config)),
            Commands::Signers(signers) => runtime.block_on(signers.execute(config)),
        }
    }
}

fn get_color_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Blue.on_default().bold())
        .placeholder(AnsiColor::Green.on_default())
}
