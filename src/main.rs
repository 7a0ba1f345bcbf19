const CRYPTONOTES_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const CRYPTONOTES_VERSION: &str = env!("CARGO_PKG_VERSION");

// -- deps
#[macro_use]
extern crate serde;
#[macro_use]
extern crate tracing;
// -- modules
mod application;

use application::{Application, Config as AppConfig};

use argh::FromArgs;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::Level;

#[derive(FromArgs)]
#[argh(description = "Record notes on a local proof-of-work blockchain")]
pub struct Args {
    #[argh(switch, short = 'D', description = "enable TRACE log level")]
    pub debug: bool,
    #[argh(
        switch,
        description = "mine the given notes into a single block, then exit"
    )]
    pub once: bool,
    #[argh(positional, description = "note files to record on the chain")]
    pub notes: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    dotenv().ok();
    if args.debug {
        tracing_subscriber::fmt().with_max_level(Level::TRACE).init();
    } else {
        tracing_subscriber::fmt::init();
    }
    info!(
        "cryptonotes {} - developed by {}",
        CRYPTONOTES_VERSION, CRYPTONOTES_AUTHORS
    );
    let config = AppConfig::try_from_env()?;
    info!("configuration successfully loaded");
    let mut application = Application::init(config).await?;
    for note in args.notes.iter() {
        application.add_note_file(note.as_path()).await?;
    }
    info!("application ready!");
    if args.once {
        if application.mine_once().await? {
            info!("notes recorded on the chain");
        }
        Ok(())
    } else {
        application.run().await
    }
}
