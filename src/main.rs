#![warn(clippy::all)]

use std::io::{self, Write as _};
use std::process;

use structopt::StructOpt;

use cptool::{Opt, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();
    opt.init_logger();
    let succeeded = opt.run().await.map_err(|err| {
        let _ = io::stdout().flush();
        eprintln!();
        err
    })?;
    if !succeeded {
        process::exit(1);
    }
    Ok(())
}
