#![warn(clippy::all)]

#[macro_use]
extern crate strum;

use std::io::{self, Write as _};

use anyhow::Context as _;
use serde::Serialize;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use structopt::StructOpt;
use strum::VariantNames;

use cptool_config::Config;
use cptool_util::model::ServiceKind;
use cptool_util::{Console, ConsoleConfig};

mod cmd;

use cmd::Cmd;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(about, rename_all = "kebab")]
pub struct Opt {
    #[structopt(flatten)]
    global_opt: GlobalOpt,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalOpt {
    #[structopt(
        name = "service",
        long,
        global = true,
        env = "CPTOOL_SERVICE",
        default_value = ServiceKind::default().into(),
        possible_values = ServiceKind::VARIANTS,
    )]
    service_id: ServiceKind,
    /// Logs every request
    #[structopt(long, global = true)]
    debug: bool,
    #[structopt(
        long,
        short,
        global = true,
        default_value = OutputFormat::default().into(),
        possible_values = OutputFormat::VARIANTS,
    )]
    output: OutputFormat,
    /// Answers yes to every confirmation
    #[structopt(long, short = "y", global = true)]
    assume_yes: bool,
}

#[derive(
    Serialize,
    EnumString,
    EnumVariantNames,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Default,
    Debug,
    Json,
    Yaml,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Default
    }
}

impl Opt {
    /// Sends `log` records to stderr, keeping stdout for outcomes.
    pub fn init_logger(&self) {
        let level = if self.global_opt.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        let config = ConfigBuilder::new()
            .add_filter_allow_str("cptool")
            .set_time_level(LevelFilter::Off)
            .build();
        let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
    }

    /// Runs the subcommand and prints its outcome. Returns whether the
    /// outcome was successful.
    pub async fn run(&self) -> Result<bool> {
        let conf = Config::load(self.global_opt.service_id, None).context("Could not load config")?;
        let mut cnsl = Console::term(ConsoleConfig {
            assume_yes: self.global_opt.assume_yes,
        });
        let outcome = self.cmd.run(&conf, &mut cnsl).await?;
        let mut stdout = io::stdout();
        outcome.print(&mut stdout, self.global_opt.output)?;
        stdout.flush()?;
        Ok(!outcome.is_error())
    }
}
