use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;

use crate::cmd::{parse_spec, Outcome};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct SourceOpt {
    /// Contest the submission belongs to
    #[structopt(name = "spec")]
    spec: String,
    #[structopt(name = "id")]
    id: u64,
}

impl SourceOpt {
    pub async fn run(&self, actor: &dyn Act, conf: &Config) -> Result<SourceOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let source = actor.source_code(&spec, self.id).await?;
        Ok(SourceOutcome {
            id: self.id,
            source,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceOutcome {
    id: u64,
    source: String,
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.source.trim_end())
    }
}

impl Outcome for SourceOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
