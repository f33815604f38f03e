use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::model::ServiceKind;

use crate::cmd::Outcome;
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct LogoutOpt {}

impl LogoutOpt {
    pub async fn run(&self, actor: &dyn Act, conf: &Config) -> Result<LogoutOutcome> {
        actor.logout().await?;
        Ok(LogoutOutcome {
            service: conf.service_id,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogoutOutcome {
    service: ServiceKind,
}

impl fmt::Display for LogoutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Successfully logged out from {}", self.service)
    }
}

impl Outcome for LogoutOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
