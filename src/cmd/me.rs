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
pub struct MeOpt {}

impl MeOpt {
    pub async fn run(&self, actor: &dyn Act, conf: &Config) -> Result<MeOutcome> {
        let user = actor.current_user().await?;
        Ok(MeOutcome::new(conf.service_id, user))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeOutcome {
    service: ServiceKind,
    user: Option<String>,
}

impl MeOutcome {
    pub(crate) fn new(service: ServiceKind, user: Option<String>) -> Self {
        Self { service, user }
    }
}

impl fmt::Display for MeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "Logged in to {} as {}", self.service, user),
            None => write!(f, "Not logged in to {}", self.service),
        }
    }
}

impl Outcome for MeOutcome {
    fn is_error(&self) -> bool {
        self.user.is_none()
    }
}
