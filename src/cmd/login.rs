use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::model::ServiceKind;
use cptool_util::Console;

use crate::cmd::Outcome;
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct LoginOpt {}

impl LoginOpt {
    /// Credentials are read from the service's environment variables, or
    /// prompted for when those are unset.
    pub async fn run(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<LoginOutcome> {
        if let Some(user) = actor.current_user().await? {
            return Ok(LoginOutcome::new(conf.service_id, user, true));
        }
        let (user_env, pass_env) = conf.service_id.to_user_pass_env_names();
        let user = cnsl.get_env_or_prompt_and_read(user_env, "username: ", false)?;
        let pass = cnsl.get_env_or_prompt_and_read(pass_env, "password: ", true)?;
        let handle = actor.login(&user, &pass).await?;
        Ok(LoginOutcome::new(conf.service_id, handle, false))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginOutcome {
    service: ServiceKind,
    user: String,
    already: bool,
}

impl LoginOutcome {
    fn new(service: ServiceKind, user: String, already: bool) -> Self {
        Self {
            service,
            user,
            already,
        }
    }
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.already {
            write!(f, "Already logged in to {} as {}", self.service, self.user)
        } else {
            write!(f, "Successfully logged in to {} as {}", self.service, self.user)
        }
    }
}

impl Outcome for LoginOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
