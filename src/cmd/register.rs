use std::fmt;
use std::io::Write as _;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::console::sty_dim;
use cptool_util::model::Registration;
use cptool_util::Console;

use crate::cmd::{parse_spec, Outcome};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct RegisterOpt {
    #[structopt(name = "spec")]
    spec: String,
}

impl RegisterOpt {
    /// Shows the registration terms and registers once they are accepted.
    pub async fn run(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<RegisterOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let registration = actor.registration(&spec).await?;
        writeln!(cnsl, "{}", registration.name())?;
        writeln!(cnsl, "{}", sty_dim(registration.terms()))?;
        let registered = cnsl.confirm("Accept the terms and register?", false)?;
        if registered {
            actor.register(&spec).await?;
        }
        Ok(RegisterOutcome {
            registration,
            registered,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegisterOutcome {
    registration: Registration,
    registered: bool,
}

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.registered {
            write!(f, "Registered for {}", self.registration.name())
        } else {
            write!(f, "Did not register for {}", self.registration.name())
        }
    }
}

impl Outcome for RegisterOutcome {
    fn is_error(&self) -> bool {
        !self.registered
    }
}
