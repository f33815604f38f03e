#![warn(clippy::all)]

//! Codeforces integration for cptool.
//!
//! Addresses, markers and extractors for the judge's pages, the specifier
//! grammar and the [`CodeforcesActor`] that drives them through a
//! [`cptool_engine::Session`].

mod actor;
mod lang;
mod page;
mod parse;

use cptool_config as config;
use cptool_util::{model, service, JudgeError};

pub use actor::{CodeforcesActor, CodeforcesSite};
pub use lang::{lang_id, lang_name_for_ext, LANGUAGES};
pub use page::{
    ContestsExtractor, LiveSubmissions, ProblemsExtractor, SubmissionsExtractor, SubmitForm,
    BASE_URL,
};
pub use parse::parse_specifier;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;
