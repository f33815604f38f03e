#![warn(clippy::all)]

#[macro_use]
extern crate strum;

use std::env;

use lazy_static::lazy_static;

pub mod abs_path;
pub mod console;
mod error;
mod macros;
pub mod model;
pub mod service;

pub use console::{Console, ConsoleConfig};
pub use error::JudgeError;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

lazy_static! {
    /// Directory where cptool keeps data that outlives a single run (cookies).
    pub static ref DATA_LOCAL_DIR: abs_path::AbsPathBuf = abs_path::AbsPathBuf::try_new(
        dirs::data_local_dir()
            .unwrap_or_else(env::temp_dir)
            .join("cptool")
    )
    .expect("data local dir must be absolute");
}
