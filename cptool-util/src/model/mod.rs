mod contest;
mod page;
mod problem;
mod service;
mod specifier;
mod submission;

pub use contest::*;
pub use page::*;
pub use problem::*;
pub use service::*;
pub use specifier::*;
pub use submission::*;

pub type LangId = String;

pub type LangIdRef<'a> = &'a str;

pub type LangName = String;

pub type LangNameRef<'a> = &'a str;
