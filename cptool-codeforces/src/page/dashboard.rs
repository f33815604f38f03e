use std::time::Duration;

use anyhow::Context as _;
use cptool_engine::Marker;
use cptool_util::{regex, select};
use lazy_static::lazy_static;

use crate::model::{Registration, Specifier};
use crate::page::{hidden_fields, text_of};
use crate::service::scrape::Scrape as _;
use crate::service::{Document, Form};
use crate::Result;

lazy_static! {
    /// A running countdown, or the dashboard it redirects to once it is over.
    pub static ref COUNTDOWN: [Marker; 2] = [
        Marker::element("span.countdown").unwrap(),
        Marker::element("table.problems").unwrap(),
    ];
    pub static ref SOURCE: [Marker; 1] = [Marker::element("pre#program-source-text").unwrap()];
    pub static ref REGISTRATION: [Marker; 1] = [Marker::element(".terms").unwrap()];
}

/// Time left on a countdown page. Anything unreadable counts as over.
pub fn extract_countdown(doc: &Document) -> Duration {
    let html = doc.html();
    let text = match html.find_first(select!("span.countdown")) {
        Some(span) => span.inner_text(),
        None => return Duration::from_secs(0),
    };
    let secs = regex!(r"(\d+):(\d{2}):(\d{2})")
        .captures(&text)
        .and_then(|caps| {
            let part = |i: usize| caps[i].parse::<u64>().ok();
            part(1)?
                .checked_mul(3600)?
                .checked_add(part(2)? * 60 + part(3)?)
        })
        .unwrap_or_default();
    Duration::from_secs(secs)
}

pub fn extract_source(doc: &Document) -> Result<String> {
    doc.html()
        .find_first(select!("pre#program-source-text"))
        .map(|pre| pre.inner_text())
        .context("Could not find submission source")
}

pub fn extract_registration(doc: &Document, spec: &Specifier) -> Result<Registration> {
    let html = doc.html();
    let root = html.root_element();
    let name = text_of(root, select!("h2"));
    if name.is_empty() {
        return Err(anyhow::anyhow!("Could not find contest name : {}", doc.url()));
    }
    Ok(Registration::new(
        name,
        text_of(root, select!(".terms")),
        spec.clone(),
    ))
}

/// Registers the current user alone, not as a team.
pub fn register_form(doc: &Document) -> Result<Form> {
    let mut form = hidden_fields(&doc.html()).context("Could not read registration page")?;
    form.extend(vec![
        ("action".to_owned(), "formSubmitted".to_owned()),
        ("backUrl".to_owned(), String::new()),
        ("takePartAs".to_owned(), "personal".to_owned()),
    ]);
    Ok(form)
}

/// Whether a message shown after registering reports success.
pub fn is_registered(message: &str) -> bool {
    regex!(r"(?i)(?:you have been|successfully) registered").is_match(message)
}
