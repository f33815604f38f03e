use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone as _, Utc};
use cptool_engine::Marker;
use cptool_util::{regex, select};
use lazy_static::lazy_static;
use rand::Rng as _;
use scraper::{ElementRef, Html, Node};

use crate::model::{Class, Specifier};
use crate::service::scrape::{clean, ExtractCsrfToken as _, Scrape as _};
use crate::service::{Document, Form, Url};
use crate::{JudgeError, Result};

mod contests;
mod dashboard;
mod login;
mod problems;
mod submissions;
mod submit;

pub use contests::ContestsExtractor;
pub use dashboard::{
    extract_countdown, extract_registration, extract_source, is_registered, register_form,
    COUNTDOWN, REGISTRATION, SOURCE,
};
pub use login::{login_form, logout_url};
pub use problems::ProblemsExtractor;
pub use submissions::{LiveSubmissions, SubmissionsExtractor};
pub use submit::SubmitForm;
#[cfg(test)]
pub(crate) use submissions::testing::status_table;

lazy_static! {
    pub static ref BASE_URL: Url = Url::parse("https://codeforces.com").unwrap();
    pub static ref NOTIFICATION: Marker =
        Marker::source(r#"Codeforces\.showMessage\("(.+?)"\);\s*Codeforces\.reformatTimes\(\);"#)
            .unwrap();
    pub static ref IDENTITY: Marker = Marker::element(r#"#header a[href^="/profile/"]"#).unwrap();
    pub static ref ANONYMOUS: Marker = Marker::element(r#"#header a[href^="/enter"]"#).unwrap();
    pub static ref LOGIN_FORM: Marker = Marker::element("form#enterForm").unwrap();
    pub static ref LOGIN_REJECTED: Marker = Marker::element(".error.for__password").unwrap();
    pub static ref FORM_ERROR: Marker = Marker::element(".error.for__source").unwrap();
}

/// Site time is Moscow time.
const SITE_OFFSET_SECS: i32 = 3 * 60 * 60;

const TTA: &str = "176";

fn invalid(spec: &Specifier, reason: &str) -> JudgeError {
    JudgeError::InvalidSpecifier(format!("{} : {}", reason, spec))
}

fn join(path: &str) -> Result<Url> {
    BASE_URL
        .join(path)
        .with_context(|| format!("Could not parse url path : {}", path))
}

/// `/contest/1234`, `/gym/100001` or `/group/Qvv4lz52cT/contest/201468`.
fn contest_path(spec: &Specifier) -> Result<String> {
    let contest = spec
        .contest()
        .ok_or_else(|| invalid(spec, "contest is required"))?;
    match (spec.class(), spec.group()) {
        (Some(Class::Group), Some(group)) => Ok(format!("/group/{}/contest/{}", group, contest)),
        (Some(Class::Group), None) | (None, _) => Err(invalid(spec, "unknown contest class").into()),
        (Some(class), _) => Ok(format!("/{}/{}", class, contest)),
    }
}

pub fn countdown_url(spec: &Specifier) -> Result<Url> {
    join(&format!("{}/countdown", contest_path(spec)?))
}

/// Listing of contests. A single group contest can only be read from the
/// whole group listing.
pub fn contests_url(spec: &Specifier) -> Result<Url> {
    let path = match (spec.class(), spec.contest(), spec.group()) {
        (Some(Class::Group), _, Some(group)) => format!("/group/{}/contests?complete=true", group),
        (Some(Class::Contest), None, _) => "/contests?complete=true".to_owned(),
        (Some(Class::Gym), None, _) => "/gyms?complete=true".to_owned(),
        (Some(_), Some(contest), _) => format!("/contests/{}", contest),
        _ => return Err(invalid(spec, "unknown contest class").into()),
    };
    join(&path)
}

pub fn dashboard_url(spec: &Specifier) -> Result<Url> {
    join(&contest_path(spec)?)
}

/// Registration exists for standard contests only.
pub fn registration_url(spec: &Specifier) -> Result<Url> {
    match (spec.class(), spec.contest()) {
        (Some(Class::Contest), Some(contest)) => join(&format!("/contestRegistration/{}", contest)),
        _ => Err(invalid(spec, "registration needs a standard contest").into()),
    }
}

pub fn problems_url(spec: &Specifier) -> Result<Url> {
    let path = contest_path(spec)?;
    match spec.problem() {
        Some(problem) => join(&format!("{}/problem/{}", path, problem)),
        None => join(&format!("{}/problems", path)),
    }
}

pub fn submit_url(spec: &Specifier) -> Result<Url> {
    join(&format!("{}/submit", contest_path(spec)?))
}

/// Submissions of `handle` or, when `None`, of the current user.
///
/// Without a contest the whole profile is listed, which needs a handle.
/// Groups only show the current user's submissions.
pub fn submissions_url(spec: &Specifier, handle: Option<&str>) -> Result<Url> {
    let path = match (spec.contest(), spec.class(), handle) {
        (None, _, Some(handle)) => format!("/submissions/{}", handle),
        (None, _, None) => return Err(invalid(spec, "handle is required").into()),
        (Some(_), Some(Class::Group), Some(_)) => {
            return Err(invalid(spec, "group submissions of others are hidden").into())
        }
        (Some(_), Some(Class::Group), None) => format!("{}/my", contest_path(spec)?),
        (Some(contest), Some(class), Some(handle)) => {
            format!("/submissions/{}/{}/{}", handle, class, contest)
        }
        (Some(_), _, None) => format!("{}/my", contest_path(spec)?),
        (Some(_), None, Some(_)) => return Err(invalid(spec, "unknown contest class").into()),
    };
    join(&path)
}

pub fn source_url(spec: &Specifier, id: u64) -> Result<Url> {
    join(&format!("{}/submission/{}", contest_path(spec)?, id))
}

/// Parses `Apr/01/2010 19:45` or `01.04.2010 19:45` in site time.
///
/// Anything else maps to the Unix epoch.
pub(crate) fn parse_time(text: &str) -> DateTime<Utc> {
    let epoch = DateTime::<Utc>::default();
    let offset = match FixedOffset::east_opt(SITE_OFFSET_SECS) {
        Some(offset) => offset,
        None => return epoch,
    };
    let en = regex!(r"[A-Z][a-z]{2}/\d{2}/\d{4} \d{2}:\d{2}");
    let ru = regex!(r"\d{2}\.\d{2}\.\d{4} \d{2}:\d{2}");
    let parsed = if let Some(m) = en.find(text) {
        NaiveDateTime::parse_from_str(m.as_str(), "%b/%d/%Y %H:%M").ok()
    } else if let Some(m) = ru.find(text) {
        NaiveDateTime::parse_from_str(m.as_str(), "%d.%m.%Y %H:%M").ok()
    } else {
        None
    };
    parsed
        .and_then(|time| offset.from_local_datetime(&time).single())
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or(epoch)
}

/// Parses contest lengths written `hh:mm` or `dd:hh:mm`.
pub(crate) fn parse_length(text: &str) -> Duration {
    let parts: Vec<u64> = text
        .trim()
        .split(':')
        .map(|part| part.trim().parse())
        .collect::<std::result::Result<_, _>>()
        .unwrap_or_default();
    let units: &[u64] = match parts.len() {
        3 => &[24 * 60 * 60, 60 * 60, 60],
        2 => &[60 * 60, 60],
        _ => &[],
    };
    let secs = parts
        .iter()
        .zip(units)
        .try_fold(0u64, |acc, (part, unit)| part.checked_mul(*unit)?.checked_add(acc));
    Duration::from_secs(secs.unwrap_or_default())
}

/// Link behind the right arrow of the pagination bar.
pub(crate) fn next_page(doc: &Document, html: &Html) -> Option<Url> {
    html.root_element()
        .select(select!("div.pagination a.arrow"))
        .find(|a| a.inner_text().contains('\u{2192}'))
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| doc.url().join(href).ok())
}

/// Text of a sample `<pre>`, one line per `div` or `<br>`, ending in a newline.
pub(crate) fn pre_text(pre: ElementRef) -> String {
    let lines: Vec<String> = pre
        .select(select!("div.test-example-line"))
        .map(|line| line.inner_text())
        .collect();
    let text = if lines.is_empty() {
        let mut text = String::new();
        for child in pre.children() {
            match child.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(elem) if elem.name() == "br" => text.push('\n'),
                _ => {
                    if let Some(elem) = ElementRef::wrap(child) {
                        text.push_str(&elem.inner_text());
                    }
                }
            }
        }
        text
    } else {
        lines.join("\n")
    };
    format!("{}\n", text.trim())
}

/// Csrf token from the `.csrf-token` span, falling back to form fields.
pub(crate) fn csrf_token(html: &Html) -> Result<String> {
    match html.attr_of(select!("span.csrf-token"), "data-csrf") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => html.extract_csrf_token(),
    }
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Hidden fields every form post on the site carries.
pub(crate) fn hidden_fields(html: &Html) -> Result<Form> {
    Ok(vec![
        ("csrf_token".to_owned(), csrf_token(html)?),
        ("ftaa".to_owned(), random_hex(18)),
        ("bfaa".to_owned(), random_hex(32)),
        ("_tta".to_owned(), TTA.to_owned()),
    ])
}

pub(crate) fn text_of(elem: ElementRef, sel: &scraper::Selector) -> String {
    elem.find_first(sel)
        .map(|found| clean(&found.inner_text()))
        .unwrap_or_default()
}
