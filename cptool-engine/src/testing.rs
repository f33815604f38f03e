//! In-memory judge used by the engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone as _, Utc};
use lazy_static::lazy_static;

use cptool_config::SessionConfig;
use cptool_util::select;
use cptool_util::service::scrape::{ExtractCsrfToken as _, Scrape as _};

use crate::model::{Specifier, Submission, VerdictStatus};
use crate::service::{Document, Form, StatusCode, Transport, Url};
use crate::{Error, Extract, Extracted, JudgeError, Marker, Result, Session, Site, SubmitTarget};

pub const ANON_HOME: &str = r#"<div id="header"><a class="enter" href="/enter">Enter</a></div>"#;
pub const USER_HOME: &str = r#"<div id="header"><a class="profile" href="/profile/tourist">tourist</a> <a class="logout" href="/logout?token=t0k">Logout</a></div>"#;

pub fn doc(url: &str, body: &str) -> Document {
    Document::new(Url::parse(url).unwrap(), StatusCode::OK, body)
}

#[derive(Default)]
struct State {
    routes: HashMap<String, VecDeque<std::result::Result<String, String>>>,
    polls: VecDeque<String>,
    post_responses: HashMap<String, String>,
    gets: Vec<String>,
    posts: Vec<(String, Form)>,
    poll_count: usize,
    cleared: usize,
}

/// Serves canned bodies per address. The last body of a route repeats.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, bodies: &[&str]) {
        self.route_results(url, bodies.iter().map(|body| Ok(*body)).collect());
    }

    pub fn route_results(&self, url: &str, results: Vec<std::result::Result<&str, &str>>) {
        let results = results
            .into_iter()
            .map(|result| result.map(ToOwned::to_owned).map_err(ToOwned::to_owned))
            .collect();
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_owned(), results);
    }

    pub fn push_polls(&self, bodies: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.polls.extend(bodies.iter().map(|body| body.to_string()));
    }

    pub fn respond_post(&self, url: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .post_responses
            .insert(url.to_owned(), body.to_owned());
    }

    pub fn gets(&self) -> Vec<String> {
        self.state.lock().unwrap().gets.clone()
    }

    pub fn posts(&self) -> Vec<(String, Form)> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn poll_count(&self) -> usize {
        self.state.lock().unwrap().poll_count
    }

    pub fn cleared(&self) -> usize {
        self.state.lock().unwrap().cleared
    }

    fn serve(&self, url: &Url, is_get: bool) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        if is_get {
            state.gets.push(url.to_string());
        }
        let queue = state
            .routes
            .get_mut(url.as_str())
            .ok_or_else(|| JudgeError::Transport(format!("No route : {}", url)))?;
        let result = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match result {
            Some(Ok(body)) => Ok(Document::new(url.clone(), StatusCode::OK, body)),
            Some(Err(message)) => Err(JudgeError::Transport(message).into()),
            None => Err(JudgeError::Transport(format!("Empty route : {}", url)).into()),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<Document> {
        self.serve(url, true)
    }

    async fn post_form(&self, url: &Url, form: &Form) -> Result<Document> {
        let mut state = self.state.lock().unwrap();
        state.posts.push((url.to_string(), form.clone()));
        let body = state
            .post_responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| JudgeError::Transport(format!("No post route : {}", url)))?;
        Ok(Document::new(url.clone(), StatusCode::OK, body))
    }

    async fn poll(&self, doc: &Document) -> Result<Document> {
        let polled = {
            let mut state = self.state.lock().unwrap();
            state.poll_count += 1;
            state.polls.pop_front()
        };
        match polled {
            Some(body) => Ok(Document::new(doc.url().clone(), StatusCode::OK, body)),
            None => self.serve(doc.url(), false),
        }
    }

    fn clear_cookies(&self) -> Result<()> {
        self.state.lock().unwrap().cleared += 1;
        Ok(())
    }
}

lazy_static! {
    static ref NOTIFICATION: Marker = Marker::source(r#"Judge\.showMessage\("(.+)"\);"#).unwrap();
    static ref IDENTITY: Marker = Marker::element("#header a.profile").unwrap();
    static ref ANONYMOUS: Marker = Marker::element("#header a.enter").unwrap();
    static ref LOGIN_FORM: Marker = Marker::element("form#enterForm").unwrap();
    static ref LOGIN_REJECTED: Marker = Marker::element(".error.for__password").unwrap();
    static ref LIST_READY: [Marker; 1] = [Marker::element("ul.rows").unwrap()];
    static ref STATUS_READY: [Marker; 1] = [Marker::element("table.status").unwrap()];
    static ref SUBMIT_READY: [Marker; 2] = [
        Marker::element("form.submit-form").unwrap(),
        Marker::element("div.closed").unwrap(),
    ];
    static ref FORM_ERROR: Marker = Marker::element(".error.for__source").unwrap();
}

pub struct TestSite;

impl Site for TestSite {
    fn home_url(&self) -> Url {
        Url::parse("https://judge.test/").unwrap()
    }

    fn login_url(&self) -> Url {
        Url::parse("https://judge.test/enter").unwrap()
    }

    fn notification(&self) -> &Marker {
        &NOTIFICATION
    }

    fn identity(&self) -> &Marker {
        &IDENTITY
    }

    fn anonymous(&self) -> &Marker {
        &ANONYMOUS
    }

    fn login_form_marker(&self) -> &Marker {
        &LOGIN_FORM
    }

    fn login_rejected(&self) -> &Marker {
        &LOGIN_REJECTED
    }

    fn login_form(&self, login_page: &Document, user: &str, pass: &str) -> Result<Form> {
        Ok(vec![
            ("csrf_token".into(), login_page.html().extract_csrf_token()?),
            ("handleOrEmail".into(), user.into()),
            ("password".into(), pass.into()),
        ])
    }

    fn logout_url(&self, page: &Document) -> Result<Url> {
        let href = page
            .html()
            .attr_of(select!("#header a.logout"), "href")
            .ok_or_else(|| Error::msg("Could not find logout link"))?;
        Ok(page.url().join(&href)?)
    }
}

pub fn session_with(transport: &FakeTransport) -> Session {
    session_with_conf(transport, SessionConfig::default())
}

pub fn session_with_conf(transport: &FakeTransport, conf: SessionConfig) -> Session {
    Session::new(Arc::new(transport.clone()), Arc::new(TestSite), conf)
}

fn next_link(doc: &Document) -> Option<Url> {
    doc.html()
        .attr_of(select!("a.next"), "href")
        .and_then(|href| doc.url().join(&href).ok())
}

/// `<ul class="rows"><li class="row">..</li></ul>` listings.
pub struct ListExtractor {
    pub first: &'static str,
}

impl Extract for ListExtractor {
    type Row = String;
    const CAPACITY: usize = 2;

    fn first_url(&self) -> Result<Url> {
        Ok(Url::parse(self.first)?)
    }

    fn ready_markers(&self) -> &[Marker] {
        &*LIST_READY
    }

    fn extract(&self, doc: &Document, _index: usize) -> Extracted<String> {
        let html = doc.html();
        let rows = if html.find_first(select!("ul.rows li.broken")).is_some() {
            Err(Error::msg("Could not parse row"))
        } else {
            Ok(html
                .root_element()
                .select(select!("ul.rows li.row"))
                .map(|li| li.inner_text())
                .collect())
        };
        Extracted::new(rows, next_link(doc))
    }
}

pub fn list_page(rows: &[&str], next: Option<&str>) -> String {
    let items: String = rows
        .iter()
        .map(|row| format!(r#"<li class="row">{}</li>"#, row))
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{}">&rarr;</a>"#, href))
        .unwrap_or_default();
    format!(r#"<ul class="rows">{}</ul>{}"#, items, next)
}

/// `<table class="status">` with one `tr[data-id]` per submission.
pub struct StatusExtractor {
    pub first: &'static str,
}

impl Extract for StatusExtractor {
    type Row = Submission;
    const CAPACITY: usize = 500;

    fn first_url(&self) -> Result<Url> {
        Ok(Url::parse(self.first)?)
    }

    fn ready_markers(&self) -> &[Marker] {
        &*STATUS_READY
    }

    fn extract(&self, doc: &Document, _index: usize) -> Extracted<Submission> {
        let html = doc.html();
        let rows = html
            .root_element()
            .select(select!("table.status tr[data-id]"))
            .map(|tr| -> Result<Submission> {
                let id = tr.value().attr("data-id").unwrap_or_default().parse()?;
                let status = match tr.value().attr("data-verdict").unwrap_or_default() {
                    "OK" => Some(VerdictStatus::Accepted),
                    "CE" => Some(VerdictStatus::CompilationError),
                    "WA" => Some(VerdictStatus::WrongAnswer),
                    _ => None,
                };
                Ok(Submission::new(
                    id,
                    Utc.timestamp_opt(0, 0).unwrap(),
                    "tourist",
                    "A",
                    "GNU G++17 7.3.0",
                    tr.inner_text(),
                    status,
                    "0 ms",
                    "0 KB",
                    Specifier::new(Some("1"), Some("a"), None),
                ))
            })
            .collect();
        Extracted::new(rows, next_link(doc))
    }
}

pub fn status_page(rows: &[(u64, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(id, verdict)| {
            format!(
                r#"<tr data-id="{}" data-verdict="{}"><td>{}</td></tr>"#,
                id, verdict, verdict
            )
        })
        .collect();
    format!(r#"<table class="status">{}</table>"#, rows)
}

pub struct TestTarget {
    pub specifier: Specifier,
}

impl Default for TestTarget {
    fn default() -> Self {
        Self {
            specifier: Specifier::new(Some("1"), Some("a"), None),
        }
    }
}

impl SubmitTarget for TestTarget {
    type Status = StatusExtractor;

    fn specifier(&self) -> &Specifier {
        &self.specifier
    }

    fn is_known_language(&self, lang: &str) -> bool {
        ["GNU G++17 7.3.0", "Rust 1.49.0"].contains(&lang)
    }

    fn submit_url(&self) -> Result<Url> {
        Ok(Url::parse("https://judge.test/submit")?)
    }

    fn submit_markers(&self) -> &[Marker] {
        &*SUBMIT_READY
    }

    fn language_option(&self, page: &Document, lang: &str) -> Option<String> {
        page.html()
            .root_element()
            .select(select!(r#"select[name="programTypeId"] option"#))
            .find(|option| option.inner_text().trim() == lang)
            .and_then(|option| option.value().attr("value").map(ToOwned::to_owned))
    }

    fn submit_form(&self, page: &Document, lang_id: &str, source: &str) -> Result<Form> {
        Ok(vec![
            ("csrf_token".into(), page.html().extract_csrf_token()?),
            ("programTypeId".into(), lang_id.into()),
            ("source".into(), source.into()),
        ])
    }

    fn form_error(&self) -> &Marker {
        &FORM_ERROR
    }

    fn is_confirmation(&self, message: &str) -> bool {
        message.ends_with("has been submitted successfully")
    }

    fn status(&self) -> Result<StatusExtractor> {
        Ok(StatusExtractor {
            first: "https://judge.test/my",
        })
    }
}

pub const SUBMIT_PAGE: &str = r#"<form class="submit-form"><input name="csrf_token" value="c5f"/><select name="programTypeId"><option value="54">GNU G++17 7.3.0</option></select></form>"#;
