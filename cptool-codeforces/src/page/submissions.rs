use anyhow::Context as _;
use cptool_engine::{Extract, Extracted, Marker};
use cptool_util::select;
use lazy_static::lazy_static;
use scraper::ElementRef;

use crate::model::{Specifier, Submission, VerdictStatus};
use crate::page::{next_page, parse_time, submissions_url, text_of, BASE_URL};
use crate::parse::parse_specifier;
use crate::service::scrape::Scrape as _;
use crate::service::{Document, Url};
use crate::Result;

lazy_static! {
    static ref READY: [Marker; 1] = [Marker::element("table.status-frame-datatable").unwrap()];
}

/// Rows of a submissions table, optionally narrowed to one problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionsExtractor {
    url: Url,
    problem: Option<String>,
}

impl SubmissionsExtractor {
    pub fn new(spec: &Specifier, handle: Option<&str>) -> Result<Self> {
        Ok(Self {
            url: submissions_url(&spec.without_problem(), handle)?,
            problem: spec.problem().map(ToOwned::to_owned),
        })
    }

    fn extract_rows(&self, doc: &Document) -> Result<Vec<Submission>> {
        let mut submissions = Vec::new();
        for tr in doc.html().select(select!("tr[data-submission-id]")) {
            let submission = extract_row(tr)?;
            match (&self.problem, submission.specifier().problem()) {
                (Some(wanted), Some(problem)) if !wanted.eq_ignore_ascii_case(problem) => {}
                (Some(_), None) => {}
                _ => submissions.push(submission),
            }
        }
        Ok(submissions)
    }
}

fn extract_row(tr: ElementRef) -> Result<Submission> {
    let id = tr
        .value()
        .attr("data-submission-id")
        .context("Could not find submission id")?
        .parse()
        .context("Could not parse submission id")?;
    let verdict_cell = tr
        .find_first(select!("td:nth-of-type(6)"))
        .context("Could not find verdict")?;
    let verdict = text_of(tr, select!("td:nth-of-type(6)"));
    let verdict_status = if verdict_cell.value().attr("waiting") == Some("true") {
        None
    } else {
        let code = verdict_cell.attr_of(select!("[submissionverdict]"), "submissionverdict");
        let status = code
            .as_deref()
            .and_then(status_from_code)
            .or_else(|| status_from_text(&verdict))
            .unwrap_or_else(|| {
                log::warn!("Unrecognized verdict of submission {} : {}", id, verdict);
                VerdictStatus::Unrecognized
            });
        Some(status)
    };
    let specifier = tr
        .attr_of(select!("td:nth-of-type(4) a"), "href")
        .and_then(|href| BASE_URL.join(&href).ok())
        .and_then(|url| parse_specifier(url.as_str()).ok())
        .unwrap_or_default();
    Ok(Submission::new(
        id,
        parse_time(&text_of(tr, select!("td:nth-of-type(2)"))),
        text_of(tr, select!("td:nth-of-type(3)")),
        text_of(tr, select!("td:nth-of-type(4)")),
        text_of(tr, select!("td:nth-of-type(5)")),
        verdict,
        verdict_status,
        text_of(tr, select!("td:nth-of-type(7)")),
        text_of(tr, select!("td:nth-of-type(8)")),
        specifier,
    ))
}

fn status_from_code(code: &str) -> Option<VerdictStatus> {
    use VerdictStatus::*;

    let status = match code {
        "OK" => Accepted,
        "WRONG_ANSWER" => WrongAnswer,
        "PRESENTATION_ERROR" => PresentationError,
        "RUNTIME_ERROR" => RuntimeError,
        "COMPILATION_ERROR" => CompilationError,
        "TIME_LIMIT_EXCEEDED" => TimeLimitExceeded,
        "MEMORY_LIMIT_EXCEEDED" => MemoryLimitExceeded,
        "IDLENESS_LIMIT_EXCEEDED" => IdlenessLimitExceeded,
        "CRASHED" | "FAILED" | "SECURITY_VIOLATED" | "REJECTED" => DenialOfJudgement,
        "SKIPPED" => Skipped,
        "CHALLENGED" => Hacked,
        _ => return None,
    };
    Some(status)
}

fn status_from_text(text: &str) -> Option<VerdictStatus> {
    use VerdictStatus::*;

    let text = text.to_lowercase();
    let table = [
        ("accepted", Accepted),
        ("pretests passed", Accepted),
        ("perfect result", Accepted),
        ("wrong answer", WrongAnswer),
        ("presentation error", PresentationError),
        ("runtime error", RuntimeError),
        ("compilation error", CompilationError),
        ("time limit exceeded", TimeLimitExceeded),
        ("memory limit exceeded", MemoryLimitExceeded),
        ("idleness limit exceeded", IdlenessLimitExceeded),
        ("denial of judgement", DenialOfJudgement),
        ("skipped", Skipped),
        ("hacked", Hacked),
    ];
    table
        .iter()
        .find(|(prefix, _)| text.starts_with(prefix))
        .map(|(_, status)| *status)
}

impl Extract for SubmissionsExtractor {
    type Row = Submission;
    const CAPACITY: usize = 100;

    fn first_url(&self) -> Result<Url> {
        Ok(self.url.clone())
    }

    fn ready_markers(&self) -> &[Marker] {
        &*READY
    }

    fn extract(&self, doc: &Document, _index: usize) -> Extracted<Submission> {
        Extracted::new(self.extract_rows(doc), next_page(doc, &doc.html()))
    }
}

/// The same table followed live after a submit, with room for every
/// snapshot a judging run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSubmissions(pub SubmissionsExtractor);

impl Extract for LiveSubmissions {
    type Row = Submission;
    const CAPACITY: usize = 500;

    fn first_url(&self) -> Result<Url> {
        self.0.first_url()
    }

    fn ready_markers(&self) -> &[Marker] {
        self.0.ready_markers()
    }

    fn extract(&self, doc: &Document, index: usize) -> Extracted<Submission> {
        self.0.extract(doc, index)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    /// `(id, problem, waiting, submissionverdict, verdict text)`
    pub type Row<'a> = (u64, &'a str, bool, Option<&'a str>, &'a str);

    pub fn status_table(rows: &[Row]) -> String {
        let rows: String = rows
            .iter()
            .map(|(id, problem, waiting, code, text)| {
                let verdict = match code {
                    Some(code) => format!(
                        r#"<span class="submissionVerdictWrapper" submissionverdict="{}">{}</span>"#,
                        code, text
                    ),
                    None => text.to_string(),
                };
                format!(
                    r#"<tr data-submission-id="{id}">
                    <td><a href="/contest/1234/submission/{id}">{id}</a></td>
                    <td><span class="format-time">Feb/12/2020 17:20</span></td>
                    <td><a href="/profile/tourist">tourist</a></td>
                    <td><a href="/contest/1234/problem/{problem}">{problem} - Problem</a></td>
                    <td>GNU C++17</td>
                    <td class="status-verdict-cell" waiting="{waiting}">{verdict}</td>
                    <td>15 ms</td>
                    <td>3600 KB</td>
                    </tr>"#,
                    id = id,
                    problem = problem,
                    waiting = waiting,
                    verdict = verdict,
                )
            })
            .collect();
        format!(
            r#"<table class="status-frame-datatable"><tr><th>#</th></tr>{}</table>"#,
            rows
        )
    }
}
