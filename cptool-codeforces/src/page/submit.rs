use cptool_engine::{Marker, SubmitTarget};
use cptool_util::select;
use lazy_static::lazy_static;

use crate::lang::lang_id;
use crate::model::Specifier;
use crate::page::{hidden_fields, submit_url, LiveSubmissions, SubmissionsExtractor, FORM_ERROR};
use crate::service::scrape::{clean, Scrape as _};
use crate::service::{Document, Form, Url};
use crate::{JudgeError, Result};

lazy_static! {
    static ref MARKERS: [Marker; 2] = [
        Marker::element("form.submit-form").unwrap(),
        Marker::element_text(
            "#pageContent",
            r"(?i)(?:submissions? (?:is|are) closed|contest is over|not allowed to submit)"
        )
        .unwrap(),
    ];
}

/// Submit form of one problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitForm {
    spec: Specifier,
}

impl SubmitForm {
    pub fn new(spec: Specifier) -> Self {
        Self { spec }
    }
}

impl SubmitTarget for SubmitForm {
    type Status = LiveSubmissions;

    fn specifier(&self) -> &Specifier {
        &self.spec
    }

    fn is_known_language(&self, lang: &str) -> bool {
        lang_id(lang).is_some()
    }

    fn submit_url(&self) -> Result<Url> {
        submit_url(&self.spec)
    }

    fn submit_markers(&self) -> &[Marker] {
        &*MARKERS
    }

    fn language_option(&self, page: &Document, lang: &str) -> Option<String> {
        page.html()
            .root_element()
            .select(select!(r#"select[name="programTypeId"] option"#))
            .find(|option| clean(&option.inner_text()) == lang)
            .and_then(|option| option.value().attr("value"))
            .map(ToOwned::to_owned)
    }

    fn submit_form(&self, page: &Document, lang_id: &str, source: &str) -> Result<Form> {
        let (contest, problem) = match (self.spec.contest(), self.spec.problem()) {
            (Some(contest), Some(problem)) => (contest, problem),
            _ => {
                return Err(
                    JudgeError::InvalidSpecifier(format!("problem is required : {}", self.spec))
                        .into(),
                )
            }
        };
        let mut form = hidden_fields(&page.html())?;
        form.extend(vec![
            ("action".to_owned(), "submitSolutionFormSubmitted".to_owned()),
            ("submittedProblemIndex".to_owned(), problem.to_owned()),
            ("contestId".to_owned(), contest.to_owned()),
            ("programTypeId".to_owned(), lang_id.to_owned()),
            ("source".to_owned(), source.to_owned()),
            ("tabSize".to_owned(), "4".to_owned()),
            ("sourceCodeConfirmed".to_owned(), "true".to_owned()),
        ]);
        Ok(form)
    }

    fn form_error(&self) -> &Marker {
        &*FORM_ERROR
    }

    fn is_confirmation(&self, message: &str) -> bool {
        let problem = self.spec.problem().unwrap_or_default();
        message.eq_ignore_ascii_case(&format!(
            "Solution to the problem {} has been submitted successfully",
            problem
        ))
    }

    fn status(&self) -> Result<LiveSubmissions> {
        Ok(LiveSubmissions(SubmissionsExtractor::new(&self.spec, None)?))
    }
}
