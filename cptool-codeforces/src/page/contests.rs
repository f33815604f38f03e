use anyhow::Context as _;
use chrono::{DateTime, Utc};
use cptool_engine::{Extract, Extracted, Marker};
use cptool_util::{regex, select};
use lazy_static::lazy_static;
use scraper::ElementRef;

use crate::model::{Class, Contest, RegistrationState, Specifier};
use crate::page::{contests_url, next_page, parse_length, parse_time, text_of};
use crate::service::scrape::{clean, Scrape as _};
use crate::service::{Document, Url};
use crate::Result;

lazy_static! {
    static ref READY: [Marker; 1] = [Marker::element("div.datatable").unwrap()];
}

/// Rows of a contest listing.
///
/// Standard listings show upcoming contests above the archive; the first
/// page yields both tables, later pages only the archive.
#[derive(Debug, Clone)]
pub struct ContestsExtractor {
    spec: Specifier,
    omit_finished: bool,
    now: DateTime<Utc>,
}

impl ContestsExtractor {
    pub fn new(spec: Specifier, omit_finished: bool) -> Self {
        Self {
            spec,
            omit_finished,
            now: Utc::now(),
        }
    }

    /// Judges "finished" against `now` instead of the current time.
    pub fn at(self, now: DateTime<Utc>) -> Self {
        Self { now, ..self }
    }

    fn is_gym_layout(&self) -> bool {
        match self.spec.class() {
            Some(Class::Group) => true,
            Some(Class::Gym) => self.spec.contest().is_none(),
            _ => false,
        }
    }

    fn has_registration(&self) -> bool {
        self.spec.class() == Some(Class::Contest)
    }

    fn extract_rows(&self, rows: Vec<ElementRef>) -> Result<(Vec<Contest>, bool)> {
        let mut contests = Vec::new();
        for tr in rows {
            let contest = if self.is_gym_layout() {
                self.gym_row(tr)
            } else {
                self.standard_row(tr)
            }?;
            if self.omit_finished && contest.is_finished(self.now) {
                return Ok((contests, true));
            }
            contests.push(contest);
        }
        Ok((contests, false))
    }

    fn row_specifier(&self, tr: ElementRef) -> Result<Specifier> {
        let id = tr
            .value()
            .attr("data-contestid")
            .context("Could not find contest id")?;
        Ok(Specifier::new(Some(id), None, self.spec.group()))
    }

    fn standard_row(&self, tr: ElementRef) -> Result<Contest> {
        let name = tr
            .find_first(select!("td:nth-of-type(1)"))
            .map(|td| clean(&td.text_excluding("a")))
            .context("Could not find contest name")?;
        let writers = tr
            .select(select!("td:nth-of-type(2) a"))
            .map(|a| clean(&a.inner_text()))
            .filter(|writer| !writer.is_empty())
            .collect();
        let (reg_count, reg_state) = if self.has_registration() {
            let count = text_of(tr, select!(".contestParticipantCountLinkMargin"));
            let count = regex!(r"\d+")
                .find(&count)
                .and_then(|m| m.as_str().parse().ok());
            (count, registration_state(tr))
        } else {
            (None, RegistrationState::NotApplicable)
        };
        Ok(Contest::new(
            name,
            writers,
            parse_time(&text_of(tr, select!("td:nth-of-type(3)"))),
            parse_length(&text_of(tr, select!("td:nth-of-type(4)"))),
            reg_count,
            reg_state,
            Vec::new(),
            self.row_specifier(tr)?,
        ))
    }

    fn gym_row(&self, tr: ElementRef) -> Result<Contest> {
        let name = tr
            .find_first(select!("td:nth-of-type(1)"))
            .map(|td| clean(&td.text_excluding("a")))
            .context("Could not find contest name")?;
        let description = tr
            .select(select!("td:nth-of-type(5) .small"))
            .map(|small| clean(&small.inner_text()))
            .collect();
        Ok(Contest::new(
            name,
            Vec::new(),
            parse_time(&text_of(tr, select!("td:nth-of-type(2)"))),
            parse_length(&text_of(tr, select!("td:nth-of-type(3)"))),
            None,
            RegistrationState::NotApplicable,
            description,
            self.row_specifier(tr)?,
        ))
    }
}

fn registration_state(tr: ElementRef) -> RegistrationState {
    if tr.find_first(select!("td:nth-of-type(6) .welldone")).is_some() {
        RegistrationState::Done
    } else if tr
        .select(select!("td:nth-of-type(6) a:not([title])"))
        .any(|a| !in_countdown(a))
    {
        RegistrationState::Open
    } else {
        RegistrationState::Closed
    }
}

fn in_countdown(elem: ElementRef) -> bool {
    elem.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|parent| parent.value().classes().any(|class| class == "countdown"))
}

impl Extract for ContestsExtractor {
    type Row = Contest;
    const CAPACITY: usize = 10;

    fn first_url(&self) -> Result<Url> {
        contests_url(&self.spec)
    }

    fn ready_markers(&self) -> &[Marker] {
        &*READY
    }

    fn extract(&self, doc: &Document, index: usize) -> Extracted<Contest> {
        let html = doc.html();
        let archive_only = index > 0 && !self.is_gym_layout() && self.spec.contest().is_none();
        let rows = if archive_only {
            html.select(select!("div.contests-table tr[data-contestid]"))
                .collect()
        } else {
            html.select(select!("tr[data-contestid]")).collect()
        };
        match self.extract_rows(rows) {
            Ok((contests, true)) => Extracted::new(Ok(contests), None),
            Ok((contests, false)) => Extracted::new(Ok(contests), next_page(doc, &html)),
            Err(err) => Extracted::new(Err(err), next_page(doc, &html)),
        }
    }
}
