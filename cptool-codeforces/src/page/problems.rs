use anyhow::Context as _;
use cptool_engine::{Extract, Extracted, Marker};
use cptool_util::select;
use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};

use crate::model::{Problem, SampleTest, Specifier};
use crate::page::{pre_text, problems_url, text_of};
use crate::service::scrape::{clean, Scrape as _};
use crate::service::{Document, Url};
use crate::Result;

lazy_static! {
    static ref READY: [Marker; 1] = [Marker::element(".problemindexholder").unwrap()];
}

/// Statements of one problem, or of every problem on the complete
/// problemset page of a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemsExtractor {
    spec: Specifier,
}

impl ProblemsExtractor {
    pub fn new(spec: Specifier) -> Self {
        Self { spec }
    }

    fn extract_problem(&self, holder: ElementRef) -> Result<Problem> {
        let index = holder
            .value()
            .attr("problemindex")
            .context("Could not find problem index")?;
        let header = holder
            .find_first(select!(".header"))
            .context("Could not find problem header")?;
        let property = |sel: &Selector| {
            header
                .find_first(sel)
                .map(|elem| clean(&elem.text_excluding("div")))
                .unwrap_or_default()
        };
        let inputs = holder.select(select!(".sample-test .input pre"));
        let outputs = holder.select(select!(".sample-test .output pre"));
        let samples = inputs
            .zip(outputs)
            .map(|(input, output)| SampleTest::new(pre_text(input), pre_text(output)))
            .collect();
        Ok(Problem::new(
            text_of(header, select!(".title")),
            (
                property(select!(".time-limit")),
                property(select!(".memory-limit")),
            ),
            (
                property(select!(".input-file")),
                property(select!(".output-file")),
            ),
            samples,
            Specifier::new(self.spec.contest(), Some(index), self.spec.group()),
        ))
    }
}

impl Extract for ProblemsExtractor {
    type Row = Problem;
    const CAPACITY: usize = 10;

    fn first_url(&self) -> Result<Url> {
        problems_url(&self.spec)
    }

    fn ready_markers(&self) -> &[Marker] {
        &*READY
    }

    fn extract(&self, doc: &Document, _index: usize) -> Extracted<Problem> {
        let html = doc.html();
        let problems = html
            .select(select!(".problemindexholder"))
            .map(|holder| self.extract_problem(holder))
            .collect();
        Extracted::new(problems, None)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::page::testing::doc;

    const PROBLEM_4A: &str = r#"
<div class="problemindexholder" problemindex="A">
<div class="ttypography"><div class="problem-statement">
  <div class="header">
    <div class="title">A. Watermelon</div>
    <div class="time-limit"><div class="property-title">time limit per test</div>1 second</div>
    <div class="memory-limit"><div class="property-title">memory limit per test</div>64 megabytes</div>
    <div class="input-file"><div class="property-title">input</div>standard input</div>
    <div class="output-file"><div class="property-title">output</div>standard output</div>
  </div>
  <div><p>One hot summer day Pete and his friend Billy decided to buy a watermelon.</p></div>
  <div class="sample-tests"><div class="section-title">Examples</div>
    <div class="sample-test">
      <div class="input"><div class="title">Input</div><pre>8</pre></div>
      <div class="output"><div class="title">Output</div><pre>YES</pre></div>
    </div>
  </div>
</div></div>
</div>"#;

    #[test]
    fn test_extract_problem() -> anyhow::Result<()> {
        let spec = Specifier::new(Some("4"), Some("a"), None);
        let extractor = ProblemsExtractor::new(spec.clone());
        assert_eq!(
            extractor.first_url()?.as_str(),
            "https://codeforces.com/contest/4/problem/a"
        );
        let Extracted { rows, next } = extractor.extract(
            &doc("https://codeforces.com/contest/4/problem/a", PROBLEM_4A),
            0,
        );
        let expected = Problem::new(
            "A. Watermelon",
            ("1 second".to_owned(), "64 megabytes".to_owned()),
            ("standard input".to_owned(), "standard output".to_owned()),
            vec![SampleTest::new("8\n", "YES\n")],
            spec,
        );
        assert_eq!(rows?, vec![expected]);
        assert_eq!(next, None);
        Ok(())
    }
}
