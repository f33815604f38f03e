use anyhow::Context as _;
use scraper::{ElementRef, Html, Node, Selector};

use crate::{regex, select, Error, Result};

/// Normalizes text copied out of judge markup.
///
/// `<br/>` becomes a newline, indentation after newlines and repeated spaces
/// collapse, control characters turn into spaces.
pub fn clean(text: &str) -> String {
    let text = regex!(r"<br\s*/?>").replace_all(text, "\n");
    let text = regex!(r"\n\s+").replace_all(text.trim(), "\n");
    let text = regex!(r" +").replace_all(&text, " ");
    text.chars()
        .map(|c| if c != '\n' && c.is_control() { ' ' } else { c })
        .collect()
}

pub fn parse_selector(sel: &str) -> Result<Selector> {
    Selector::parse(sel).map_err(|_| Error::msg(format!("Could not parse selector : {}", sel)))
}

pub trait Scrape {
    fn elem(&self) -> ElementRef;

    fn find_first(&self, selector: &Selector) -> Option<ElementRef> {
        self.elem().select(selector).next()
    }

    fn inner_text(&self) -> String {
        self.elem().text().fold(String::new(), |mut ret, s| {
            ret.push_str(s);
            ret
        })
    }

    /// Text of the element without the text of descendants named `tag`.
    fn text_excluding(&self, tag: &str) -> String {
        let mut ret = String::new();
        collect_text(self.elem(), tag, &mut ret);
        ret
    }

    fn attr_of(&self, selector: &Selector, name: &str) -> Option<String> {
        self.find_first(selector)
            .and_then(|elem| elem.value().attr(name))
            .map(ToOwned::to_owned)
    }
}

fn collect_text(elem: ElementRef, tag: &str, ret: &mut String) {
    for child in elem.children() {
        if let Node::Text(text) = child.value() {
            ret.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if child.value().name() != tag {
                collect_text(child, tag, ret);
            }
        }
    }
}

impl Scrape for ElementRef<'_> {
    fn elem(&self) -> ElementRef {
        *self
    }
}

impl Scrape for Html {
    fn elem(&self) -> ElementRef {
        self.root_element()
    }
}

pub trait ExtractCsrfToken: Scrape {
    fn extract_csrf_token(&self) -> Result<String> {
        let token = self
            .find_first(select!("[name=\"csrf_token\"]"))
            .and_then(|elem| elem.value().attr("value"))
            .or_else(|| {
                self.find_first(select!("meta[name=\"X-Csrf-Token\"]"))
                    .and_then(|elem| elem.value().attr("content"))
            })
            .context("Could not extract csrf token")?
            .to_owned();
        if token.is_empty() {
            Err(Error::msg("Found empty csrf token"))
        } else {
            Ok(token)
        }
    }
}

impl ExtractCsrfToken for Html {}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::assert_matches;

    #[test]
    fn test_clean() {
        let tests = &[
            ("  Contest is over  ", "Contest is over"),
            ("You have submitted<br/>exactly the same code", "You have submitted\nexactly the same code"),
            ("a\n      b", "a\nb"),
            ("a    b\tc", "a b c"),
        ];
        for (left, right) in tests {
            assert_eq!(clean(left), *right);
        }
    }

    #[test]
    fn test_text_excluding() {
        let html = Html::parse_fragment(
            r#"<table><tr><td>Codeforces Beta Round #7 <br/><a href="/contest/7">Enter &raquo;</a></td></tr></table>"#,
        );
        let td = html.find_first(select!("td")).unwrap();
        assert_eq!(td.text_excluding("a").trim(), "Codeforces Beta Round #7");
        assert!(td.inner_text().contains("Enter"));
    }

    #[test]
    fn test_extract_csrf_token() {
        let html = Html::parse_document(
            r#"<html><head><meta name="X-Csrf-Token" content="0123abcd"/></head><body></body></html>"#,
        );
        assert_eq!(html.extract_csrf_token().unwrap(), "0123abcd");
        let html = Html::parse_document(
            r#"<form><input type="hidden" name="csrf_token" value="feed"/></form>"#,
        );
        assert_eq!(html.extract_csrf_token().unwrap(), "feed");
        let html = Html::parse_document(r#"<form><input name="csrf_token" value=""/></form>"#);
        assert_matches!(html.extract_csrf_token() => Err(_));
    }
}
