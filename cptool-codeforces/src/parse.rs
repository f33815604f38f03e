use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::model::{Class, Specifier};
use crate::{JudgeError, Result};

const CONTEST: &str = r"(?P<contest>\d+)";
const PROBLEM: &str = r"(?P<problem>[A-Za-z][1-9]?)";
const CLASS: &str = r"(?P<class>contest|gym|group)";
const GROUP: &str = r"(?P<group>\w{10})";

lazy_static! {
    static ref GRAMMAR: Vec<Regex> = {
        let url = r"codeforces\.com/";
        let patterns = vec![
            // addresses
            format!(r"{}{}/{}/?$", url, CLASS, CONTEST),
            format!(r"{}{}/{}/problem/{}/?$", url, CLASS, CONTEST, PROBLEM),
            format!(r"{}{}/{}/contest/{}/?$", url, CLASS, GROUP, CONTEST),
            format!(r"{}{}/{}/contest/{}/problem/{}/?$", url, CLASS, GROUP, CONTEST, PROBLEM),
            // plain text
            format!(r"^{}$", CONTEST),
            format!(r"^{}\s*{}$", CONTEST, PROBLEM),
            format!(r"^{}\s*{}$", GROUP, CONTEST),
            format!(r"^{}\s*{}\s*{}$", GROUP, CONTEST, PROBLEM),
            // local folders
            format!(r"^{}\s*{}$", CLASS, CONTEST),
            format!(r"^{}\s*{}\s*{}$", CLASS, CONTEST, PROBLEM),
            format!(r"^{}\s*{}\s*{}$", CLASS, GROUP, CONTEST),
            format!(r"^{}\s*{}\s*{}\s*{}$", CLASS, GROUP, CONTEST, PROBLEM),
        ];
        patterns
            .iter()
            .map(|pattern| Regex::new(pattern).unwrap())
            .collect()
    };
    static ref DISPLAY_FORM: Regex = Regex::new(&format!(
        r"^(?:{}\s*(?:{}\s*)?)?\({}(?:/{})?\)$",
        CONTEST, PROBLEM, CLASS, GROUP
    ))
    .unwrap();
}

/// Parses an address or a short form such as `1234 b` into a specifier.
///
/// Blank input gives the empty specifier. The `Display` form of every
/// specifier parses back to the same value.
pub fn parse_specifier(text: &str) -> Result<Specifier> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Specifier::default());
    }
    if let Some(caps) = GRAMMAR.iter().find_map(|re| re.captures(text)) {
        return Ok(from_captures(&caps));
    }
    if let Some(caps) = DISPLAY_FORM.captures(text) {
        if caps.name("contest").is_none() && caps.name("group").is_none() {
            let class: Class = caps["class"]
                .parse()
                .map_err(|_| JudgeError::InvalidSpecifier(text.to_owned()))?;
            return Ok(Specifier::listing(class));
        }
        return Ok(from_captures(&caps));
    }
    Err(JudgeError::InvalidSpecifier(text.to_owned()).into())
}

fn from_captures(caps: &Captures) -> Specifier {
    let get = |name| caps.name(name).map(|m| m.as_str());
    Specifier::new(get("contest"), get("problem"), get("group"))
}

#[cfg(test)]
mod tests {
    use cptool_util::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_specifier() -> anyhow::Result<()> {
        let tests = &[
            ("", Specifier::default()),
            ("  ", Specifier::default()),
            ("1234", Specifier::new(Some("1234"), None, None)),
            ("1234 B", Specifier::new(Some("1234"), Some("b"), None)),
            ("1234c1", Specifier::new(Some("1234"), Some("c1"), None)),
            (
                "https://codeforces.com/contest/1234/problem/B",
                Specifier::new(Some("1234"), Some("b"), None),
            ),
            (
                "codeforces.com/gym/100001",
                Specifier::new(Some("100001"), None, None),
            ),
            (
                "https://codeforces.com/group/Qvv4lz52cT/contest/201468/problem/C1",
                Specifier::new(Some("201468"), Some("c1"), Some("Qvv4lz52cT")),
            ),
            (
                "Qvv4lz52cT 201468 a",
                Specifier::new(Some("201468"), Some("a"), Some("Qvv4lz52cT")),
            ),
            ("gym 100001 a", Specifier::new(Some("100001"), Some("a"), None)),
            (
                "group Qvv4lz52cT 201468",
                Specifier::new(Some("201468"), None, Some("Qvv4lz52cT")),
            ),
            ("(gym)", Specifier::listing(Class::Gym)),
            ("1234 b (contest)", Specifier::new(Some("1234"), Some("b"), None)),
        ];
        for (text, expected) in tests {
            assert_eq!(&parse_specifier(text)?, expected, "parsing {:?}", text);
        }
        Ok(())
    }

    #[test]
    fn test_parse_specifier_rejects() {
        for text in &["abc", "1234 b c", "codeforces.com/problemset", "12ab3"] {
            let err = parse_specifier(text).unwrap_err();
            assert_matches!(JudgeError::find(&err) => Some(JudgeError::InvalidSpecifier(_)));
        }
    }

    #[test]
    fn test_display_form_round_trip() -> anyhow::Result<()> {
        let specs = vec![
            Specifier::default(),
            Specifier::new(Some("7"), None, None),
            Specifier::new(Some("1234"), Some("b"), None),
            Specifier::new(Some("100001"), Some("a"), None),
            Specifier::new(Some("201468"), None, Some("Qvv4lz52cT")),
            Specifier::new(Some("201468"), Some("c1"), Some("Qvv4lz52cT")),
            Specifier::new(None, None, Some("Qvv4lz52cT")),
            Specifier::listing(Class::Contest),
            Specifier::listing(Class::Gym),
        ];
        for spec in specs {
            assert_eq!(parse_specifier(&spec.to_string())?, spec);
        }
        Ok(())
    }
}
