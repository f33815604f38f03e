use std::fmt;

use getset::CopyGetters;
use serde::{Deserialize, Serialize};

/// Largest id the judge hands out to standard contests; gyms are numbered above it.
pub const MAX_CONTEST_ID: u64 = 100_000;

/// Length of the opaque token identifying a private group.
pub const GROUP_ID_LEN: usize = 10;

#[derive(
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Class {
    Contest,
    Gym,
    Group,
}

impl Class {
    /// Classifies an identifier by its shape.
    ///
    /// A group token wins over the contest number. Returns `None` when neither
    /// component is present or the contest is not numeric.
    pub fn infer(contest: Option<&str>, group: Option<&str>) -> Option<Self> {
        if group.map_or(false, |group| group.len() == GROUP_ID_LEN) {
            return Some(Self::Group);
        }
        let id: u64 = contest?.parse().ok()?;
        if id <= MAX_CONTEST_ID {
            Some(Self::Contest)
        } else {
            Some(Self::Gym)
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.into())
    }
}

/// Structured identifier of a contest, problem or listing on a judge.
///
/// The class is resolved once on construction and never changes afterwards.
#[derive(
    Serialize, Deserialize, CopyGetters, Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Specifier {
    contest: Option<String>,
    problem: Option<String>,
    group: Option<String>,
    #[get_copy = "pub"]
    class: Option<Class>,
}

impl Specifier {
    /// Builds a specifier and infers its class. Problem ids are lower-cased.
    pub fn new(contest: Option<&str>, problem: Option<&str>, group: Option<&str>) -> Self {
        let contest = non_empty(contest);
        let group = non_empty(group);
        Self {
            class: Class::infer(contest.as_deref(), group.as_deref()),
            problem: non_empty(problem).map(|problem| problem.to_lowercase()),
            contest,
            group,
        }
    }

    /// A specifier naming a whole listing of `class`, such as every gym.
    pub fn listing(class: Class) -> Self {
        Self {
            class: Some(class),
            ..Self::default()
        }
    }

    pub fn contest(&self) -> Option<&str> {
        self.contest.as_deref()
    }

    pub fn problem(&self) -> Option<&str> {
        self.problem.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The same target with the problem component cleared.
    pub fn without_problem(&self) -> Self {
        Self {
            problem: None,
            ..self.clone()
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Formats as `1234 b (contest)`, `201468 c1 (group/Qvv4lz52cT)` or `(gym)`.
impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts: Vec<String> = self
            .contest
            .iter()
            .chain(self.problem.iter())
            .cloned()
            .collect();
        match (self.class, &self.group) {
            (Some(Class::Group), Some(group)) => parts.push(format!("(group/{})", group)),
            (Some(class), _) => parts.push(format!("({})", class)),
            (None, _) => {}
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_infer() {
        let tests = &[
            (Some("1234"), None, Some(Class::Contest)),
            (Some("100000"), None, Some(Class::Contest)),
            (Some("100001"), None, Some(Class::Gym)),
            (Some("201468"), Some("Qvv4lz52cT"), Some(Class::Group)),
            (None, Some("Qvv4lz52cT"), Some(Class::Group)),
            (Some("abc"), None, None),
            (None, None, None),
        ];
        for (contest, group, expected) in tests {
            assert_eq!(Class::infer(*contest, *group), *expected);
        }
    }

    #[test]
    fn test_new_normalizes_components() {
        let spec = Specifier::new(Some("1234"), Some("B"), Some(""));
        assert_eq!(spec.contest(), Some("1234"));
        assert_eq!(spec.problem(), Some("b"));
        assert_eq!(spec.group(), None);
        assert_eq!(spec.class(), Some(Class::Contest));
        assert!(Specifier::new(None, Some(" "), None).is_empty());
    }

    #[test]
    fn test_display() {
        let tests = &[
            (Specifier::new(Some("1234"), Some("b"), None), "1234 b (contest)"),
            (Specifier::new(Some("100001"), None, None), "100001 (gym)"),
            (
                Specifier::new(Some("201468"), Some("c1"), Some("Qvv4lz52cT")),
                "201468 c1 (group/Qvv4lz52cT)",
            ),
            (Specifier::listing(Class::Gym), "(gym)"),
            (Specifier::default(), ""),
        ];
        for (spec, expected) in tests {
            assert_eq!(spec.to_string(), *expected);
        }
    }
}
