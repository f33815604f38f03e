use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::model::Specifier;

#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct SampleTest {
    input: String,
    output: String,
}

impl SampleTest {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Statement header and samples of one problem.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct Problem {
    name: String,
    time_limit: String,
    memory_limit: String,
    input_stream: String,
    output_stream: String,
    samples: Vec<SampleTest>,
    specifier: Specifier,
}

impl Problem {
    pub fn new(
        name: impl Into<String>,
        (time_limit, memory_limit): (String, String),
        (input_stream, output_stream): (String, String),
        samples: Vec<SampleTest>,
        specifier: Specifier,
    ) -> Self {
        Self {
            name: name.into(),
            time_limit,
            memory_limit,
            input_stream,
            output_stream,
            samples,
            specifier,
        }
    }
}
