use std::fmt;

/// A pseudo-directory inside a container: object names sharing the
/// `{name}{delimiter}` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    name: String,
    delimiter: char,
}

impl Directory {
    pub fn new(name: impl Into<String>, delimiter: char) -> Self {
        let name = name.into();
        let name = name.trim_end_matches(delimiter).to_string();
        Self { name, delimiter }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Listing prefix, including the trailing delimiter
    pub fn prefix(&self) -> String {
        format!("{}{}", self.name, self.delimiter)
    }

    /// Full object name of `key` inside this directory
    pub fn child(&self, key: &str) -> String {
        format!("{}{}{}", self.name, self.delimiter, key)
    }

    /// The part of `object_name` below this directory, if it lives here
    pub fn relative<'a>(&self, object_name: &'a str) -> Option<&'a str> {
        object_name
            .strip_prefix(self.name.as_str())?
            .strip_prefix(self.delimiter)
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
