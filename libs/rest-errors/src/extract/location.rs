//! Field locations inside request payloads

use std::fmt;

/// One step into a payload: a named field or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Path from the payload root down to the offending value, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments joined by `.`, indices in brackets: `items.[2].name`.
    #[must_use]
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                PathSegment::Field(name) => name.clone(),
                PathSegment::Index(i) => format!("[{i}]"),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Read a textual path such as `user.email`, `items[0].name` or
    /// `orders[0].items[2].price`. `.` and the empty string are the root.
    ///
    /// Bracket content that is not a number is kept as a field name, so
    /// unusual keys never make the path unreadable.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut name = String::new();
        let mut chars = text.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => flush(&mut name, &mut segments),
                '[' => {
                    flush(&mut name, &mut segments);
                    let inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    match inner.trim().parse::<usize>() {
                        Ok(i) => segments.push(PathSegment::Index(i)),
                        Err(_) => segments.push(PathSegment::Field(inner)),
                    }
                }
                _ => name.push(c),
            }
        }
        flush(&mut name, &mut segments);
        Self { segments }
    }
}

fn flush(name: &mut String, segments: &mut Vec<PathSegment>) {
    if !name.is_empty() {
        segments.push(PathSegment::Field(std::mem::take(name)));
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
