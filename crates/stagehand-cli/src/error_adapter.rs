//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! Graph file errors carry their source and, when TOML reports one, the
//! offending byte range; they render with a labelled snippet. Every other
//! variant renders as a plain report with a code and, where useful, a hint.

use std::{fmt, ops::Range};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use crate::error::CliError;

/// Adapter for a graph file error with source information.
pub struct SourceAdapter<'a> {
    message: &'a str,
    src: &'a str,
    span: Option<&'a Range<usize>>,
}

impl<'a> SourceAdapter<'a> {
    pub fn new(message: &'a str, src: &'a str, span: Option<&'a Range<usize>>) -> Self {
        Self { message, src, span }
    }
}

impl fmt::Debug for SourceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for SourceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid graph file: {}", self.message.trim_end())
    }
}

impl std::error::Error for SourceAdapter<'_> {}

impl MietteDiagnostic for SourceAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("stagehand::graph"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.span.map(|_| &self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = span_to_miette(self.span?, self.src.len());
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), span),
        )))
    }
}

/// Adapter for [`CliError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "stagehand::io",
            CliError::GraphParse { .. } => "stagehand::graph",
            CliError::Config(_) => "stagehand::config",
            CliError::UnknownLayout { .. } => "stagehand::layout",
            CliError::Unsettled { .. } => "stagehand::unsettled",
            CliError::Serialize(_) => "stagehand::serialize",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            CliError::UnknownLayout { known, .. } => Some(Box::new(format!(
                "available layouts: {}",
                known.join(", ")
            ))),
            CliError::Unsettled { .. } => Some(Box::new(
                "raise `max_ticks` in the configuration or lower the strategy's `max_iteration`",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// An error with a source snippet.
    Source(SourceAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Source(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Source(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Source(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Source(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Source(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Source(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a byte range to a miette [`SourceSpan`], clamped to the source.
fn span_to_miette(span: &Range<usize>, len: usize) -> SourceSpan {
    let start = span.start.min(len);
    let end = span.end.clamp(start, len);
    SourceSpan::new(start.into(), end - start)
}

/// Convert a [`CliError`] into a list of reportable errors.
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::GraphParse { message, src, span } => vec![Reportable::Source(
            SourceAdapter::new(message, src, span.as_ref()),
        )],
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_graph_error_with_span() {
        let err = CliError::new_graph_error("expected a value\n", "id = \n", Some(5..6));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Source(s) => {
                assert_eq!(s.to_string(), "Invalid graph file: expected a value");
                assert!(s.source_code().is_some());
                let labels: Vec<_> = s.labels().unwrap().collect();
                assert_eq!(labels.len(), 1);
                assert!(labels[0].primary());
                assert_eq!(labels[0].offset(), 5);
                assert_eq!(labels[0].len(), 1);
            }
            Reportable::Error(_) => panic!("Expected Source"),
        }
    }

    #[test]
    fn test_graph_error_without_span_has_no_snippet() {
        let err = CliError::new_graph_error("duplicate node id `a`", "src", None);

        let reportables = to_reportables(&err);
        assert!(reportables[0].source_code().is_none());
        assert!(reportables[0].labels().is_none());
    }

    #[test]
    fn test_span_is_clamped_to_source() {
        let span = span_to_miette(&(3..40), 10);
        assert_eq!(span.offset(), 3);
        assert_eq!(span.len(), 7);

        let past_end = span_to_miette(&(20..25), 10);
        assert_eq!(past_end.offset(), 10);
        assert_eq!(past_end.len(), 0);
    }

    #[test]
    fn test_unknown_layout_lists_alternatives() {
        let err = CliError::UnknownLayout {
            name: "spiral".to_string(),
            known: vec!["grid".to_string(), "force".to_string()],
        };

        let reportables = to_reportables(&err);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Unknown layout type `spiral`");
                assert_eq!(e.code().unwrap().to_string(), "stagehand::layout");
                assert_eq!(
                    e.help().unwrap().to_string(),
                    "available layouts: grid, force"
                );
            }
            Reportable::Source(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = CliError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let reportables = to_reportables(&err);
        assert_eq!(reportables[0].to_string(), "I/O error: gone");
        assert_eq!(reportables[0].code().unwrap().to_string(), "stagehand::io");
        assert!(reportables[0].help().is_none());
    }
}
