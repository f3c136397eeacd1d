//! Collection report: an ordered sequence of labelled sections

use crate::config::OutputFormat;
use crate::error::QueryError;
use crate::output::{render_document, render_listing};
use crate::query::Listing;
use serde_json::Value;
use std::fmt;
use std::fmt::Write;

/// Marker opening every section header in a rendered report
pub const SECTION_MARKER: &str = ">>> ";

/// Content of one report section
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Listing(Listing),
    Cloud(Value),
    Info(String),
    Error(QueryError),
}

impl SectionBody {
    pub fn tag(&self) -> SectionTag {
        match self {
            SectionBody::Listing(_) => SectionTag::Listing,
            SectionBody::Cloud(_) => SectionTag::Cloud,
            SectionBody::Info(_) => SectionTag::Info,
            SectionBody::Error(_) => SectionTag::Error,
        }
    }
}

/// Section type as written in rendered headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTag {
    Listing,
    Cloud,
    Info,
    Error,
}

impl SectionTag {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "listing" => Some(SectionTag::Listing),
            "cloud" => Some(SectionTag::Cloud),
            "info" => Some(SectionTag::Info),
            "error" => Some(SectionTag::Error),
            _ => None,
        }
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionTag::Listing => write!(f, "listing"),
            SectionTag::Cloud => write!(f, "cloud"),
            SectionTag::Info => write!(f, "info"),
            SectionTag::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label: String,
    pub body: SectionBody,
}

/// Ordered aggregate of all sections produced by one Status run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    pub sections: Vec<Section>,
}

impl CollectionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, body: SectionBody) {
        self.sections.push(Section {
            label: label.into(),
            body,
        });
    }

    /// Record a listing query outcome; failures become error sections
    pub fn push_listing(&mut self, label: impl Into<String>, result: Result<Listing, QueryError>) {
        let label = label.into();
        let body = match result {
            Ok(listing) => SectionBody::Listing(listing),
            Err(e) => {
                tracing::warn!(section = %label, error = %e, "Section failed");
                SectionBody::Error(e)
            }
        };
        self.push(label, body);
    }

    /// Record a cloud query outcome; failures become error sections
    pub fn push_cloud(&mut self, label: impl Into<String>, result: Result<Value, QueryError>) {
        let label = label.into();
        let body = match result {
            Ok(doc) => SectionBody::Cloud(doc),
            Err(e) => {
                tracing::warn!(section = %label, error = %e, "Section failed");
                SectionBody::Error(e)
            }
        };
        self.push(label, body);
    }

    pub fn labels(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &QueryError)> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Error(e) => Some((s.label.as_str(), e)),
            _ => None,
        })
    }

    pub fn count(&self, tag: SectionTag) -> usize {
        self.sections.iter().filter(|s| s.body.tag() == tag).count()
    }

    /// Render the report as a human-readable triage document
    pub fn render(&self, format: OutputFormat) -> String {
        let mut output = String::new();

        for section in &self.sections {
            let body = match &section.body {
                SectionBody::Listing(listing) => render_listing(listing, format),
                SectionBody::Cloud(doc) => render_document(doc, format),
                SectionBody::Info(text) => text.clone(),
                SectionBody::Error(e) => format!("ERROR: {}", e),
            };

            let _ = writeln!(output, "{}{} [{}]", SECTION_MARKER, section.label, section.body.tag());
            for line in body.lines() {
                // Keep body lines from being read back as headers
                if line.starts_with(SECTION_MARKER) {
                    output.push(' ');
                }
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    /// One-paragraph summary of what was collected and what failed
    pub fn diagnostics(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "Sections: {} ({} listings, {} cloud, {} info, {} errors)",
            self.sections.len(),
            self.count(SectionTag::Listing),
            self.count(SectionTag::Cloud),
            self.count(SectionTag::Info),
            self.count(SectionTag::Error),
        );
        for (label, err) in self.errors() {
            let _ = writeln!(output, "  failed {}: {}", label, err);
        }
        output
    }
}

/// A section read back from a rendered report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub label: String,
    pub tag: SectionTag,
    pub body: String,
}

/// Split a rendered report back into its sections.
///
/// Text before the first header and headers with an unknown tag are ignored.
pub fn parse_rendered(text: &str) -> Vec<RenderedSection> {
    let mut sections: Vec<RenderedSection> = Vec::new();

    for line in text.lines() {
        if let Some(header) = line.strip_prefix(SECTION_MARKER) {
            if let Some((label, tag)) = parse_header(header) {
                sections.push(RenderedSection {
                    label: label.to_string(),
                    tag,
                    body: String::new(),
                });
                continue;
            }
        }
        if let Some(current) = sections.last_mut() {
            current.body.push_str(line);
            current.body.push('\n');
        }
    }

    for section in &mut sections {
        let trimmed = section.body.trim_end().len();
        section.body.truncate(trimmed);
    }
    sections
}

fn parse_header(header: &str) -> Option<(&str, SectionTag)> {
    let (label, rest) = header.rsplit_once(" [")?;
    let tag = SectionTag::parse(rest.strip_suffix(']')?)?;
    Some((label, tag))
}
