//! Read-only DOM snapshot consumed by the heuristic checks
//!
//! The browser side extracts these records with a single script evaluation;
//! the checks themselves never touch a live page.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A heading element in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHeading")]
pub struct Heading {
    level: u8,
    /// Trimmed text content
    pub text: String,
}

impl Heading {
    /// Create a heading, rejecting levels outside 1-6
    pub fn new(level: u8, text: impl Into<String>) -> Result<Self, CoreError> {
        if !(1..=6).contains(&level) {
            return Err(CoreError::InvalidHeadingLevel(level));
        }
        Ok(Self {
            level,
            text: text.into(),
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

#[derive(Deserialize)]
struct RawHeading {
    level: u8,
    #[serde(default)]
    text: String,
}

impl TryFrom<RawHeading> for Heading {
    type Error = CoreError;

    fn try_from(raw: RawHeading) -> Result<Self, Self::Error> {
        Heading::new(raw.level, raw.text)
    }
}

/// An `<img>` element with its accessibility-relevant attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageElement {
    /// `alt` attribute; `None` when the attribute is absent
    pub alt: Option<String>,
    /// `role` attribute; `None` when the attribute is absent
    pub role: Option<String>,
    pub src: Option<String>,
}

/// A structural or role-bearing element (`main`, `nav`, `header`, `footer`, `[role]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralElement {
    /// Lower-case tag name
    pub tag: String,
    pub role: Option<String>,
    pub id: Option<String>,
}

impl StructuralElement {
    pub fn new(tag: impl Into<String>, role: Option<&str>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            role: role.map(str::to_string),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Short selector-like label used in issue strings, e.g. `div#menu`
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => format!("{}#{}", self.tag, id),
            _ => self.tag.clone(),
        }
    }
}

/// Everything the heuristic checks need from one loaded page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub url: String,
    pub title: String,
    pub headings: Vec<Heading>,
    pub images: Vec<ImageElement>,
    pub structural: Vec<StructuralElement>,
    /// Number of keyboard-focusable elements
    pub focusable_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_bounds() {
        assert!(Heading::new(1, "Top").is_ok());
        assert!(Heading::new(6, "Deep").is_ok());
        assert_eq!(
            Heading::new(0, "x"),
            Err(CoreError::InvalidHeadingLevel(0))
        );
        assert_eq!(
            Heading::new(7, "x"),
            Err(CoreError::InvalidHeadingLevel(7))
        );
    }

    #[test]
    fn test_heading_deserialize_validates_level() {
        let ok: Heading = serde_json::from_str(r#"{"level":2,"text":"About"}"#).unwrap();
        assert_eq!(ok.level(), 2);
        assert_eq!(ok.text, "About");

        let bad = serde_json::from_str::<Heading>(r#"{"level":8,"text":"x"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_structural_label() {
        let el = StructuralElement::new("DIV", Some("menu")).with_id("nav-menu");
        assert_eq!(el.tag, "div");
        assert_eq!(el.label(), "div#nav-menu");
        assert_eq!(StructuralElement::new("main", None).label(), "main");
    }
}
