//! ARIA role validation and landmark counting

use serde::{Deserialize, Serialize};

use crate::snapshot::StructuralElement;

/// Concrete WAI-ARIA 1.2 roles accepted in a `role` attribute.
///
/// Abstract roles (`widget`, `landmark`, `structure`, ...) are deliberately
/// absent: authors must not use them.
pub const VALID_ARIA_ROLES: &[&str] = &[
    // Landmarks
    "banner",
    "complementary",
    "contentinfo",
    "form",
    "main",
    "navigation",
    "region",
    "search",
    // Widgets
    "button",
    "checkbox",
    "combobox",
    "grid",
    "gridcell",
    "link",
    "listbox",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "progressbar",
    "radio",
    "radiogroup",
    "scrollbar",
    "searchbox",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "tablist",
    "tabpanel",
    "textbox",
    "tree",
    "treegrid",
    "treeitem",
    // Live regions
    "alert",
    "log",
    "marquee",
    "status",
    "timer",
    // Windows
    "alertdialog",
    "dialog",
    // Document structure
    "application",
    "article",
    "blockquote",
    "caption",
    "cell",
    "code",
    "columnheader",
    "definition",
    "deletion",
    "directory",
    "document",
    "emphasis",
    "feed",
    "figure",
    "generic",
    "group",
    "heading",
    "img",
    "insertion",
    "list",
    "listitem",
    "math",
    "meter",
    "none",
    "note",
    "paragraph",
    "presentation",
    "row",
    "rowgroup",
    "rowheader",
    "separator",
    "strong",
    "subscript",
    "superscript",
    "table",
    "term",
    "time",
    "toolbar",
    "tooltip",
];

/// Elements that are landmarks by tag name
pub const LANDMARK_TAGS: [&str; 4] = ["main", "nav", "header", "footer"];

/// Role equivalents of [`LANDMARK_TAGS`]
pub const LANDMARK_ROLES: [&str; 4] = ["main", "navigation", "banner", "contentinfo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AriaResult {
    landmark_count: usize,
    valid_roles: bool,
    issues: Vec<String>,
}

impl AriaResult {
    pub fn landmark_count(&self) -> usize {
        self.landmark_count
    }

    pub fn valid_roles(&self) -> bool {
        self.valid_roles
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

pub fn is_valid_role(role: &str) -> bool {
    let role = role.trim().to_ascii_lowercase();
    VALID_ARIA_ROLES.contains(&role.as_str())
}

pub fn is_landmark(element: &StructuralElement) -> bool {
    if LANDMARK_TAGS.contains(&element.tag.as_str()) {
        return true;
    }
    element
        .role
        .as_deref()
        .map(|role| LANDMARK_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Count landmarks and validate every `role` attribute
pub fn check_aria_implementation(elements: &[StructuralElement]) -> AriaResult {
    let landmark_count = elements.iter().filter(|el| is_landmark(el)).count();

    let issues: Vec<String> = elements
        .iter()
        .filter_map(|el| el.role.as_deref().map(|role| (el, role)))
        .filter(|(_, role)| !is_valid_role(role))
        .map(|(el, role)| format!("Invalid ARIA role {:?} on {}", role, el.label()))
        .collect();

    AriaResult {
        landmark_count,
        valid_roles: issues.is_empty(),
        issues,
    }
}
