//! WordprocessingML qualified names

use crate::xml::{XmlElement, XmlTree};

/// WordprocessingML main namespace
pub(crate) const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Builds and matches qualified names for the prefix a part binds to the
/// WordprocessingML namespace (almost always `w`).
#[derive(Debug, Clone)]
pub(crate) struct WordNames {
    prefix: String,
}

impl WordNames {
    /// Detect the prefix from the part's root element
    pub fn from_tree(tree: &XmlTree) -> Self {
        let prefix = tree.prefix_for(WORDML_NS).unwrap_or("w").to_string();
        Self { prefix }
    }

    /// Qualified name for a local name
    pub fn name(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }

    /// Qualified names for a list of local names
    pub fn names(&self, locals: &[&str]) -> Vec<String> {
        locals.iter().map(|local| self.name(local)).collect()
    }

    /// Whether `element` is the WordprocessingML element `local`
    pub fn is(&self, element: &XmlElement, local: &str) -> bool {
        let name = element.name.as_str();
        if self.prefix.is_empty() {
            return name == local;
        }
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|rest| rest == local)
    }

    /// Whether `element` is any of the WordprocessingML elements in `locals`
    pub fn is_any(&self, element: &XmlElement, locals: &[&str]) -> bool {
        locals.iter().any(|local| self.is(element, local))
    }
}
