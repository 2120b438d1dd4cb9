use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Where an event was captured: the document tree or the global window.
///
/// A closed, `Copy` enumeration. There is no way to alter the set of scopes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceScope {
    Document,
    Window,
}

impl ReferenceScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            ReferenceScope::Document => "document",
            ReferenceScope::Window => "window",
        }
    }
}

impl Display for ReferenceScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
