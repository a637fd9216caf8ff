use crate::Reference;

/// Which check a reference gets, decided by the strongest identity hint it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Look the DOI up in the registry.
    Doi,
    /// Check that the URL answers.
    Link,
    /// Search catalogs by title, author, and year.
    Metadata,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Doi => "DOI",
            Strategy::Link => "Link",
            Strategy::Metadata => "Metadata",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// DOI beats URL beats metadata. Blank fields count as absent.
pub fn select_strategy(reference: &Reference) -> Strategy {
    if reference.doi().is_some() {
        Strategy::Doi
    } else if reference.url().is_some() {
        Strategy::Link
    } else {
        Strategy::Metadata
    }
}
