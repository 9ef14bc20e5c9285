//! Template index - Catalog entries of one flavour, keyed by release and class

use std::collections::BTreeSet;

use crate::catalog::TemplateDescriptor;
use crate::flavour::Flavour;
use crate::release::Release;

pub struct TemplateIndex<'a> {
    flavour: Flavour,
    templates: Vec<&'a TemplateDescriptor>,
}

impl<'a> TemplateIndex<'a> {
    pub fn new(catalog: &'a [TemplateDescriptor], flavour: Flavour) -> Self {
        Self {
            flavour,
            templates: catalog.iter().filter(|t| t.flavour == flavour).collect(),
        }
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Distinct releases, oldest first
    ///
    /// Releases that do not parse as versions sort after all others.
    pub fn releases(&self) -> Vec<&'a str> {
        let mut releases: Vec<&'a str> = self
            .templates
            .iter()
            .map(|t| t.release.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        releases.sort_by(|a, b| match (Release::parse(a), Release::parse(b)) {
            (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        releases
    }

    /// Performance classes offered for a release
    pub fn classes_for(&self, release: &str) -> BTreeSet<&'a str> {
        self.templates
            .iter()
            .filter(|t| t.release == release)
            .map(|t| t.performance_class.as_str())
            .collect()
    }

    /// The template for a (release, class) pair; the first in catalog order wins
    pub fn lookup(&self, release: &str, class: &str) -> Option<&'a TemplateDescriptor> {
        self.templates
            .iter()
            .find(|t| t.release == release && t.performance_class == class)
            .copied()
    }

    /// The template with the given UUID
    pub fn by_uuid(&self, uuid: &str) -> Option<&'a TemplateDescriptor> {
        self.templates.iter().find(|t| t.uuid == uuid).copied()
    }
}
