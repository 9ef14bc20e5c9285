//! Resolver - Select the one template matching (flavour, release, class)
//!
//! Every path that needs a template UUID goes through [`resolve`].

use std::fmt;

use thiserror::Error;

use crate::catalog::TemplateDescriptor;
use crate::flavour::Flavour;
use crate::index::TemplateIndex;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The (release, class) pair is not offered for the flavour
    #[error("{0}")]
    InvalidSelection(InvalidSelection),
}

/// Details of a failed selection, listing every valid combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSelection {
    pub flavour: Flavour,
    pub release: String,
    pub performance_class: String,
    /// Known releases with their performance classes, oldest release first
    pub valid: Vec<(String, Vec<String>)>,
}

impl fmt::Display for InvalidSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "release {} with performance class {} is not a valid {} release/performance class.",
            self.release,
            self.performance_class,
            self.flavour.display_name()
        )?;
        if self.valid.is_empty() {
            return write!(f, " No {} releases are available.", self.flavour.display_name());
        }
        write!(f, " Valid releases are:")?;
        for (release, classes) in &self.valid {
            write!(
                f,
                "\n\trelease {} has following perfomance classes: {}",
                release,
                classes.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Find the template for a flavour and (release, class) pair
pub fn resolve<'a>(
    catalog: &'a [TemplateDescriptor],
    flavour: Flavour,
    release: &str,
    performance_class: &str,
) -> Result<&'a TemplateDescriptor, ResolveError> {
    let index = TemplateIndex::new(catalog, flavour);
    if let Some(descriptor) = index.lookup(release, performance_class) {
        return Ok(descriptor);
    }

    let valid = index
        .releases()
        .into_iter()
        .map(|r| {
            let classes = index.classes_for(r).into_iter().map(String::from).collect();
            (r.to_string(), classes)
        })
        .collect();

    Err(ResolveError::InvalidSelection(InvalidSelection {
        flavour,
        release: release.to_string(),
        performance_class: performance_class.to_string(),
        valid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn descriptor(uuid: &str, flavour: Flavour, release: &str, class: &str) -> TemplateDescriptor {
        TemplateDescriptor {
            uuid: uuid.to_string(),
            flavour,
            release: release.to_string(),
            performance_class: class.to_string(),
            autoscaling: None,
            parameters: HashMap::new(),
        }
    }

    fn catalog() -> Vec<TemplateDescriptor> {
        vec![
            descriptor("m-105", Flavour::MariaDb, "10.5", "standard"),
            descriptor("m-106-s", Flavour::MariaDb, "10.6", "standard"),
            descriptor("m-106-p", Flavour::MariaDb, "10.6", "premium"),
            descriptor("p-13", Flavour::Postgres, "13", "standard"),
        ]
    }

    #[test]
    fn every_catalog_entry_resolves_to_itself() {
        let catalog = catalog();
        for d in &catalog {
            let resolved = resolve(&catalog, d.flavour, &d.release, &d.performance_class).unwrap();
            assert_eq!(resolved, d);
        }
    }

    #[test]
    fn invalid_release_lists_valid_combinations() {
        let catalog = catalog();
        let err = resolve(&catalog, Flavour::MariaDb, "10.4", "standard").unwrap_err();
        let message = err.to_string();

        assert!(message.contains(
            "release 10.4 with performance class standard is not a valid MariaDB release/performance class"
        ));
        assert!(message.contains("release 10.5 has following perfomance classes: standard"));
        assert!(message.contains("release 10.6 has following perfomance classes: premium, standard"));
        assert!(!message.contains("release 13"));

        let ResolveError::InvalidSelection(selection) = err;
        assert_eq!(
            selection.valid,
            vec![
                ("10.5".to_string(), vec!["standard".to_string()]),
                (
                    "10.6".to_string(),
                    vec!["premium".to_string(), "standard".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn class_must_belong_to_release() {
        let catalog = catalog();
        assert!(resolve(&catalog, Flavour::MariaDb, "10.5", "premium").is_err());
        assert!(resolve(&catalog, Flavour::Postgres, "10.5", "standard").is_err());
    }

    #[test]
    fn empty_flavour_says_so() {
        let catalog = catalog();
        let err = resolve(&catalog, Flavour::Memcached, "1.6", "standard").unwrap_err();
        assert!(err.to_string().ends_with("No Memcached releases are available."));
    }
}
