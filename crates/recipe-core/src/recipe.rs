//! Recipes: package metadata, fetchable versions, and the option schema.

use serde::Serialize;

use crate::directive::FlagStyle;
use crate::error::{Error, Result};
use crate::schema::OptionSchema;
use crate::version::normalize_version;

/// Where the source for one version comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRef {
    Tag(String),
    Branch(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSource {
    pub name: String,
    pub source: SourceRef,
}

impl VersionSource {
    pub fn tag(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceRef::Tag(tag.into()),
        }
    }

    pub fn branch(name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceRef::Branch(branch.into()),
        }
    }
}

/// A build recipe for one external package.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub git: Option<String>,
    pub versions: Vec<VersionSource>,
    pub schema: OptionSchema,
    pub flag_style: FlagStyle,
}

impl Recipe {
    pub fn new(name: impl Into<String>, schema: OptionSchema) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            homepage: None,
            url: None,
            git: None,
            versions: Vec::new(),
            schema,
            flag_style: FlagStyle::default(),
        }
    }

    /// The highest version whose name parses numerically and whose source
    /// is a tag. Branch versions such as `master` are never preferred.
    pub fn preferred_version(&self) -> Option<&VersionSource> {
        self.versions
            .iter()
            .filter(|v| matches!(v.source, SourceRef::Tag(_)))
            .filter_map(|v| normalize_version(&v.name).ok().map(|parsed| (parsed, v)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v)
    }

    /// Look up a version by name; `None` picks the preferred version.
    ///
    /// # Errors
    ///
    /// `Error::UnknownVersion` when the recipe declares no such version or,
    /// for `None`, declares no numeric tagged version at all.
    pub fn source_for(&self, version: Option<&str>) -> Result<&VersionSource> {
        let found = match version {
            Some(name) => self.versions.iter().find(|v| v.name == name),
            None => self.preferred_version(),
        };
        found.ok_or_else(|| Error::UnknownVersion {
            recipe: self.name.clone(),
            version: version.unwrap_or("<preferred>").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        let mut recipe = Recipe::new("demo", OptionSchema::default());
        recipe.versions = vec![
            VersionSource::branch("master", "master"),
            VersionSource::tag("20.09.0", "demo-20.09.0"),
            VersionSource::tag("20.12.0", "demo-20.12.0"),
            VersionSource::tag("18.02.0", "demo-18.02.0"),
        ];
        recipe
    }

    #[test]
    fn preferred_is_highest_tag() {
        assert_eq!(recipe().preferred_version().unwrap().name, "20.12.0");
    }

    #[test]
    fn source_for_named_branch() {
        let recipe = recipe();
        let source = recipe.source_for(Some("master")).unwrap();
        assert_eq!(source.source, SourceRef::Branch("master".to_string()));
    }

    #[test]
    fn source_for_unknown_version() {
        let err = recipe().source_for(Some("99.0.0")).unwrap_err();
        assert!(matches!(err, Error::UnknownVersion { .. }));
    }
}
