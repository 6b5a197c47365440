//! Build directives: the flags and environment handed to the downstream
//! build-generation tool.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One `KEY=VALUE` build flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flag {
    pub key: String,
    pub value: String,
}

impl Flag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn on(key: impl Into<String>) -> Self {
        Self::new(key, "ON")
    }

    pub fn off(key: impl Into<String>) -> Self {
        Self::new(key, "OFF")
    }

    /// Parse `KEY=VALUE`, tolerating a leading `-D` and a CMake type
    /// annotation (`-DKEY:STRING=VALUE`).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix("-D").unwrap_or(text);
        let (key, value) = text.split_once('=')?;
        let key = key.split(':').next().unwrap_or(key);
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// How flags are rendered as command-line arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStyle {
    /// `KEY=VALUE`
    Plain,
    /// `-DKEY=VALUE`
    #[default]
    Cmake,
}

impl FlagStyle {
    pub fn render(self, flag: &Flag) -> String {
        match self {
            FlagStyle::Plain => flag.to_string(),
            FlagStyle::Cmake => format!("-D{flag}"),
        }
    }
}

impl FromStr for FlagStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(FlagStyle::Plain),
            "cmake" => Ok(FlagStyle::Cmake),
            other => Err(Error::invalid_value(
                "flag_style",
                other,
                "expected 'plain' or 'cmake'",
            )),
        }
    }
}

impl fmt::Display for FlagStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlagStyle::Plain => "plain",
            FlagStyle::Cmake => "cmake",
        })
    }
}

/// The complete output of one resolution: ordered flags plus the
/// environment the build subprocess must see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDirective {
    pub flags: Vec<Flag>,
    pub env: BTreeMap<String, String>,
}

impl BuildDirective {
    /// Render the flags as arguments in the given style.
    pub fn args(&self, style: FlagStyle) -> Vec<String> {
        self.flags.iter().map(|flag| style.render(flag)).collect()
    }

    /// Look up the value of the first flag with `key`.
    pub fn flag(&self, key: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|flag| flag.key == key)
            .map(|flag| flag.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_styles() {
        let flag = Flag::new("Legion_CUDA_ARCH", "60,75");
        assert_eq!(FlagStyle::Plain.render(&flag), "Legion_CUDA_ARCH=60,75");
        assert_eq!(FlagStyle::Cmake.render(&flag), "-DLegion_CUDA_ARCH=60,75");
    }

    #[test]
    fn parse_accepts_both_styles() {
        assert_eq!(Flag::parse("-DARCH=60,75"), Some(Flag::new("ARCH", "60,75")));
        assert_eq!(Flag::parse("ARCH=60"), Some(Flag::new("ARCH", "60")));
        assert_eq!(
            Flag::parse("-DBUILD_MARCH:STRING=zen2"),
            Some(Flag::new("BUILD_MARCH", "zen2"))
        );
        assert_eq!(Flag::parse("-DCMAKE_CXX_FLAGS="), Some(Flag::new("CMAKE_CXX_FLAGS", "")));
        assert_eq!(Flag::parse("nonsense"), None);
    }

    #[test]
    fn style_from_str() {
        assert_eq!("CMake".parse::<FlagStyle>().unwrap(), FlagStyle::Cmake);
        assert!("ninja".parse::<FlagStyle>().is_err());
    }
}
