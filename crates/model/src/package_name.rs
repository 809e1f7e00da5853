use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("package name needs author, name and version segments: {0}")]
    Malformed(String),

    #[error("unrecognized version token: {0}")]
    BadVersion(String),

    #[error("a concrete package requires an exact version: {0}")]
    NotConcrete(String),
}

/// Version qualifier of a package identity or reference token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionToken {
    /// Exact version number (`Author.Name.2`).
    Exact(u32),
    /// Minimum acceptable version (`Author.Name.min2`).
    Min(u32),
    /// Highest available version (`Author.Name.latest`).
    Latest,
}

impl VersionToken {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("latest") || token == "*" {
            return Some(Self::Latest);
        }
        if let Some(rest) = token
            .strip_prefix("min")
            .or_else(|| token.strip_prefix("Min"))
        {
            return rest.parse().ok().map(Self::Min);
        }
        token.parse().ok().map(Self::Exact)
    }

    /// True for the `min<N>` qualifier form.
    #[must_use]
    pub const fn is_min(self) -> bool {
        matches!(self, Self::Min(_))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Min(v) => write!(f, "min{v}"),
            Self::Latest => write!(f, "latest"),
        }
    }
}

/// Parsed `<author>.<name>.<version>` package identity.
///
/// `(author, name)` case-insensitively defines the package family; the family
/// plus an exact version defines package identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageName {
    pub author: String,
    pub name: String,
    pub version: VersionToken,
}

impl PackageName {
    /// Parse a dotted identity token, e.g. `Author.Pack.2` or
    /// `Author.Pack.latest`. Names may themselves contain dots; the first
    /// segment is the author and the last is the version token.
    pub fn parse(token: &str) -> Result<Self, NameError> {
        let mut segments: Vec<&str> = token.split('.').collect();
        if segments.len() < 3 {
            return Err(NameError::Malformed(token.to_string()));
        }

        let version_token = segments.pop().expect("len checked above");
        let author = segments.remove(0);
        if author.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(NameError::Malformed(token.to_string()));
        }

        let version = VersionToken::parse(version_token)
            .ok_or_else(|| NameError::BadVersion(version_token.to_string()))?;

        Ok(Self {
            author: author.to_string(),
            name: segments.join("."),
            version,
        })
    }

    /// Parse a package archive filename, e.g. `Author.Pack.2.var`. Archive
    /// identities must carry an exact version.
    pub fn parse_filename(file_name: &str) -> Result<Self, NameError> {
        let stem = file_name
            .strip_suffix(".var")
            .or_else(|| file_name.strip_suffix(".VAR"))
            .unwrap_or(file_name);
        let parsed = Self::parse(stem)?;
        if !matches!(parsed.version, VersionToken::Exact(_)) {
            return Err(NameError::NotConcrete(file_name.to_string()));
        }
        Ok(parsed)
    }

    /// Case-insensitive `(author, name)` family key.
    #[must_use]
    pub fn family_key(&self) -> String {
        format!(
            "{}.{}",
            self.author.to_ascii_lowercase(),
            self.name.to_ascii_lowercase()
        )
    }

    /// Exact version number, if this identity is concrete.
    #[must_use]
    pub const fn exact_version(&self) -> Option<u32> {
        match self.version {
            VersionToken::Exact(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.author, self.name, self.version)
    }
}
