use content_model::PackageName;

/// Parsed form of a raw reference token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceToken {
    /// `SELF:<relpath>` — scoped to the referencing package. Outside a
    /// package the prefix degrades to a bare relative path.
    SelfScoped(String),
    /// `<author>.<name>.<version>:<relpath>`.
    Packaged(PackageName, String),
    /// Plain relative path; also the fallback for unparseable prefixes.
    Bare(String),
}

impl ReferenceToken {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if let Some(rest) = value.strip_prefix("SELF:") {
            return Self::SelfScoped(rest.to_string());
        }
        match value.split_once(':') {
            None => Self::Bare(value.to_string()),
            Some((prefix, rest)) => match PackageName::parse(prefix) {
                Ok(name) => Self::Packaged(name, rest.to_string()),
                // Colons inside odd paths: treat the whole token as a path.
                Err(_) => Self::Bare(value.to_string()),
            },
        }
    }

    /// The relative-path component of the token.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        match self {
            Self::SelfScoped(path) | Self::Bare(path) => path,
            Self::Packaged(_, path) => path,
        }
    }
}
