use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced while parsing a [`PackageId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier was empty after trimming.
    #[error("package identifier is empty")]
    Empty,

    /// The identifier contains `/` but is not a well-formed `owner/name` pair.
    #[error("invalid repository identifier '{0}': expected 'owner/name'")]
    MalformedRepo(String),

    /// A bare token contains characters that cannot form a URL path suffix.
    #[error("invalid package token '{0}'")]
    MalformedToken(String),
}

/// A validated repository reference on the source host.
///
/// # Example
///
/// ```
/// use pawnpkg_schema::RepoKey;
///
/// let repo = RepoKey::parse("Y-Less/sscanf").unwrap();
/// assert_eq!(repo.owner, "Y-Less");
/// assert_eq!(repo.repo, "sscanf");
/// ```
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RepoKey {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoKey {
    /// Create a new `RepoKey` without validation.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/name` string.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::MalformedRepo`] unless the input has exactly
    /// one `/`, both halves are non-empty, and both use only ASCII
    /// alphanumerics, `_`, `.` or `-`.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if is_segment(owner) && is_segment(repo) => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(IdentifierError::MalformedRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// What the caller asked to acquire.
///
/// The string form (via `Display`) is the identifier exactly as it is
/// recorded in the installation ledger and the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageId {
    /// A repository on the source host (`owner/name`).
    Repo(RepoKey),
    /// A direct `http(s)://` link to a plugin binary or archive.
    Link(String),
    /// An opaque token resolved only through guessed URLs and mirrors.
    Token(String),
}

impl PackageId {
    /// Parse a caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentifierError`] for empty input, for anything containing
    /// `/` that is neither a link nor a valid `owner/name`, and for tokens
    /// with whitespace or `..`.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Link(s.to_string()));
        }
        if s.contains('/') {
            return RepoKey::parse(s).map(Self::Repo);
        }
        if s.chars().any(char::is_whitespace) || s.contains("..") || s.contains('\\') {
            return Err(IdentifierError::MalformedToken(s.to_string()));
        }
        Ok(Self::Token(s.to_string()))
    }

    /// The repository, if this identifier names one.
    pub fn repo(&self) -> Option<&RepoKey> {
        match self {
            Self::Repo(r) => Some(r),
            _ => None,
        }
    }

    /// Returns `true` for `owner/name` identifiers.
    pub fn is_repo(&self) -> bool {
        matches!(self, Self::Repo(_))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repo(r) => write!(f, "{r}"),
            Self::Link(s) | Self::Token(s) => f.write_str(s),
        }
    }
}

impl std::str::FromStr for PackageId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        let id = PackageId::parse("Y-Less/sscanf").unwrap();
        assert_eq!(id, PackageId::Repo(RepoKey::new("Y-Less", "sscanf")));
        assert_eq!(id.to_string(), "Y-Less/sscanf");
    }

    #[test]
    fn test_parse_repo_with_dots_and_underscores() {
        let id = PackageId::parse("pawn-lang/samp_stdlib.v2").unwrap();
        assert!(id.is_repo());
    }

    #[test]
    fn test_reject_malformed_repos() {
        for bad in ["owner//", "owner/", "/repo", "a/b/c", "own er/repo", "owner/re$po"] {
            assert!(
                matches!(PackageId::parse(bad), Err(IdentifierError::MalformedRepo(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_token() {
        let id = PackageId::parse("not-a-repo-token").unwrap();
        assert_eq!(id, PackageId::Token("not-a-repo-token".to_string()));
        assert!(!id.is_repo());
    }

    #[test]
    fn test_reject_bad_tokens() {
        assert_eq!(PackageId::parse("   "), Err(IdentifierError::Empty));
        assert!(matches!(
            PackageId::parse("two words"),
            Err(IdentifierError::MalformedToken(_))
        ));
        assert!(matches!(
            PackageId::parse(".."),
            Err(IdentifierError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_parse_link() {
        let id = PackageId::parse("https://example.com/files/streamer.dll").unwrap();
        assert_eq!(
            id,
            PackageId::Link("https://example.com/files/streamer.dll".to_string())
        );
    }

    #[test]
    fn test_input_is_trimmed() {
        let id: PackageId = "  Y-Less/sscanf \n".parse().unwrap();
        assert_eq!(id.to_string(), "Y-Less/sscanf");
    }
}
