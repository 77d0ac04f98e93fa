//! File-role classification.
//!
//! Pure functions of a filename or archive entry path. Nothing here touches
//! the filesystem.

use pawnpkg_schema::{ArchiveFormat, ContentHint, Role};

/// Filenames whose host loader expects them beside the server executable.
pub const RELOCATED_TO_PROJECT_ROOT: &[&str] = &[
    "amxsscanf.dll",
    "amxsscanf.so",
    "libmariadb.dll",
    "log-core.so",
    "log-core.dll",
];

/// Outcome of classifying a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A placeable file with the given role.
    Artifact(Role),
    /// A container to extract (or, inside another archive, to skip).
    Archive(ArchiveFormat),
    /// Anything else; dropped silently.
    Unclassified,
}

/// Classify a filename or `/`- or `\`-separated entry path.
///
/// A `components` directory segment wins over the extension.
///
/// ```
/// use pawnpkg_core::classify::{classify, Classification};
/// use pawnpkg_schema::Role;
///
/// assert_eq!(classify("SSCANF.DLL"), Classification::Artifact(Role::Plugin));
/// assert_eq!(classify("components/foo.dll"), Classification::Artifact(Role::Component));
/// assert_eq!(classify("README.md"), Classification::Unclassified);
/// ```
pub fn classify(path: &str) -> Classification {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let Some(name) = segments.pop() else {
        return Classification::Unclassified;
    };

    if segments.iter().any(|s| *s == "components") {
        return Classification::Artifact(Role::Component);
    }

    if let Some(format) = ArchiveFormat::from_name(name) {
        return Classification::Archive(format);
    }

    let lower = name.to_ascii_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("dll" | "so") => Classification::Artifact(Role::Plugin),
        Some("inc") => Classification::Artifact(Role::Header),
        _ => Classification::Unclassified,
    }
}

/// Classify a downloaded payload, falling back to what its source promised.
pub fn classify_with_hint(name: &str, hint: ContentHint) -> Classification {
    match (classify(name), hint) {
        (Classification::Unclassified, ContentHint::Plugin) => Classification::Artifact(Role::Plugin),
        (Classification::Unclassified, ContentHint::Header) => Classification::Artifact(Role::Header),
        (c, _) => c,
    }
}

/// Returns `true` when `name` must be written to the project root.
pub fn is_relocated(name: &str, extra: &[String]) -> bool {
    RELOCATED_TO_PROJECT_ROOT
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str))
        .any(|r| r.eq_ignore_ascii_case(name))
}

/// The part of an entry path below its first `components` segment.
///
/// `pkg/components/sub/x.dll` yields `sub/x.dll`. Returns `None` when the
/// path has no such segment or nothing below it.
pub fn component_subpath(entry_path: &str) -> Option<String> {
    let normalized = entry_path.replace('\\', "/");
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let idx = segments.iter().position(|s| *s == "components")?;
    let rest = &segments[idx + 1..];
    if rest.is_empty() || rest.contains(&"..") {
        return None;
    }
    Some(rest.join("/"))
}

/// Last segment of a `/`- or `\`-separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_roles_case_insensitive() {
        for name in ["a.dll", "A.DLL", "lib/b.so", "b.So"] {
            assert_eq!(classify(name), Classification::Artifact(Role::Plugin), "{name}");
        }
        for name in ["a_samp.inc", "include/YSI.INC", "x\\y\\z.Inc"] {
            assert_eq!(classify(name), Classification::Artifact(Role::Header), "{name}");
        }
    }

    #[test]
    fn test_unclassified() {
        for name in ["README.md", "LICENSE", "plugin.dll.txt", "", "dir/", "so", "a.pwn"] {
            assert_eq!(classify(name), Classification::Unclassified, "{name}");
        }
    }

    #[test]
    fn test_archives() {
        assert_eq!(classify("bundle.zip"), Classification::Archive(ArchiveFormat::Zip));
        assert_eq!(classify("x/y.tar.gz"), Classification::Archive(ArchiveFormat::TarGz));
        assert_eq!(classify("y.7z"), Classification::Archive(ArchiveFormat::SevenZ));
    }

    #[test]
    fn test_components_precedence() {
        assert_eq!(
            classify("components/foo.dll"),
            Classification::Artifact(Role::Component)
        );
        assert_eq!(
            classify("pkg\\components\\sub\\data.json"),
            Classification::Artifact(Role::Component)
        );
        // Only an exact segment counts.
        assert_eq!(
            classify("my-components/foo.dll"),
            Classification::Artifact(Role::Plugin)
        );
        // The file itself named "components" is not a directory segment.
        assert_eq!(classify("plugins/components"), Classification::Unclassified);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for name in ["a.dll", "components/x", "q.zip", "n.txt"] {
            assert_eq!(classify(name), classify(name));
        }
    }

    #[test]
    fn test_hint_fallback() {
        assert_eq!(
            classify_with_hint("download", ContentHint::Plugin),
            Classification::Artifact(Role::Plugin)
        );
        assert_eq!(
            classify_with_hint("a.inc", ContentHint::Plugin),
            Classification::Artifact(Role::Header)
        );
        assert_eq!(
            classify_with_hint("download", ContentHint::Unknown),
            Classification::Unclassified
        );
    }

    #[test]
    fn test_relocation_table() {
        assert!(is_relocated("amxsscanf.so", &[]));
        assert!(is_relocated("LOG-CORE.DLL", &[]));
        assert!(!is_relocated("sscanf.so", &[]));
        assert!(is_relocated("custom.dll", &["Custom.dll".to_string()]));
    }

    #[test]
    fn test_component_subpath() {
        assert_eq!(
            component_subpath("pkg/components/sub/x.dll").as_deref(),
            Some("sub/x.dll")
        );
        assert_eq!(component_subpath("components/foo.dll").as_deref(), Some("foo.dll"));
        assert_eq!(component_subpath("plugins/foo.dll"), None);
        assert_eq!(component_subpath("components/"), None);
        assert_eq!(component_subpath("components/../x.dll"), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("a/b/c.inc"), "c.inc");
        assert_eq!(file_name("a\\b.dll"), "b.dll");
        assert_eq!(file_name("plain"), "plain");
    }
}
