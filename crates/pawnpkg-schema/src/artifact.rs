use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a classified file plays in the project tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A server plugin (`.dll` / `.so`), placed in the plugins root.
    Plugin,
    /// A Pawn include file (`.inc`), placed in the include root.
    Header,
    /// Anything shipped under a `components/` directory of an archive.
    Component,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plugin => "plugin",
            Self::Header => "header",
            Self::Component => "component",
        })
    }
}

/// A classified piece of content ready for placement.
///
/// The role is fixed at construction; placement only decides *where* an
/// artifact goes, never *what* it is.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    role: Role,
    bytes: Bytes,
    entry_path: Option<String>,
}

impl Artifact {
    /// Create an artifact from a loose file (a release asset or a direct download).
    pub fn new(name: impl Into<String>, role: Role, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            role,
            bytes,
            entry_path: None,
        }
    }

    /// Record the path of the archive entry this artifact came from.
    pub fn with_entry_path(mut self, path: impl Into<String>) -> Self {
        self.entry_path = Some(path.into());
        self
    }

    /// Bare filename (no directories).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classified role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// File content.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Path inside the source archive, if any. Always `/`-separated.
    pub fn entry_path(&self) -> Option<&str> {
        self.entry_path.as_deref()
    }
}

/// Archive container formats the extractor understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// Zip archive (`.zip`).
    Zip,
    /// Gzip-compressed tar archive (`.tar.gz` / `.tgz`).
    #[serde(rename = "tar.gz")]
    TarGz,
    /// RAR archive (`.rar`).
    Rar,
    /// 7-Zip archive (`.7z`).
    #[serde(rename = "7z")]
    SevenZ,
}

impl ArchiveFormat {
    /// Detect the format from a filename or URL suffix (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".rar") {
            Some(Self::Rar)
        } else if lower.ends_with(".7z") {
            Some(Self::SevenZ)
        } else {
            None
        }
    }

    /// Detect the format from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if bytes.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if bytes.starts_with(b"Rar!\x1a\x07") {
            Some(Self::Rar)
        } else if bytes.starts_with(&[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c]) {
            Some(Self::SevenZ)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::Rar => "rar",
            Self::SevenZ => "7z",
        })
    }
}

/// What a source candidate is expected to serve, when known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentHint {
    /// An archive whose entries get classified individually.
    Archive,
    /// A single plugin binary.
    Plugin,
    /// A single include file.
    Header,
    /// Nothing known; classify by name.
    Unknown,
}
