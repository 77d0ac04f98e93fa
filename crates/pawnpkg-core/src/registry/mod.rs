//! Source-host API clients.

pub mod github;

pub use github::GitHubClient;
