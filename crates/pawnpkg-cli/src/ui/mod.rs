//! Terminal output.
//!
//! Progress events go to stderr so stdout stays clean for completions and
//! scripted use of `list`.

use std::path::Path;

use crossterm::style::Stylize;
use pawnpkg_core::io::sweep::SweepReport;
use pawnpkg_core::ops::acquire::last_error_per_rung;
use pawnpkg_core::ops::{AcquisitionResult, SourceFailure};
use pawnpkg_core::reporter::{Reporter, Stage};
use pawnpkg_core::resolver::RungKind;
use pawnpkg_core::DestinationRoots;
use pawnpkg_schema::Role;

/// Prints progress events as `  stage  message` lines on stderr.
///
/// Without `verbose`, only rung boundaries, placements and summaries show.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn wants(&self, stage: Stage) -> bool {
        self.verbose
            || matches!(
                stage,
                Stage::Place | Stage::Sweep | Stage::Ledger | Stage::Summary
            )
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, stage: Stage, message: &str) {
        if !self.wants(stage) {
            return;
        }
        let label = format!("{:>8}", stage.to_string());
        eprintln!("  {} {message}", label.dark_grey());
    }
}

/// Final summary of a successful install.
pub fn print_install_summary(
    result: &AcquisitionResult,
    roots: &DestinationRoots,
    previously_installed: bool,
) {
    println!();
    let verb = if previously_installed {
        "Refreshed"
    } else {
        "Installed"
    };
    println!("  {} {verb} {}", "✓".green(), result.identifier.as_str().bold());

    let rows = [
        (Role::Header, result.header_count(), &roots.include_root),
        (Role::Plugin, result.plugin_count(), &roots.plugins_root),
        (Role::Component, result.component_count(), &roots.components_root),
    ];
    for (role, count, root) in rows {
        if count > 0 {
            println!("    {count} {role}(s) -> {}", root.display());
        }
    }

    if !result.errors.is_empty() {
        println!(
            "    {}",
            format!("{} source(s) failed along the way", result.errors.len()).dark_grey()
        );
        for failure in &result.errors {
            println!("      {}", failure.to_string().dark_grey());
        }
    }
}

/// Report for an acquisition where every rung came up empty.
pub fn print_failure_report(identifier: &str, rungs: &[RungKind], errors: &[SourceFailure]) {
    eprintln!();
    eprintln!("  {} No source found for {}", "✗".red(), identifier.bold());
    for (rung, last) in last_error_per_rung(rungs, errors) {
        let rung = format!("{:<20}", rung.to_string());
        match last {
            Some(failure) => eprintln!("    {rung} {}", failure.message.as_str().red()),
            None => eprintln!("    {rung} {}", "nothing found".dark_grey()),
        }
    }
}

/// Summary of a loose-file sweep.
pub fn print_sweep_summary(source: &Path, report: &SweepReport) {
    println!();
    if report.moved.is_empty() {
        println!("  Nothing to sweep in {}", source.display());
    } else {
        println!(
            "  {} Moved {} file(s) from {}",
            "✓".green(),
            report.moved.len(),
            source.display()
        );
        for file in &report.moved {
            println!("    {} -> {}", file.from.display(), file.to.display());
        }
    }
    for (path, reason) in &report.failed {
        println!("    {} {}: {reason}", "!".yellow(), path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_reporter_filters_stages() {
        let quiet = ConsoleReporter::new(false);
        assert!(quiet.wants(Stage::Place));
        assert!(quiet.wants(Stage::Summary));
        assert!(!quiet.wants(Stage::Mirror));
        assert!(!quiet.wants(Stage::Extract));

        let loud = ConsoleReporter::new(true);
        assert!(loud.wants(Stage::Mirror));
    }
}
