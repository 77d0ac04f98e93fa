use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

/// Write completions for `shell` to stdout.
pub fn completions(shell: Shell) -> Result<()> {
    generate(
        shell,
        &mut crate::Cli::command(),
        "pawnpkg",
        &mut std::io::stdout(),
    );
    Ok(())
}
