use anyhow::Result;
use crossterm::{
    style::{self, Colorize, Styler},
    QueueableCommand,
};
use std::io::Write;

pub fn print_warning(out: &mut impl Write, message: &str) -> Result<()> {
    out.queue(style::PrintStyledContent("WARN: ".yellow().bold()))?
        .queue(style::Print(message))?
        .queue(style::Print("\n"))?
        .flush()?;

    Ok(())
}

pub fn print_error(out: &mut impl Write, error: &anyhow::Error) -> Result<()> {
    out.queue(style::PrintStyledContent("ERROR: ".red().bold()))?
        .queue(style::Print(format!("{:#}", error)))?
        .queue(style::Print("\n"))?
        .flush()?;

    Ok(())
}

pub fn print_unmapped(out: &mut impl Write, suite: &str) -> Result<()> {
    print_warning(
        out,
        &format!(
            "suite to dist mapping not found! Check dist.yml for `{}' mapping.",
            suite
        ),
    )
}

/// Prints a unified diff with headers bold, hunk ranges cyan, removals red
/// and additions green.
pub fn print_diff(out: &mut impl Write, diff: &str) -> Result<()> {
    for line in diff.lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            style::style(line).bold()
        } else if line.starts_with("@@") {
            style::style(line).cyan()
        } else if line.starts_with('+') {
            style::style(line).green()
        } else if line.starts_with('-') {
            style::style(line).red()
        } else {
            style::style(line)
        };

        out.queue(style::PrintStyledContent(styled))?
            .queue(style::Print("\n"))?;
    }
    out.flush()?;

    Ok(())
}
