//! Colored terminal output for command progress.

use console::{Term, style};

/// Writes status lines: progress and results to stdout, warnings and errors to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    /// Detail line, only in verbose mode.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if self.verbose && !self.quiet {
            self.stdout.write_line(&style(message).dim().to_string())?;
        }
        Ok(())
    }

    pub fn println(&self, message: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stdout.write_line(message)?;
        }
        Ok(())
    }

    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stdout
                .write_line(&format!("{} {}", style("→").cyan(), message))?;
        }
        Ok(())
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stdout
                .write_line(&format!("{} {}", style("✓").green().bold(), message))?;
        }
        Ok(())
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stderr.write_line(&format!(
                "{} {}",
                style("warning:").yellow().bold(),
                message
            ))?;
        }
        Ok(())
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.stderr
            .write_line(&format!("{} {}", style("error:").red().bold(), message))
    }

    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stdout.write_line("")?;
            self.stdout.write_line(&style(title).bold().underlined().to_string())?;
        }
        Ok(())
    }

    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if !self.quiet {
            self.stdout.write_line(&format!("   {message}"))?;
        }
        Ok(())
    }
}
