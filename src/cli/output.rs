//! Console output helpers for the forkpool CLI

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("{}", style(title).cyan().bold());
        }
    }

    /// Print an aligned key/value line
    pub fn key_value(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<28} {}", style(key).dim(), style(value).yellow());
        }
    }

    /// Print raw text regardless of styling (used for machine-readable output)
    pub fn raw(&self, text: &str) {
        println!("{text}");
    }
}
