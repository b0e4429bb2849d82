use std::io::{self, BufRead, IsTerminal, Write};

/// Ask a yes/no question on stderr. `assume_yes` skips the prompt; without it
/// a non-interactive stdin is refused rather than guessed.
pub(crate) fn confirm(question: &str, assume_yes: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if assume_yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err("refusing to continue without confirmation in non-interactive mode; \
                    use --yes to skip the prompt"
            .into());
    }

    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
