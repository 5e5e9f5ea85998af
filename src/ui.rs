// UI layer: line-based terminal input and output.
//
// Every prompt in the client goes through `Console`, so the session can be
// driven by a real terminal or by scripted input. Passwords are read with
// `dialoguer` when stdin is a terminal so they are not echoed.

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use dialoguer::Password;

pub trait Console {
    /// Print `prompt` and read one line without its line ending.
    /// Returns `None` at end of input or when the read was interrupted.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`Console::prompt`] but for input that should not be echoed.
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompt(prompt)
    }

    /// Print a line.
    fn say(&mut self, text: &str) -> io::Result<()>;
}

/// [`Console`] over any reader and writer.
pub struct LineConsole<R, W> {
    input: R,
    output: W,
    hide_secrets: bool,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LineConsole {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// Give back the writer, e.g. to inspect what a test session printed.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl LineConsole<StdinLock<'static>, Stdout> {
    /// Console on the process's stdin and stdout.
    pub fn terminal() -> Self {
        let stdin = io::stdin();
        let hide_secrets = stdin.is_terminal();
        LineConsole {
            input: stdin.lock(),
            output: io::stdout(),
            hide_secrets,
        }
    }
}

fn end_of_input(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
    )
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(trimmed);
                Ok(Some(line))
            }
            Err(e) if end_of_input(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.hide_secrets {
            return self.prompt(prompt);
        }
        // dialoguer adds its own ": " after the prompt.
        let label = prompt.trim_end().trim_end_matches(':');
        match Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
        {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if end_of_input(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_strips_line_endings() {
        let mut console = LineConsole::new(Cursor::new("alice\r\nbob\n"), Vec::new());
        assert_eq!(console.prompt("Username: ").unwrap().as_deref(), Some("alice"));
        assert_eq!(console.prompt("Username: ").unwrap().as_deref(), Some("bob"));
        assert_eq!(console.prompt("Username: ").unwrap(), None);
        let out = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(out, "Username: Username: Username: ");
    }

    #[test]
    fn secret_prompt_reads_a_line_when_not_a_terminal() {
        let mut console = LineConsole::new(Cursor::new("hunter2\n"), Vec::new());
        assert_eq!(
            console.prompt_secret("Password: ").unwrap().as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let mut console = LineConsole::new(Cursor::new("y"), Vec::new());
        assert_eq!(console.prompt("> ").unwrap().as_deref(), Some("y"));
        assert_eq!(console.prompt("> ").unwrap(), None);
    }
}
