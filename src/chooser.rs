// Numbered single-select prompt.

use std::io;

use crate::ui::Console;

/// Outcome of [`choose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    /// Zero-based index into the options.
    Index(usize),
    Shortcut(T),
    /// `q` was entered or input ended.
    Cancelled,
}

/// Print `title` and a numbered list of `options`, then read lines until one
/// names an option (`1..=N`), matches a shortcut key (case-insensitive), or
/// cancels with `q`. Anything else is asked again.
///
/// `q` always cancels, so a `q` shortcut is never returned.
pub fn choose<C, S, T>(
    console: &mut C,
    title: &str,
    options: &[S],
    shortcuts: &[(char, T)],
) -> io::Result<Choice<T>>
where
    C: Console + ?Sized,
    S: AsRef<str>,
    T: Copy,
{
    console.say(title)?;
    for (i, option) in options.iter().enumerate() {
        console.say(&format!("  {}) {}", i + 1, option.as_ref()))?;
    }
    console.say("")?;

    let keys: String = shortcuts
        .iter()
        .map(|(key, _)| key.to_ascii_lowercase())
        .filter(|key| *key != 'q')
        .chain(std::iter::once('q'))
        .collect();
    let prompt = format!("Choose an option (or [{keys}]): ");

    loop {
        let Some(line) = console.prompt(&prompt)? else {
            return Ok(Choice::Cancelled);
        };
        let input = line.trim().to_lowercase();

        if input == "q" {
            return Ok(Choice::Cancelled);
        }

        let mut chars = input.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some((_, value)) = shortcuts
                .iter()
                .find(|(key, _)| key.to_ascii_lowercase() == c)
            {
                return Ok(Choice::Shortcut(*value));
            }
        }

        if let Ok(n) = input.parse::<usize>() {
            if (1..=options.len()).contains(&n) {
                return Ok(Choice::Index(n - 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::LineConsole;
    use std::io::Cursor;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Action {
        Create,
    }

    fn run(input: &str, options: &[&str]) -> (Choice<Action>, String) {
        let mut console = LineConsole::new(Cursor::new(input.to_string()), Vec::new());
        let choice = choose(&mut console, "Choose event:", options, &[('c', Action::Create)]).unwrap();
        (choice, String::from_utf8(console.into_output()).unwrap())
    }

    #[test]
    fn every_listed_number_selects_its_index() {
        let options = ["a", "b", "c", "d"];
        for n in 1..=options.len() {
            let (choice, _) = run(&format!("{n}\n"), &options);
            assert_eq!(choice, Choice::Index(n - 1));
        }
    }

    #[test]
    fn out_of_range_numbers_are_asked_again() {
        let (choice, out) = run("0\n4\n3\n", &["a", "b", "c"]);
        assert_eq!(choice, Choice::Index(2));
        assert_eq!(out.matches("Choose an option").count(), 3);
    }

    #[test]
    fn shortcut_is_case_insensitive() {
        let (choice, _) = run("C\n", &["a"]);
        assert_eq!(choice, Choice::Shortcut(Action::Create));
    }

    #[test]
    fn q_and_end_of_input_cancel() {
        assert_eq!(run("Q\n", &["a"]).0, Choice::Cancelled);
        assert_eq!(run("", &["a"]).0, Choice::Cancelled);
        assert_eq!(run("nonsense\n", &["a"]).0, Choice::Cancelled);
    }

    #[test]
    fn menu_lists_options_and_keys() {
        let (_, out) = run("q\n", &["Party", "Wedding"]);
        assert!(out.starts_with("Choose event:\n  1) Party\n  2) Wedding\n\n"));
        assert!(out.contains("Choose an option (or [cq]): "));
    }

    #[test]
    fn empty_menu_only_offers_shortcuts() {
        let (choice, out) = run("1\nc\n", &[]);
        assert_eq!(choice, Choice::Shortcut(Action::Create));
        assert!(!out.contains("1)"));
    }
}
