use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

/// The number of regular arguments a command may receive, not counting the program name.
/// Anything beyond it is dropped without an error.
pub const MAX_ARGUMENTS: usize = 512;

const OUTPUT_REDIRECT: &str = ">";
const INPUT_REDIRECT: &str = "<";
const BACKGROUND: &str = "&";

/// One parsed command line.
#[derive(Debug, Default, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct CommandSpec {
    pub(crate) arguments: Vec<String>,
    pub(crate) input_redirect: Option<PathBuf>,
    pub(crate) output_redirect: Option<PathBuf>,
    pub(crate) background: bool,
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arguments.join(" "))?;
        if let Some(path) = &self.input_redirect {
            write!(f, " < {}", path.display())?;
        }
        if let Some(path) = &self.output_redirect {
            write!(f, " > {}", path.display())?;
        }
        if self.background {
            f.write_str(" &")?;
        }
        Ok(())
    }
}

// a filename has to follow the redirection token; another marker is not a filename
fn filename_after<'a>(tokens: &[&'a str], marker: &str) -> Option<&'a str> {
    let position = tokens.iter().position(|token| *token == marker)?;
    tokens
        .get(position + 1)
        .copied()
        .filter(|name| ![OUTPUT_REDIRECT, INPUT_REDIRECT, BACKGROUND].contains(name))
}

impl CommandSpec {
    pub fn parse(line: &str) -> Self {
        // The presence test runs on the whole line, the split below token by token: `a>b` is an
        // ordinary argument and never a redirection.
        let has_output_redirect = line.contains(OUTPUT_REDIRECT);
        let has_input_redirect = line.contains(INPUT_REDIRECT);

        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut arguments = Vec::new();
        for token in &tokens {
            if (has_output_redirect && *token == OUTPUT_REDIRECT)
                || (has_input_redirect && *token == INPUT_REDIRECT)
                || *token == BACKGROUND
            {
                break;
            }

            arguments.push(token.to_string());

            if arguments.len() == MAX_ARGUMENTS + 1 {
                break;
            }
        }

        CommandSpec {
            arguments,
            input_redirect: filename_after(&tokens, INPUT_REDIRECT).map(PathBuf::from),
            output_redirect: filename_after(&tokens, OUTPUT_REDIRECT).map(PathBuf::from),
            background: tokens.contains(&BACKGROUND),
        }
    }

    /// The program to execute, or an empty string for a blank line.
    pub fn program(&self) -> &str {
        self.arguments.first().map(String::as_str).unwrap_or_default()
    }

    /// The argument vector, program name included as its first element.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn input_redirect(&self) -> Option<&Path> {
        self.input_redirect.as_deref()
    }

    pub fn output_redirect(&self) -> Option<&Path> {
        self.output_redirect.as_deref()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}
