#[derive(Debug, Default, PartialEq)]
pub(crate) enum ShellAction {
    Help,
    Version,
    #[default]
    Run,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ShellOptions {
    pub(crate) action: ShellAction,
}

type OptionSetter = fn(&mut ShellOptions);

struct ShellOption {
    short: char,
    long: &'static str,
    set: OptionSetter,
}

impl ShellOptions {
    const SHELL_OPTIONS: &'static [ShellOption] = &[
        ShellOption {
            short: 'h',
            long: "help",
            set: |options| options.action = ShellAction::Help,
        },
        ShellOption {
            short: 'V',
            long: "version",
            set: |options| options.action = ShellAction::Version,
        },
    ];

    pub(crate) fn from_env() -> Result<ShellOptions, String> {
        let args = std::env::args().collect();

        Self::parse_arguments(args)
    }

    /// parse smallsh arguments into a ShellOptions struct; the first argument is the program name
    pub(crate) fn parse_arguments(arguments: Vec<String>) -> Result<ShellOptions, String> {
        let mut options = ShellOptions::default();

        for arg in arguments.into_iter().skip(1) {
            if let Some(name) = arg.strip_prefix("--") {
                let option = Self::SHELL_OPTIONS
                    .iter()
                    .find(|o| o.long == name)
                    .ok_or_else(|| format!("unrecognized option '{arg}'"))?;
                (option.set)(&mut options);
            } else if let Some(flags) = arg.strip_prefix('-').filter(|f| !f.is_empty()) {
                // flags can be grouped
                for flag in flags.chars() {
                    let option = Self::SHELL_OPTIONS
                        .iter()
                        .find(|o| o.short == flag)
                        .ok_or_else(|| format!("invalid option -- '{flag}'"))?;
                    (option.set)(&mut options);
                }
            } else {
                Err(format!("unexpected argument '{arg}'"))?;
            }
        }

        Ok(options)
    }
}
