pub(crate) const USAGE_MSG: &str = "usage: smallsh [-hV]";

const DESCRIPTOR: &str = "smallsh - a small interactive command shell";

const HELP_MSG: &str = "Commands are read from standard input, one per line:
  command [arg...] [< input] [> output] [&]

Built-in commands:
  cd [directory]           change the working directory, default $HOME
  status                   show how the last foreground command ended
  exit                     leave the shell

Options:
  -h, --help               display help message and exit
  -V, --version            display version information and exit
";

pub(crate) fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}
