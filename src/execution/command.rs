//! Command specification and command-string construction.

/// Number of characters of the command string shown in status text.
pub const PREVIEW_LEN: usize = 20;

/// A remote command to be executed over an SSH session.
///
/// The final command string sent to the remote shell is the base command
/// line, one space, then the arguments joined by single spaces with any
/// embedded spaces escaped (`' '` becomes `"\ "`).
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// The base command line.
    pub command_line: String,
    /// Ordered arguments appended after the command line.
    pub command_args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec with no arguments.
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            command_args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command_args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the final command string sent to the remote shell.
    ///
    /// Arguments containing spaces are escaped before joining, so
    /// `ls` with args `["a b", "c"]` yields `ls a\ b c`. The separator
    /// space after the command line is always emitted, even with an
    /// empty argument list.
    pub fn command_string(&self) -> String {
        let escaped: Vec<String> = self
            .command_args
            .iter()
            .map(|arg| arg.replace(' ', "\\ "))
            .collect();
        format!("{} {}", self.command_line, escaped.join(" "))
    }

    /// Truncated preview of the command string for status reporting.
    ///
    /// At most [`PREVIEW_LEN`] characters, cut on a char boundary.
    pub fn preview(&self) -> String {
        self.command_string().chars().take(PREVIEW_LEN).collect()
    }
}
