//! Command registry with a built-in `help` command.

use tracing::debug;

use super::{DispatchError, Dispatcher, Reply, ReplyWriter};

/// Reply for an unknown command.
pub const NOT_RECOGNISED: &str =
    "Command not recognised.  Enter 'help' to view a list of available commands.\r\n\r\n";

/// Reply for a known command given the wrong number of parameters.
pub const INCORRECT_PARAMETERS: &str =
    "Incorrect command parameter(s).  Enter \"help\" to view a list of available commands.\r\n\r\n";

const HELP_NAME: &str = "help";
const HELP_TEXT: &str = "\r\nhelp:\r\n Lists all the registered commands\r\n\r\n";

/// Number of whitespace-separated parameters a command takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameters {
    /// Exactly this many.
    Exactly(usize),
    /// Any number, checked by the command itself.
    Any,
}

impl Parameters {
    fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(expected) => expected == count,
            Self::Any => true,
        }
    }
}

/// What an interpreter produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Text was written to the reply writer.
    Text,
    /// The reply is the command's binary buffer, see [`Command::binary`].
    Binary,
}

/// One command interpreter.
pub trait Command: Send {
    /// Word that selects this command.
    fn name(&self) -> &str;

    /// Help text, listed by `help`.
    fn help(&self) -> &str;

    /// Parameters expected after the name.
    fn parameters(&self) -> Parameters;

    /// Run the command with its parameters.
    fn execute(
        &mut self,
        args: &[&str],
        out: &mut ReplyWriter<'_>,
    ) -> Result<Outcome, DispatchError>;

    /// Binary buffer served after [`Outcome::Binary`].
    fn binary(&self) -> &[u8] {
        &[]
    }

    /// The binary buffer was delivered; advance or reset it.
    fn binary_sent(&mut self) {}
}

/// Name-indexed set of commands; implements [`Dispatcher`].
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    binary_source: Option<usize>,
}

impl CommandRegistry {
    /// Create an empty registry (only `help` available).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    pub fn register(&mut self, command: Box<dyn Command>) -> Result<(), DispatchError> {
        let name = command.name();
        if name == HELP_NAME || self.find(name).is_some() {
            return Err(DispatchError::Duplicate {
                name: name.to_owned(),
            });
        }
        debug!(command = name, "registered command");
        self.commands.push(command);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, command: impl Command + 'static) -> Result<Self, DispatchError> {
        self.register(Box::new(command))?;
        Ok(self)
    }

    /// Registered command names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name())
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.name() == name)
    }

    fn write_help(&self, out: &mut ReplyWriter<'_>) -> Result<(), DispatchError> {
        out.push_str(HELP_TEXT)?;
        for command in &self.commands {
            out.push_str(command.help())?;
        }
        Ok(())
    }
}

impl Dispatcher for CommandRegistry {
    fn dispatch<'a>(
        &'a mut self,
        command: &str,
        output: &'a mut [u8],
    ) -> Result<Reply<'a>, DispatchError> {
        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();
        let mut out = ReplyWriter::new(output);

        if name == HELP_NAME {
            self.write_help(&mut out)?;
            return Ok(Reply::Text(out.into_written()));
        }

        let Some(index) = self.find(name) else {
            out.push_str(NOT_RECOGNISED)?;
            return Ok(Reply::Text(out.into_written()));
        };

        let interpreter = &mut self.commands[index];
        if !interpreter.parameters().accepts(args.len()) {
            out.push_str(INCORRECT_PARAMETERS)?;
            return Ok(Reply::Text(out.into_written()));
        }

        match interpreter.execute(&args, &mut out)? {
            Outcome::Text => Ok(Reply::Text(out.into_written())),
            Outcome::Binary => {
                self.binary_source = Some(index);
                Ok(Reply::Binary(self.commands[index].binary()))
            }
        }
    }

    fn binary_sent(&mut self) {
        if let Some(index) = self.binary_source.take() {
            self.commands[index].binary_sent();
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Command for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn help(&self) -> &str {
            "echo <any>: Replies with its parameters.\r\n"
        }

        fn parameters(&self) -> Parameters {
            Parameters::Any
        }

        fn execute(
            &mut self,
            args: &[&str],
            out: &mut ReplyWriter<'_>,
        ) -> Result<Outcome, DispatchError> {
            out.push_str(&args.join(" "))?;
            Ok(Outcome::Text)
        }
    }

    struct Blob {
        data: Vec<u8>,
        sent: usize,
    }

    impl Command for Blob {
        fn name(&self) -> &str {
            "blob"
        }

        fn help(&self) -> &str {
            "blob: Binary reply.\r\n"
        }

        fn parameters(&self) -> Parameters {
            Parameters::Exactly(0)
        }

        fn execute(&mut self, _: &[&str], _: &mut ReplyWriter<'_>) -> Result<Outcome, DispatchError> {
            Ok(Outcome::Binary)
        }

        fn binary(&self) -> &[u8] {
            &self.data
        }

        fn binary_sent(&mut self) {
            self.sent += 1;
            self.data.clear();
        }
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::new()
            .with(Echo)
            .unwrap()
            .with(Blob {
                data: vec![0, 1, 0, 2],
                sent: 0,
            })
            .unwrap()
    }

    #[test]
    fn text_command() {
        let mut registry = registry();
        let mut out = [0u8; 64];
        let reply = registry.dispatch("echo a  b", &mut out).unwrap();
        assert_eq!(reply, Reply::Text(b"a b"));
    }

    #[test]
    fn unknown_and_bad_parameters() {
        let mut registry = registry();
        let mut out = [0u8; 256];
        let reply = registry.dispatch("reboot", &mut out).unwrap();
        assert_eq!(reply.bytes(), NOT_RECOGNISED.as_bytes());

        let reply = registry.dispatch("blob extra", &mut out).unwrap();
        assert_eq!(reply.bytes(), INCORRECT_PARAMETERS.as_bytes());

        let reply = registry.dispatch("", &mut out).unwrap();
        assert_eq!(reply.bytes(), NOT_RECOGNISED.as_bytes());
    }

    #[test]
    fn help_lists_commands() {
        let mut registry = registry();
        let mut out = [0u8; 256];
        let reply = registry.dispatch("help", &mut out).unwrap();
        let text = std::str::from_utf8(reply.bytes()).unwrap();
        assert!(text.starts_with(HELP_TEXT));
        assert!(text.contains("echo <any>"));
        assert!(text.ends_with("blob: Binary reply.\r\n"));
    }

    #[test]
    fn help_overflow_is_truncation() {
        let mut registry = registry();
        let mut out = [0u8; 8];
        assert_eq!(
            registry.dispatch("help", &mut out),
            Err(DispatchError::Truncated { capacity: 8 })
        );
    }

    #[test]
    fn binary_reply_and_release() {
        let mut registry = registry();
        let mut out = [0u8; 16];
        let reply = registry.dispatch("blob", &mut out).unwrap();
        assert_eq!(reply, Reply::Binary(&[0, 1, 0, 2]));

        registry.binary_sent();
        let reply = registry.dispatch("blob", &mut out).unwrap();
        assert_eq!(reply, Reply::Binary(&[]));

        // Release only applies to the dispatch that produced binary data.
        registry.dispatch("echo x", &mut out).unwrap();
        registry.binary_sent();
        registry.binary_sent();
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.register(Box::new(Echo)),
            Err(DispatchError::Duplicate {
                name: "echo".to_owned()
            })
        );
    }
}
