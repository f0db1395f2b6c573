//! Parsing of the line-oriented command protocol.

use crate::domain::{IdParseError, NewUser, UserId};

/// One line of operator input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `1`
    ListUsers,
    /// `2 <id>`
    GetUser(UserId),
    /// `3 <name> <email> <password>`
    InsertUser(NewUser),
    /// `4 <id>`
    DeleteUser(UserId),
    /// `5 <id> <name> <email> <password>`
    UpdateUser(UserId, NewUser),
    /// `l`
    ListLogs,
    /// `q`, `quit` or `exit`
    Quit,
}

/// Reasons a line could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Too few arguments for a known command.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// The first word is not a command.
    #[error("unknown command: {0}")]
    Unknown(String),
    /// An identifier argument is not an integer.
    #[error(transparent)]
    InvalidId(#[from] IdParseError),
}

impl Command {
    /// Parse one input line.
    ///
    /// Blank lines yield `Ok(None)`. Words beyond those a command needs are
    /// ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use db_manager::domain::UserId;
    /// use db_manager::inbound::cli::Command;
    ///
    /// let command = Command::parse("2 7").unwrap();
    /// assert_eq!(command, Some(Command::GetUser(UserId::new(7))));
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match head {
            "q" | "quit" | "exit" => Self::Quit,
            "1" => Self::ListUsers,
            "l" => Self::ListLogs,
            "2" => match args {
                [id, ..] => Self::GetUser(id.parse()?),
                _ => return Err(CommandError::Usage("2 <id>")),
            },
            "3" => match args {
                [name, email, password, ..] => {
                    Self::InsertUser(NewUser::new(*name, *email, *password))
                }
                _ => return Err(CommandError::Usage("3 <name> <email> <password>")),
            },
            "4" => match args {
                [id, ..] => Self::DeleteUser(id.parse()?),
                _ => return Err(CommandError::Usage("4 <id>")),
            },
            "5" => match args {
                [id, name, email, password, ..] => {
                    Self::UpdateUser(id.parse()?, NewUser::new(*name, *email, *password))
                }
                _ => return Err(CommandError::Usage("5 <id> <name> <email> <password>")),
            },
            other => return Err(CommandError::Unknown(other.to_owned())),
        };

        Ok(Some(command))
    }
}
