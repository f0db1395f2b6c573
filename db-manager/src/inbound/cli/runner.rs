//! The interactive command loop.
//!
//! The loop reads one line per iteration, executes it against the decorated
//! user repository and writes the result. Cancellation is checked before each
//! prompt and while waiting for input; a command that has started always runs
//! to completion.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::ports::{LogRepository, LogRepositoryError, UserRepository, UserRepositoryError};

use super::command::Command;

const MENU: &str = "\
Available operations:
1                            - Get all users
2 <id>                       - Get user by ID
3 <name> <email> <password>  - Insert user
4 <id>                       - Delete user by ID
5 <id> <name> <email> <pwd>  - Update user by ID
l                            - Show audit log
q                            - Quit
";

const PROMPT: &str = "Enter command: ";

/// Why [`CommandLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The operator entered a quit command.
    Quit,
    /// The input stream closed.
    EndOfInput,
    /// The cancellation token fired.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
enum ExecutionError {
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    #[error(transparent)]
    Logs(#[from] LogRepositoryError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

enum Input {
    Line,
    Closed,
    Cancelled,
}

/// Line-oriented front end over the decorated repository and the log store.
pub struct CommandLoop<R, W> {
    input: R,
    output: W,
    users: Arc<dyn UserRepository>,
    logs: Arc<dyn LogRepository>,
    cancellation: CancellationToken,
}

impl<R, W> CommandLoop<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Build a loop reading commands from `input` and writing to `output`.
    pub fn new(
        input: R,
        output: W,
        users: Arc<dyn UserRepository>,
        logs: Arc<dyn LogRepository>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            input,
            output,
            users,
            logs,
            cancellation,
        }
    }

    /// Consume the loop and return its writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until quit, end of input, or cancellation.
    ///
    /// Repository failures are printed and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when reading input or writing output fails. A
    /// line that is not valid UTF-8 is reported and skipped.
    pub async fn run(&mut self) -> io::Result<LoopExit> {
        let mut raw = Vec::new();
        loop {
            if self.cancellation.is_cancelled() {
                return self.shut_down().await;
            }

            self.output.write_all(b"\n").await?;
            self.output.write_all(MENU.as_bytes()).await?;
            self.output.write_all(PROMPT.as_bytes()).await?;
            self.output.flush().await?;

            raw.clear();
            let input = tokio::select! {
                biased;
                () = self.cancellation.cancelled() => Input::Cancelled,
                read = self.input.read_until(b'\n', &mut raw) => match read? {
                    0 => Input::Closed,
                    _ => Input::Line,
                },
            };

            match input {
                Input::Cancelled => return self.shut_down().await,
                Input::Closed => {
                    info!("command input closed");
                    return Ok(LoopExit::EndOfInput);
                }
                Input::Line => {}
            }

            let Ok(line) = std::str::from_utf8(&raw) else {
                warn!(bytes = raw.len(), "discarding input line that is not valid UTF-8");
                self.write_error(&"input is not valid UTF-8").await?;
                continue;
            };

            let command = match Command::parse(line) {
                Ok(Some(Command::Quit)) => return Ok(LoopExit::Quit),
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    self.write_error(&err).await?;
                    continue;
                }
            };

            debug!(?command, "executing command");
            match self.execute(command).await {
                Ok(()) => {}
                Err(ExecutionError::Io(err)) => return Err(err),
                Err(ExecutionError::Users(err)) if err.is_not_found() => {
                    self.output.write_all(b"User not found\n").await?;
                }
                Err(err) => self.write_error(&err).await?,
            }
        }
    }

    async fn shut_down(&mut self) -> io::Result<LoopExit> {
        self.output.write_all(b"Shutting down...\n").await?;
        self.output.flush().await?;
        Ok(LoopExit::Cancelled)
    }

    async fn write_error(&mut self, err: &impl std::fmt::Display) -> io::Result<()> {
        let text = format!("Error: {err}\n\n");
        self.output.write_all(text.as_bytes()).await
    }

    async fn write_line(&mut self, text: String) -> Result<(), ExecutionError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<(), ExecutionError> {
        match command {
            Command::ListUsers => {
                for user in self.users.get_users().await? {
                    self.write_line(user.to_string()).await?;
                }
            }
            Command::GetUser(id) => {
                let user = self.users.get_user_by_id(id).await?;
                self.write_line(user.to_string()).await?;
            }
            Command::InsertUser(user) => {
                let outcome = self.users.insert_user(&user).await?;
                self.write_line(format!("Inserted {} row(s)", outcome.rows_affected))
                    .await?;
            }
            Command::DeleteUser(id) => {
                let outcome = self.users.delete_user_by_id(id).await?;
                self.write_line(format!("Deleted {} row(s)", outcome.rows_affected))
                    .await?;
            }
            Command::UpdateUser(id, user) => {
                self.users.get_user_by_id(id).await?;
                let outcome = self.users.update_user_by_id(id, &user).await?;
                self.write_line(format!("Updated {} row(s)", outcome.rows_affected))
                    .await?;
            }
            Command::ListLogs => {
                for entry in self.logs.get_logs().await? {
                    self.write_line(entry.to_string()).await?;
                }
            }
            Command::Quit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewLogEntry, NewUser};
    use crate::domain::ports::{FixtureLogRepository, MockUserRepository};
    use crate::outbound::memory::InMemoryDatabase;
    use chrono::Utc;

    async fn run_script(
        script: &str,
        users: Arc<dyn UserRepository>,
        logs: Arc<dyn LogRepository>,
    ) -> (LoopExit, String) {
        let mut command_loop = CommandLoop::new(
            script.as_bytes(),
            Vec::new(),
            users,
            logs,
            CancellationToken::new(),
        );
        let exit = command_loop.run().await.expect("loop should not fail on I/O");
        let output = String::from_utf8(command_loop.into_output()).expect("output is UTF-8");
        (exit, output)
    }

    #[tokio::test]
    async fn insert_then_get_prints_the_user() {
        let database = Arc::new(InMemoryDatabase::new());
        let (exit, output) = run_script(
            "3 Alice alice@example.com pw\n2 1\nq\n",
            database.clone(),
            database,
        )
        .await;

        assert_eq!(exit, LoopExit::Quit);
        assert!(output.contains("Inserted 1 row(s)"));
        assert!(output.contains("1 Alice alice@example.com "));
    }

    #[tokio::test]
    async fn missing_user_is_reported_without_error_prefix() {
        let database = Arc::new(InMemoryDatabase::new());
        let (_, output) = run_script("2 99\n4 99\n", database.clone(), database).await;

        assert!(output.contains("User not found\n"));
        assert!(output.contains("Deleted 0 row(s)"));
        assert!(!output.contains("Error:"));
    }

    #[tokio::test]
    async fn update_of_missing_user_skips_the_write() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_user_by_id()
            .returning(|id| Err(UserRepositoryError::not_found(id)));
        users.expect_update_user_by_id().never();

        let (_, output) = run_script(
            "5 4 Bob bob@example.com pw2\n",
            Arc::new(users),
            Arc::new(FixtureLogRepository),
        )
        .await;

        assert!(output.contains("User not found"));
    }

    #[tokio::test]
    async fn repository_errors_are_printed_and_the_loop_continues() {
        let database = Arc::new(InMemoryDatabase::new());
        database.fail_next_call(UserRepositoryError::connection("server went away"));

        let (exit, output) = run_script("1\n1\n", database.clone(), database).await;

        assert_eq!(exit, LoopExit::EndOfInput);
        assert!(output.contains("Error: user repository connection failed: server went away\n\n"));
        assert_eq!(output.matches(PROMPT).count(), 3);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let database = Arc::new(InMemoryDatabase::new());
        let input: &[u8] = b"\xff\xfe\n3 Alice a@example.com pw\nq\n";
        let mut command_loop = CommandLoop::new(
            input,
            Vec::new(),
            database.clone(),
            database.clone(),
            CancellationToken::new(),
        );

        let exit = command_loop.run().await.expect("bad bytes are not an I/O failure");

        assert_eq!(exit, LoopExit::Quit);
        let output = String::from_utf8(command_loop.into_output()).expect("output is UTF-8");
        assert!(output.contains("Error: input is not valid UTF-8\n"));
        assert!(output.contains("Inserted 1 row(s)"));
        assert_eq!(database.user_count(), 1);
    }

    #[tokio::test]
    async fn malformed_lines_are_reported() {
        let database = Arc::new(InMemoryDatabase::new());
        let (_, output) = run_script("2\nx\n4 abc\n\n", database.clone(), database).await;

        assert!(output.contains("Error: usage: 2 <id>"));
        assert!(output.contains("Error: unknown command: x"));
        assert!(output.contains("Error: invalid id: "));
    }

    #[tokio::test]
    async fn audit_log_is_listed() {
        let database = Arc::new(InMemoryDatabase::new());
        database
            .insert_user(&NewUser::new("Alice", "a@example.com", "pw"))
            .await
            .expect("seed insert");
        let entry = NewLogEntry::new("Trying to insert user", Utc::now());
        database.insert_log(entry).await.expect("seed log");

        let (_, output) = run_script("l\n", database.clone(), database).await;

        assert!(output.contains("[1] "));
        assert!(output.contains("Trying to insert user"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_reading() {
        let database = Arc::new(InMemoryDatabase::new());
        let token = CancellationToken::new();
        token.cancel();
        let mut command_loop =
            CommandLoop::new("4 1\n".as_bytes(), Vec::new(), database.clone(), database, token);

        let exit = command_loop.run().await.expect("loop should not fail on I/O");

        assert_eq!(exit, LoopExit::Cancelled);
        let output = String::from_utf8(command_loop.into_output()).expect("output is UTF-8");
        assert_eq!(output, "Shutting down...\n");
    }

    #[tokio::test]
    async fn cancellation_while_waiting_for_input_ends_the_loop() {
        let database = Arc::new(InMemoryDatabase::new());
        let token = CancellationToken::new();
        let (reader, _writer) = tokio::io::duplex(64);
        let mut command_loop = CommandLoop::new(
            tokio::io::BufReader::new(reader),
            Vec::new(),
            database.clone(),
            database,
            token.clone(),
        );

        let handle = tokio::spawn(async move { command_loop.run().await });
        token.cancel();

        let exit = handle
            .await
            .expect("loop task should not panic")
            .expect("loop should not fail on I/O");
        assert_eq!(exit, LoopExit::Cancelled);
    }
}
