//! Line protocol: parses a command line and formats a response line.

use blockfs_types::FsError;
use thiserror::Error;

/// A parsed request line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Create { name: String },
    Write { name: String, content: Vec<u8> },
    Read { name: String },
    Delete { name: String },
    List,
    Quit,
}

/// A malformed request line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command.")]
    UnknownVerb,
    #[error("CREATE requires a file name")]
    CreateMissingName,
    #[error("WRITE requires a file name and content")]
    WriteMissingArgs,
    #[error("READ requires a file name")]
    ReadMissingName,
    #[error("DELETE requires a file name")]
    DeleteMissingName,
}

/// Parses one line of input (without its trailing newline) into a
/// [`Command`].
pub fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let mut parts = trimmed.splitn(3, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim_start();

    match verb.to_ascii_uppercase().as_str() {
        "CREATE" => {
            let name = first_token(rest);
            if name.is_empty() {
                return Err(ProtocolError::CreateMissingName);
            }
            Ok(Command::Create { name: name.to_owned() })
        }
        "WRITE" => {
            let mut name_and_content = rest.splitn(2, char::is_whitespace);
            let name = name_and_content.next().unwrap_or_default();
            let content = name_and_content.next().unwrap_or_default().trim_start();
            if name.is_empty() || content.is_empty() {
                return Err(ProtocolError::WriteMissingArgs);
            }
            Ok(Command::Write {
                name: name.to_owned(),
                content: content.as_bytes().to_vec(),
            })
        }
        "READ" => {
            let name = first_token(rest);
            if name.is_empty() {
                return Err(ProtocolError::ReadMissingName);
            }
            Ok(Command::Read { name: name.to_owned() })
        }
        "DELETE" => {
            let name = first_token(rest);
            if name.is_empty() {
                return Err(ProtocolError::DeleteMissingName);
            }
            Ok(Command::Delete { name: name.to_owned() })
        }
        "LIST" => Ok(Command::List),
        "QUIT" => Ok(Command::Quit),
        _ => Err(ProtocolError::UnknownVerb),
    }
}

fn first_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or_default()
}

/// Formats a successful `CREATE` response.
#[must_use]
pub fn create_success(name: &str) -> String {
    format!("SUCCESS: File '{name}' created.")
}

/// Formats a successful `WRITE` response.
#[must_use]
pub fn write_success(name: &str) -> String {
    format!("SUCCESS: File '{name}' written.")
}

/// Formats a successful `DELETE` response.
#[must_use]
pub fn delete_success(name: &str) -> String {
    format!("SUCCESS: File '{name}' deleted.")
}

/// Formats a `LIST` response.
#[must_use]
pub fn list_response(names: &[String]) -> String {
    if names.is_empty() {
        "No files in filesystem.".to_owned()
    } else {
        names.join(", ")
    }
}

/// Formats a wire-level error line from a core file system error.
#[must_use]
pub fn fs_error_response(err: &FsError) -> String {
    format!("ERROR: {err}")
}

/// Formats a wire-level error line from a malformed command.
#[must_use]
pub fn protocol_error_response(err: &ProtocolError) -> String {
    format!("ERROR: {err}")
}
