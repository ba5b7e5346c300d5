//! Console input: one line per command.

use anyhow::{anyhow, bail};
use client_core::UserCommand;
use shared::domain::FileFormat;

pub const HELP: &str = "\
commands:
  start <exam_id> [csv|xlsx|json|xml]  start crawling an exam
  stop                                 stop the running crawl
  status                               ask the server for its job status
  logs                                 show the server's recent log lines
  download                             save the last result file
  clear                                clear the activity log
  connect                              reconnect the event stream now
  check <text>                         validate an exam id as you would type it
  help                                 show this help
  quit                                 disconnect and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Send(UserCommand),
    Help,
    Quit,
    Empty,
}

/// Parses one input line; `default_format` applies when `start` names none.
pub fn parse_command(line: &str, default_format: FileFormat) -> anyhow::Result<ConsoleCommand> {
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed.trim_end(), ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        "start" => {
            let mut args = rest.split_whitespace();
            let Some(exam_id) = args.next() else {
                bail!("usage: start <exam_id> [csv|xlsx|json|xml]");
            };
            let format = match args.next() {
                Some(raw) => raw.parse()?,
                None => default_format,
            };
            if let Some(extra) = args.next() {
                bail!("unexpected argument {extra:?}");
            }
            ConsoleCommand::Send(UserCommand::Start {
                exam_id: exam_id.to_string(),
                format,
            })
        }
        "stop" => ConsoleCommand::Send(UserCommand::Stop),
        "status" => ConsoleCommand::Send(UserCommand::RefreshStatus),
        "logs" => ConsoleCommand::Send(UserCommand::FetchServerLogs),
        "download" => ConsoleCommand::Send(UserCommand::DownloadResults),
        "clear" => ConsoleCommand::Send(UserCommand::ClearLogs),
        "connect" => ConsoleCommand::Send(UserCommand::Connect),
        "check" => ConsoleCommand::Send(UserCommand::ExamIdEdited(rest.trim_end().to_string())),
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(anyhow!("unknown command {other:?}, type `help`")),
    };
    Ok(command)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
