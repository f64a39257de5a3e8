//! Line-oriented keyboard input
//!
//! Each stdin line is replayed as keystrokes followed by a newline. A few
//! colon commands control the session instead of typing.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::game::Key;

const RESTART_COMMAND: &str = ":restart";
const QUIT_COMMAND: &str = ":quit";

/// Input delivered to the match runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Key(Key),
    Restart,
    Quit,
}

/// Translate one input line into commands
pub fn parse_line(line: &str) -> Vec<Command> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    match line.trim() {
        RESTART_COMMAND => return vec![Command::Restart],
        QUIT_COMMAND => return vec![Command::Quit],
        _ => {}
    }

    line.chars()
        .map(|c| match c {
            '\t' => Key::Tab,
            '\u{8}' | '\u{7f}' => Key::Backspace,
            c => Key::Char(c),
        })
        .chain(std::iter::once(Key::Char('\n')))
        .map(Command::Key)
        .collect()
}

/// Forward stdin to `tx` until EOF or the receiver goes away
pub async fn read_stdin(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                for command in parse_line(&line) {
                    if tx.send(command).await.is_err() {
                        debug!("Command channel closed");
                        return;
                    }
                }
            }
            Ok(None) => {
                info!("stdin closed");
                break;
            }
            Err(e) => {
                info!(error = %e, "stdin read failed");
                break;
            }
        }
    }

    let _ = tx.send(Command::Quit).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_becomes_keys_and_newline() {
        assert_eq!(
            parse_line("a\tb"),
            vec![
                Command::Key(Key::Char('a')),
                Command::Key(Key::Tab),
                Command::Key(Key::Char('b')),
                Command::Key(Key::Char('\n')),
            ]
        );
    }

    #[test]
    fn empty_line_is_a_newline() {
        assert_eq!(parse_line(""), vec![Command::Key(Key::Char('\n'))]);
    }

    #[test]
    fn backspace_bytes_map_to_backspace() {
        assert_eq!(parse_line("\u{7f}")[0], Command::Key(Key::Backspace));
    }

    #[test]
    fn colon_commands() {
        assert_eq!(parse_line(":restart"), vec![Command::Restart]);
        assert_eq!(parse_line(":quit\r\n"), vec![Command::Quit]);
    }
}
