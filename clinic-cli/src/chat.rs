//! Interactive chat session for the terminal.
//!
//! Reads stdin lines, drives a supervised link through the session state
//! machine, and prints remote turns as they are accepted. `/reschedule`
//! sends the reschedule control signal; `/quit` or `/exit` leaves.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use clinic_channel::{supervise, LinkEvent, SupervisedLink, SupervisorConfig};
use clinic_common::config::Config;
use clinic_session::{
    ChatSession, LinkTransition, PresenceState, SessionEvent, TurnOrigin, UserCommand,
};

/// What one line of user input means.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Text(String),
    Reschedule,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    match trimmed {
        "/quit" | "/exit" => Input::Quit,
        "/reschedule" => Input::Reschedule,
        _ => Input::Text(trimmed.to_string()),
    }
}

/// Print remote turns accepted since `from`; returns the new watermark.
///
/// Local turns advance the watermark silently - the user just typed them.
fn print_new_remote_turns(session: &ChatSession, from: usize) -> usize {
    let turns = session.transcript().turns();
    for turn in &turns[from..] {
        if turn.origin == TurnOrigin::Remote {
            println!("assistant: {}", turn.body);
        }
    }
    turns.len()
}

fn show_composing(session: &ChatSession) {
    if session.presence() == PresenceState::Composing {
        println!("assistant is typing...");
    }
}

async fn transmit(link: &SupervisedLink, frames: Vec<String>) {
    for frame in frames {
        match link.send_frame(frame).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Frame not transmitted; link not open"),
            Err(e) => tracing::warn!(error = %e, "Chat link unavailable"),
        }
    }
}

/// Run the interactive session until the user quits or the link gives up.
pub async fn run(config: &Config) -> Result<()> {
    let session_id = clinic_common::logging::generate_session_id();
    tracing::info!(session_id = %session_id, url = %config.chat.url, "Starting chat session");

    println!("Connecting to {} ...", config.chat.url);
    println!("Type a message and press enter. /reschedule asks to move your appointment; /quit leaves.");

    let (link, mut events) = supervise(
        config.chat.url.clone(),
        SupervisorConfig::from(&config.reconnect),
    );
    let mut session = ChatSession::new();
    let mut printed = 0;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    println!("(disconnected)");
                    break;
                };
                let session_event = match event {
                    LinkEvent::Opened => {
                        println!("(connected)");
                        SessionEvent::Link(LinkTransition::Opened)
                    }
                    LinkEvent::Closed => {
                        println!("(connection closed)");
                        SessionEvent::Link(LinkTransition::Closed)
                    }
                    LinkEvent::Errored(reason) => {
                        println!("(disconnected: {reason})");
                        SessionEvent::Link(LinkTransition::Errored)
                    }
                    LinkEvent::Frame(raw) => SessionEvent::Frame(raw),
                };
                let frames = session.apply(session_event);
                transmit(&link, frames).await;
                printed = print_new_remote_turns(&session, printed);
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else {
                    link.close().await;
                    break;
                };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Quit => {
                        link.close().await;
                        // Drain until the supervisor confirms shutdown
                        while let Some(event) = events.recv().await {
                            if matches!(event, LinkEvent::Closed | LinkEvent::Errored(_)) {
                                break;
                            }
                        }
                        session.apply(SessionEvent::Link(LinkTransition::Closed));
                        break;
                    }
                    Input::Reschedule => {
                        let frames = session.apply(SessionEvent::User(UserCommand::Reschedule));
                        if frames.is_empty() {
                            println!("(not connected; reschedule not sent)");
                        }
                        transmit(&link, frames).await;
                        show_composing(&session);
                    }
                    Input::Text(text) => {
                        let frames = session.apply(SessionEvent::User(UserCommand::Send(text)));
                        if frames.is_empty() {
                            println!("(not connected; message not sent)");
                        }
                        transmit(&link, frames).await;
                        printed = print_new_remote_turns(&session, printed);
                        show_composing(&session);
                    }
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_commands() {
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/reschedule"), Input::Reschedule);
        assert_eq!(parse_input("  /quit  "), Input::Quit);
    }

    #[test]
    fn test_parse_input_text_and_empty() {
        assert_eq!(parse_input("Hello there"), Input::Text("Hello there".into()));
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input(""), Input::Empty);
    }

    #[test]
    fn test_watermark_skips_local_turns() {
        let mut session = ChatSession::new();
        session.apply(SessionEvent::Link(LinkTransition::Opened));
        session.apply(SessionEvent::User(UserCommand::Send("hi".into())));

        // Local turn advances the watermark without printing
        let printed = print_new_remote_turns(&session, 0);
        assert_eq!(printed, 1);

        session.apply(SessionEvent::Frame("hello back".into()));
        assert_eq!(print_new_remote_turns(&session, printed), 2);
    }
}
