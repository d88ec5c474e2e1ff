//! Line-driven mock reader for bench testing without hardware.
//!
//! One command per line:
//!
//! ```text
//! present 01AB12345     # card enters the field with this identity block
//! repoll                # same card re-polled
//! repoll 11ST00001      # re-polled, now reading a different block
//! unreadable            # card in the field whose block read fails
//! remove                # card leaves the field
//! disconnect unplugged  # reader session lost
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use oruca_hardware::mock::MockReaderHandle;
use oruca_hardware::{CardFamily, TagHandle, TagReadError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    Present(String),
    Repoll(Option<String>),
    Unreadable,
    Remove,
    Disconnect(String),
}

/// Parse one input line. `Ok(None)` for blank and comment lines.
pub fn parse_command(line: &str) -> Result<Option<SimCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match (verb, rest) {
        ("present", "") => return Err("present needs a payload".to_string()),
        ("present", payload) => SimCommand::Present(payload.to_string()),
        ("repoll", "") => SimCommand::Repoll(None),
        ("repoll", payload) => SimCommand::Repoll(Some(payload.to_string())),
        ("unreadable", "") => SimCommand::Unreadable,
        ("remove", "") => SimCommand::Remove,
        ("disconnect", "") => SimCommand::Disconnect("simulated disconnect".to_string()),
        ("disconnect", reason) => SimCommand::Disconnect(reason.to_string()),
        (verb @ ("unreadable" | "remove"), _) => {
            return Err(format!("{verb} takes no argument"));
        }
        (verb, _) => return Err(format!("unknown command: {verb}")),
    };

    Ok(Some(command))
}

/// Feed commands from `input` into the mock reader until end of input.
///
/// # Errors
///
/// Returns an error if reading `input` fails or the reader has gone away.
pub async fn drive<I>(input: I, handle: &MockReaderHandle) -> anyhow::Result<()>
where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(reason) => {
                warn!(line = %line, %reason, "Ignoring simulated reader input");
                continue;
            }
        };

        debug!(?command, "Simulated reader command");

        match command {
            SimCommand::Present(payload) => handle.present_payload(&payload).await?,
            SimCommand::Repoll(None) => handle.repoll().await?,
            SimCommand::Repoll(Some(payload)) => {
                handle.repoll_with(TagHandle::felica(payload.as_str())).await?
            }
            SimCommand::Unreadable => handle.present(unreadable_tag()?).await?,
            SimCommand::Remove => handle.remove().await?,
            SimCommand::Disconnect(reason) => handle.disconnect(reason).await?,
        }
    }

    debug!("Simulated reader input closed");
    Ok(())
}

fn unreadable_tag() -> anyhow::Result<TagHandle> {
    Ok(TagHandle::builder(CardFamily::FelicaStandard)
        .read_error(TagReadError::read_failed("simulated read failure"))
        .build()?)
}
