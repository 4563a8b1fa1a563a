//! Stdio bridge between a front end and the match runner

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::game::input::SharedInput;
use crate::game::r#match::{LifecycleCommand, MatchHandle};
use crate::host::keymap::Keymap;
use crate::host::protocol::{HostMsg, ServerMsg};

/// Serve the match over stdin/stdout until stdin closes or `quit` arrives
pub async fn run_stdio(handle: MatchHandle, keymap: Keymap) -> anyhow::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    run_session(handle, keymap, reader, tokio::io::stdout()).await
}

/// Run one front-end session with split read/write
pub async fn run_session<R, W>(
    handle: MatchHandle,
    keymap: Keymap,
    mut reader: R,
    writer: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    info!(match_id = %handle.id, "Front-end session opened");

    // Spawn writer task: broadcast messages -> front end
    let snapshot_rx = handle.subscribe();
    let writer_handle = tokio::spawn(forward_messages(snapshot_rx, writer));

    // Reader loop: front end -> input state and lifecycle commands.
    // Raw bytes so a line that is not UTF-8 is rejected rather than fatal.
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                reject(&handle, e.to_string());
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostMsg>(line) {
            Ok(msg) => {
                let Some(command) = dispatch(&handle.input, &keymap, msg) else {
                    continue;
                };
                if !handle.send(command).await {
                    debug!(match_id = %handle.id, "Command channel closed");
                    break;
                }
                if command == LifecycleCommand::Quit {
                    break;
                }
            }
            Err(e) => reject(&handle, e.to_string()),
        }
    }

    // Input closed or quit requested: stop the runner and let the writer drain
    let match_id = handle.id;
    let _ = handle.send(LifecycleCommand::Quit).await;
    drop(handle);
    writer_handle.await??;

    info!(match_id = %match_id, "Front-end session closed");
    Ok(())
}

/// Apply a host message to the shared input; lifecycle messages are
/// returned for the runner
pub fn dispatch(input: &SharedInput, keymap: &Keymap, msg: HostMsg) -> Option<LifecycleCommand> {
    match msg {
        HostMsg::KeyDown { key } => {
            press(input, keymap, &key, true);
            None
        }
        HostMsg::KeyUp { key } => {
            press(input, keymap, &key, false);
            None
        }
        HostMsg::Start => Some(LifecycleCommand::Start),
        HostMsg::Rematch => Some(LifecycleCommand::Rematch),
        HostMsg::Quit => Some(LifecycleCommand::Quit),
    }
}

/// Log a malformed line and answer it with an error message
fn reject(handle: &MatchHandle, message: String) {
    warn!(match_id = %handle.id, error = %message, "Failed to parse host message");
    let _ = handle.snapshot_tx.send(ServerMsg::Error {
        code: "bad_message".to_string(),
        message,
    });
}

fn press(input: &SharedInput, keymap: &Keymap, key: &str, held: bool) {
    match keymap.resolve(key) {
        Some((slot, action)) => input.set(slot, action, held),
        None => debug!(key, "Ignoring unbound key"),
    }
}

async fn forward_messages<W>(
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
    mut writer: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match snapshot_rx.recv().await {
            Ok(msg) => write_msg(&mut writer, &msg).await?,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_count = n, "Front end lagged, skipping {} messages", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Message channel closed");
                return Ok(());
            }
        }
    }
}

/// Write one message as a JSON line
async fn write_msg<W>(writer: &mut W, msg: &ServerMsg) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(msg)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
