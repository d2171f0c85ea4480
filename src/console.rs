//! Console input
//!
//! Reads user submissions line by line (stdin in the daemon) and hands
//! them to the dialogue controller.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::session::KioskInput;

/// Forward every line of `reader` as a submission.
///
/// Returns the number of lines forwarded once the reader is exhausted or
/// the controller has gone away.
pub async fn forward_lines<R>(reader: R, inputs: mpsc::Sender<KioskInput>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        if inputs.send(KioskInput::Submit(line)).await.is_err() {
            debug!("dialogue controller gone, console reader stopping");
            break;
        }
        forwarded += 1;
    }

    info!(forwarded, "console input closed");
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_each_line() {
        let (tx, mut rx) = mpsc::channel(8);
        let input: &[u8] = b"12345\n555-1234\ntell me about phishing\n";

        let forwarded = forward_lines(input, tx).await.unwrap();
        assert_eq!(forwarded, 3);

        assert_eq!(rx.recv().await, Some(KioskInput::Submit("12345".to_string())));
        assert_eq!(rx.recv().await, Some(KioskInput::Submit("555-1234".to_string())));
        assert_eq!(
            rx.recv().await,
            Some(KioskInput::Submit("tell me about phishing".to_string()))
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stops_when_controller_gone() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let input: &[u8] = b"one\ntwo\n";
        assert_eq!(forward_lines(input, tx).await.unwrap(), 0);
    }
}
