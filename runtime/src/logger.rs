use net::StreamEvent;
use std::io::{self, Write};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging to stdout and mirror every line to the console viewers.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging(tx: broadcast::Sender<StreamEvent>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(move || TeeWriter {
            stdout: io::stdout(),
            tx: tx.clone(),
        })
        .try_init();
}

/// Writer that duplicates all output to the stream bus as screen lines.
pub struct TeeWriter {
    stdout: io::Stdout,
    tx: broadcast::Sender<StreamEvent>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.stdout.write(buf)?;
        if let Ok(s) = std::str::from_utf8(&buf[..n]) {
            let text = s.trim_end().to_string();
            if !text.is_empty() {
                let _ = self.tx.send(StreamEvent::ScreenLine { text });
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_forwards_lines() {
        let (tx, mut rx) = broadcast::channel(4);
        let mut writer = TeeWriter {
            stdout: io::stdout(),
            tx,
        };
        writer.write_all(b"INFO centring mechanism\n").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            StreamEvent::ScreenLine {
                text: "INFO centring mechanism".into()
            }
        );
    }
}
