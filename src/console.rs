// gSENSOR - Serial Console
//
// Two helper threads sit between the main loop and the UART:
//
//   writer: drains a bounded queue of debug lines to the port. The loop only
//           ever `try_send`s, so a slow host drops lines instead of stalling
//           sampling.
//   reader: feeds incoming bytes through `CommandParser` and forwards the
//           resulting commands over a channel the loop polls.

use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::board::{CommandSource, DebugStream};
use crate::commands::CommandParser;
use crate::config::*;
use crate::events::Command;

const READ_RETRY: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Loop-side handle of the debug line queue.
pub struct SerialStream {
    tx: SyncSender<String>,
    dropped: u32,
}

impl DebugStream for SerialStream {
    fn write_line(&mut self, line: &str) {
        match self.tx.try_send(line.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped = self.dropped.wrapping_add(1);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Serial writer gone - debug line lost");
            }
        }
    }

    /// Lines discarded because the queue was full.
    fn dropped_lines(&self) -> u32 {
        self.dropped
    }
}

pub fn spawn_writer<W>(mut port: W) -> anyhow::Result<(SerialStream, JoinHandle<()>)>
where
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<String>(SERIAL_QUEUE_DEPTH);

    let handle = thread::Builder::new()
        .name("serial-tx".into())
        .stack_size(STACK_SERIAL_WRITER)
        .spawn(move || {
            // Ends when the SerialStream is dropped.
            for line in rx {
                let written = port
                    .write_all(line.as_bytes())
                    .and_then(|_| port.write_all(b"\n"))
                    .and_then(|_| port.flush());
                if let Err(e) = written {
                    log::warn!("Serial write failed: {}", e);
                }
            }
        })?;

    Ok((SerialStream { tx, dropped: 0 }, handle))
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Loop-side end of the command channel.
pub struct SerialCommands {
    rx: Receiver<Command>,
}

impl CommandSource for SerialCommands {
    fn poll_command(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

pub fn spawn_reader<R>(mut port: R) -> anyhow::Result<(SerialCommands, JoinHandle<()>)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name("serial-rx".into())
        .stack_size(STACK_SERIAL_READER)
        .spawn(move || {
            let mut parser = CommandParser::new();
            let mut chunk = [0u8; SERIAL_CHUNK_BYTES];
            loop {
                let n = match port.read(&mut chunk) {
                    Ok(0) => {
                        thread::sleep(READ_RETRY);
                        continue;
                    }
                    Ok(n) => n,
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                        thread::sleep(READ_RETRY);
                        continue;
                    }
                    Err(e) => {
                        log::error!("Serial read failed, console input disabled: {}", e);
                        return;
                    }
                };

                for &byte in &chunk[..n] {
                    match parser.feed(byte) {
                        Ok(Some(command)) => {
                            if tx.send(command).is_err() {
                                // Main loop dropped its end.
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => log::warn!("{}", e),
                    }
                }
            }
        })?;

    Ok((SerialCommands { rx }, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SampleRate;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Blocks until the test releases it, so the queue can fill up.
    struct GatedSink {
        gate: Arc<Mutex<()>>,
    }

    impl Write for GatedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let _held = self.gate.lock().unwrap();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_emits_newline_terminated_lines() {
        let sink = SharedSink::default();
        let (mut stream, handle) = spawn_writer(sink.clone()).unwrap();
        stream.write_line("1,0.000,0.000,1.000,1.000,1.000");
        stream.write_line("Peak reset");
        drop(stream);
        handle.join().unwrap();

        let out = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "1,0.000,0.000,1.000,1.000,1.000\nPeak reset\n");
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();
        let (mut stream, handle) = spawn_writer(GatedSink { gate: gate.clone() }).unwrap();

        let started = Instant::now();
        for i in 0..(SERIAL_QUEUE_DEPTH * 4) {
            stream.write_line(&i.to_string());
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(stream.dropped_lines() > 0);

        drop(held);
        drop(stream);
        handle.join().unwrap();
    }

    #[test]
    fn reader_forwards_parsed_commands() {
        // Cursor hits EOF after the script, which the reader treats as idle.
        let (mut commands, _handle) = spawn_reader(Cursor::new(b"r\ns2\nsx?n10\n".to_vec())).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut got = Vec::new();
        while got.len() < 4 && Instant::now() < deadline {
            match commands.poll_command() {
                Some(c) => got.push(c),
                None => thread::sleep(Duration::from_millis(1)),
            }
        }

        assert_eq!(
            got,
            vec![
                Command::ResetPeak,
                Command::SetSampleRate(SampleRate::Hz200),
                Command::Status,
                Command::SetNotifyRate(10)
            ]
        );
    }
}
