//! Buffered control-port connection to the Tor daemon.
//!
//! [`ControlSocket`] owns the TCP connection to Tor's control port and
//! implements the request/reply exchange: commands go out CRLF-terminated,
//! replies come back as a sequence of mid/data lines closed by an end line
//! (see [`crate::protocol`] for the grammar).
//!
//! # Reply collapsing
//!
//! Replies are collapsed into a single string the way downstream parsers
//! expect:
//!
//! - mid (`-`) and end (space) line texts are joined with `\n`;
//! - a data (`+`) line's dot-terminated block is appended to its header
//!   line with the block's lines joined by `,`, so
//!
//! ```text
//! 250+config-text=
//! alpha
//! beta
//! .
//! 250 OK
//! ```
//!
//! parses to `config-text=alpha,beta\nOK`.
//!
//! # Error draining
//!
//! After every reply read, successful or not, any bytes still sitting in
//! the read buffer are discarded. When a reply fails mid-stream (for
//! example an unexpected status code on a continuation line) the remaining
//! lines of that reply would otherwise be delivered to the *next* command,
//! desynchronizing the connection for good.

use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

use crate::protocol::ReplyLine;
use crate::Error;

/// The status code Tor uses for a successful request.
pub const CODE_OK: u16 = 250;

/// A connected, buffered control-port socket.
///
/// The socket itself is not synchronized; [`crate::TorController`] wraps
/// it in a mutex so at most one command is in flight per connection.
pub struct ControlSocket {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ControlSocket {
    /// Opens a TCP connection to the control port at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Sends a single command line, appending the CRLF terminator.
    pub async fn send_command(&mut self, command: &str) -> Result<(), Error> {
        trace!(command, "sending control command");
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads one full reply, requiring every line to carry `expected`.
    ///
    /// See [`read_reply`] for the grammar and error semantics.
    pub async fn read_reply(&mut self, expected: u16) -> Result<String, Error> {
        read_reply(&mut self.reader, expected).await
    }

    /// Sends `command` and reads its reply, expecting status 250.
    pub async fn command(&mut self, command: &str) -> Result<String, Error> {
        self.send_command(command).await?;
        self.read_reply(CODE_OK).await
    }
}

/// Reads one reply from `reader`, collapsing it into a single string.
///
/// Every line's status code must equal `expected`; the first mismatch
/// fails the whole reply with [`Error::UnexpectedCode`], even when the
/// mismatch is on a mid line. Whatever text was collected up to that point
/// rides along in the error so the daemon's message is not lost.
///
/// Any bytes still buffered when the reply ends, cleanly or not, are
/// discarded before returning, so the next reply read starts from a clean
/// buffer.
pub async fn read_reply<R>(reader: &mut BufReader<R>, expected: u16) -> Result<String, Error>
where
    R: AsyncRead + Unpin,
{
    let result = read_reply_lines(reader, expected).await;

    let buffered = reader.buffer().len();
    if buffered > 0 {
        trace!(bytes = buffered, "discarding buffered reply bytes");
        Pin::new(reader).consume(buffered);
    }

    result
}

async fn read_reply_lines<R>(reader: &mut BufReader<R>, expected: u16) -> Result<String, Error>
where
    R: AsyncRead + Unpin,
{
    let mut reply = String::new();
    let mut has_more_lines = true;

    while has_more_lines {
        let line = read_crlf_line(reader).await?;
        trace!(line = %line, "reading reply line");

        let parsed = ReplyLine::parse(&line)?;

        match parsed.separator {
            // EndReplyLine: StatusCode SP ReplyLine.
            ' ' => {
                reply.push_str(&parsed.text);
                has_more_lines = false;
            }

            // MidReplyLine: StatusCode "-" ReplyLine.
            '-' => {
                reply.push_str(&parsed.text);
            }

            // DataReplyLine: StatusCode "+" ReplyLine CmdData. The block
            // lines are joined with "," onto the header, so
            // `config-text=` followed by `alpha`, `beta` becomes
            // `config-text=alpha,beta`.
            '+' => {
                reply.push_str(&parsed.text);
                let block = read_dot_block(reader).await?;
                reply.push_str(&block.join(","));
            }

            _ => {
                return Err(Error::InvalidLinePrefix(line));
            }
        }

        // Checked after the line text is collected so the error carries
        // whatever the daemon said on the offending line.
        if parsed.code != expected {
            return Err(Error::UnexpectedCode {
                code: parsed.code,
                reply,
            });
        }

        if has_more_lines {
            reply.push('\n');
        }
    }

    Ok(reply)
}

/// Reads one CRLF-terminated line, stripped of its terminator.
async fn read_crlf_line<R>(reader: &mut BufReader<R>) -> Result<String, Error>
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(Error::ConnectionClosed);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

/// Reads a dot-terminated data block, undoing dot-stuffing.
async fn read_dot_block<R>(reader: &mut BufReader<R>) -> Result<Vec<String>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let line = read_crlf_line(reader).await?;
        if line == "." {
            return Ok(lines);
        }
        let line = line.strip_prefix('.').map(str::to_string).unwrap_or(line);
        lines.push(line);
    }
}
