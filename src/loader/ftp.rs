//! Just enough FTP to download one file: anonymous (or URL-supplied) login, binary mode, passive
//! data connection and `RETR`.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

use log::debug;
use url::Url;

use super::RetrievalError;

const DEFAULT_PORT: u16 = 21;

/// Bounds every connect, read and write on both connections.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Connects to the first reachable address and applies `timeout` to the stream.
fn connect(addresses: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for address in addresses {
        match TcpStream::connect_timeout(address, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "the host has no addresses")
    }))
}

struct ControlConnection<'u> {
    url: &'u Url,
    timeout: Duration,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl<'u> ControlConnection<'u> {
    fn connect(url: &'u Url, timeout: Duration) -> Result<Self, RetrievalError> {
        let addresses = url.socket_addrs(|| Some(DEFAULT_PORT))?;
        let stream = connect(&addresses, timeout)?;
        Ok(Self {
            url,
            timeout,
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        })
    }

    fn failure(&self, message: impl Into<String>) -> RetrievalError {
        RetrievalError::Ftp {
            url: self.url.to_string(),
            message: message.into(),
        }
    }

    /// Reads one reply, joining the lines of multi-line replies.
    fn reply(&mut self) -> Result<(u16, String), RetrievalError> {
        let mut text = String::new();
        let mut code = None;
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(self.failure("connection closed by server"));
            }
            let line = line.trim_end();
            let line_code = line.get(..3).and_then(|code| code.parse::<u16>().ok());
            let first = code.is_none();
            if first {
                code = Some(line_code.ok_or_else(|| self.failure(format!("bad reply {line:?}")))?);
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(line);
            // The last line repeats the code followed by a space
            if line_code == code && line.as_bytes().get(3) != Some(&b'-') {
                break;
            }
        }
        let code = code.ok_or_else(|| self.failure("empty reply"))?;
        Ok((code, text))
    }

    fn expect(&mut self, accepted: &[u16]) -> Result<(u16, String), RetrievalError> {
        let (code, text) = self.reply()?;
        if !accepted.contains(&code) {
            return Err(self.failure(text));
        }
        Ok((code, text))
    }

    fn command(&mut self, command: &str, accepted: &[u16]) -> Result<(u16, String), RetrievalError> {
        write!(self.writer, "{command}\r\n")?;
        self.writer.flush()?;
        self.expect(accepted)
    }
}

/// Downloads the file `url` points to. A server that stalls for longer than 30 seconds fails the
/// transfer with an I/O error.
pub(super) fn retrieve(url: &Url) -> Result<Vec<u8>, RetrievalError> {
    retrieve_with_timeout(url, TIMEOUT)
}

fn retrieve_with_timeout(url: &Url, timeout: Duration) -> Result<Vec<u8>, RetrievalError> {
    let mut control = ControlConnection::connect(url, timeout)?;
    control.expect(&[220])?;

    let user = match url.username() {
        "" => "anonymous",
        user => user,
    };
    let (code, _) = control.command(&format!("USER {user}"), &[230, 331])?;
    if code == 331 {
        let password = url.password().unwrap_or("anonymous@");
        control.command(&format!("PASS {password}"), &[230, 202])?;
    }
    control.command("TYPE I", &[200])?;

    let (_, passive) = control.command("PASV", &[227])?;
    let data_address = parse_passive_reply(&passive)
        .ok_or_else(|| control.failure(format!("cannot parse {passive:?}")))?;
    debug!("opening FTP data connection to {data_address}");
    let mut data = connect(&[data_address], control.timeout)?;

    let path = url.path().trim_start_matches('/');
    control.command(&format!("RETR {path}"), &[125, 150])?;
    let mut contents = Vec::new();
    data.read_to_end(&mut contents)?;
    drop(data);
    control.expect(&[226, 250])?;

    // The transfer is complete; a failing QUIT changes nothing
    if let Err(error) = control.command("QUIT", &[221]) {
        debug!("FTP QUIT failed: {error}");
    }
    Ok(contents)
}

/// Extracts the data address from `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`.
fn parse_passive_reply(reply: &str) -> Option<SocketAddr> {
    let start = reply.find('(')? + 1;
    let end = start + reply[start..].find(')')?;
    let numbers = reply[start..end]
        .split(',')
        .map(|number| number.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    match numbers.as_slice() {
        &[h1, h2, h3, h4, p1, p2] => Some(SocketAddr::from((
            Ipv4Addr::new(h1, h2, h3, h4),
            u16::from_be_bytes([p1, p2]),
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passive_replies() {
        assert_eq!(
            parse_passive_reply("227 Entering Passive Mode (192,168,1,2,19,137)"),
            Some(SocketAddr::from(([192, 168, 1, 2], 19 * 256 + 137)))
        );
        assert_eq!(
            parse_passive_reply("227 Entering Passive Mode (10, 0, 0, 1, 0, 21)."),
            Some(SocketAddr::from(([10, 0, 0, 1], 21)))
        );
        assert_eq!(parse_passive_reply("227 Entering Passive Mode"), None);
        assert_eq!(parse_passive_reply("227 (1,2,3,4,5)"), None);
        assert_eq!(parse_passive_reply("227 (1,2,3,4,5,256)"), None);
    }

    #[test]
    fn silent_servers_time_out() {
        // the handshake completes through the backlog, but no greeting is ever sent
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = Url::parse(&format!("ftp://127.0.0.1:{port}/a.witx")).unwrap();

        let started = std::time::Instant::now();
        let result = retrieve_with_timeout(&url, Duration::from_millis(200));
        assert!(matches!(result, Err(RetrievalError::Io(_))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
        drop(listener);
    }
}
