//! Frame sources
//!
//! Where newline-delimited frames come from. A Bluetooth serial bridge
//! (`/dev/rfcomm0`) and a USB serial adapter are both just device paths.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::TcpStream;
use std::path::PathBuf;

use super::IngestError;

const TCP_SCHEME: &str = "tcp://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
    Stdin,
    Tcp(String),
    Path(PathBuf),
}

impl FrameSource {
    /// `-` or `stdin`, `tcp://host:port`, anything else is a path
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == "-" || value.eq_ignore_ascii_case("stdin") {
            FrameSource::Stdin
        } else if let Some(addr) = value.strip_prefix(TCP_SCHEME) {
            FrameSource::Tcp(addr.to_string())
        } else {
            FrameSource::Path(PathBuf::from(value))
        }
    }

    /// Open for reading. Failure here is fatal for the process.
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>, IngestError> {
        let opened: io::Result<Box<dyn BufRead + Send>> = match self {
            FrameSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            FrameSource::Tcp(addr) => {
                TcpStream::connect(addr).map(|s| Box::new(BufReader::new(s)) as Box<dyn BufRead + Send>)
            }
            FrameSource::Path(path) => {
                File::open(path).map(|f| Box::new(BufReader::new(f)) as Box<dyn BufRead + Send>)
            }
        };

        let reader = opened.map_err(|source| IngestError::StreamOpen {
            target: self.to_string(),
            source,
        })?;
        log::info!("Frame source open: {}", self);
        Ok(reader)
    }
}

impl fmt::Display for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSource::Stdin => write!(f, "stdin"),
            FrameSource::Tcp(addr) => write!(f, "{}{}", TCP_SCHEME, addr),
            FrameSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
