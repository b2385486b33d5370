//! Configuration sources
//!
//! A [`ConfigurationSource`] is an open handle on configuration text, either a
//! character stream (already-decoded UTF-8 text) or a byte stream (raw bytes,
//! optionally starting with a UTF-8 byte order mark). The caller creates it
//! and hands it to the builder, which reads it through the parser and closes
//! it exactly once.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;
use types::ParseError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A readable handle that must be released explicitly
pub trait ConfigStream: Read + Send {
    /// Release the underlying handle
    fn close(&mut self) -> io::Result<()>;
}

/// Adapts any reader into a [`ConfigStream`]; closing drops the reader
pub struct ReaderStream<R> {
    inner: Option<R>,
}

impl<R> ReaderStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Some(reader),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R: Read> Read for ReaderStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(reader) => reader.read(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "stream closed")),
        }
    }
}

impl<R: Read + Send> ConfigStream for ReaderStream<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner = None;
        Ok(())
    }
}

/// Which kind of stream a source wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Characters,
    Bytes,
}

/// Where a configuration comes from
pub enum ConfigurationSource {
    /// UTF-8 text
    Characters {
        description: String,
        stream: Box<dyn ConfigStream>,
    },
    /// Raw bytes, decoded as UTF-8 after an optional byte order mark
    Bytes {
        description: String,
        stream: Box<dyn ConfigStream>,
    },
}

impl ConfigurationSource {
    /// Character stream over a reader
    pub fn characters<R>(description: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::from_stream(SourceKind::Characters, description, Box::new(ReaderStream::new(reader)))
    }

    /// Byte stream over a reader
    pub fn bytes<R>(description: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::from_stream(SourceKind::Bytes, description, Box::new(ReaderStream::new(reader)))
    }

    /// Character stream over in-memory text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::characters("<string>", Cursor::new(text.into()))
    }

    /// Byte stream over a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::bytes(path.display().to_string(), BufReader::new(file)))
    }

    /// Wrap a caller-supplied stream
    pub fn from_stream(
        kind: SourceKind,
        description: impl Into<String>,
        stream: Box<dyn ConfigStream>,
    ) -> Self {
        let description = description.into();
        match kind {
            SourceKind::Characters => Self::Characters {
                description,
                stream,
            },
            SourceKind::Bytes => Self::Bytes {
                description,
                stream,
            },
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Characters { .. } => SourceKind::Characters,
            Self::Bytes { .. } => SourceKind::Bytes,
        }
    }

    /// Human-readable origin, used in diagnostics
    pub fn description(&self) -> &str {
        match self {
            Self::Characters { description, .. } | Self::Bytes { description, .. } => description,
        }
    }

    /// Read the whole source as text
    pub fn read_to_text(&mut self) -> Result<String, ParseError> {
        match self {
            Self::Characters {
                description,
                stream,
            } => {
                let mut text = String::new();
                stream
                    .read_to_string(&mut text)
                    .map_err(|source| io_error(description, source))?;
                Ok(text)
            }
            Self::Bytes {
                description,
                stream,
            } => {
                let mut bytes = Vec::new();
                stream
                    .read_to_end(&mut bytes)
                    .map_err(|source| io_error(description, source))?;

                if bytes.starts_with(UTF8_BOM) {
                    bytes.drain(..UTF8_BOM.len());
                }
                String::from_utf8(bytes).map_err(|e| {
                    io_error(description, io::Error::new(io::ErrorKind::InvalidData, e))
                })
            }
        }
    }

    /// Release the stream. Only the builder calls this, once per build.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        match self {
            Self::Characters { stream, .. } | Self::Bytes { stream, .. } => stream.close(),
        }
    }
}

impl fmt::Debug for ConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationSource")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish_non_exhaustive()
    }
}

fn io_error(resource: &str, source: io::Error) -> ParseError {
    ParseError::Io {
        resource: resource.to_string(),
        source,
    }
}
