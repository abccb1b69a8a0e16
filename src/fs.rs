//! Persisting encoded messages.
//!
//! A file holds the raw output of [`Codec::encode`]: no header and no checksum. Reading one
//! back requires knowing its message type.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::codec::Codec;
use crate::descriptor::MessageDescriptor;
use crate::error::Result;
use crate::message::Message;

/// Whole-file reads and writes.
pub trait FileSystem: Debug + Send + Sync {
    /// Read the entire file at `path`.
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate the file at `path` and write `bytes` to it. Not atomic.
    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// The local filesystem, through `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }
}

/// Encode `msg` and write it to `path`.
pub fn write_message(
    fs: &dyn FileSystem,
    path: &Path,
    codec: &Codec,
    msg: &Message,
) -> Result<()> {
    let bytes = codec.encode(msg);
    fs.write_all(path, &bytes)?;
    debug!(
        path = %path.display(),
        message = msg.type_name(),
        bytes = bytes.len(),
        "wrote message"
    );
    Ok(())
}

/// Read `path` and decode it as a message of type `descriptor`.
pub fn read_message(
    fs: &dyn FileSystem,
    path: &Path,
    codec: &Codec,
    descriptor: &Arc<MessageDescriptor>,
) -> Result<Message> {
    let bytes = fs.read_all(path)?;
    debug!(
        path = %path.display(),
        message = descriptor.name(),
        bytes = bytes.len(),
        "read message"
    );
    Ok(codec.decode(&bytes, descriptor)?)
}
