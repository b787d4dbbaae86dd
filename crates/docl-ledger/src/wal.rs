use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::records::Revision;

/// Flush/sync strategy for the WAL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every write.
    EveryWrite,
    /// Flush to the OS page cache only.
    #[default]
    #[serde(rename = "os")]
    OsDefault,
}

#[derive(Clone, Debug, Default)]
pub struct WalConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct WalWriter {
    file: File,
    /// End of the last complete frame.
    offset: u64,
    /// Set when a failed append could not be rolled back.
    broken: bool,
}

impl WalWriter {
    fn write_frame(&mut self, frame: &[u8], sync: bool) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        if sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Cut the file back to the end of the last complete frame.
    fn truncate_to_offset(&mut self) -> io::Result<()> {
        self.file.set_len(self.offset)
    }
}

/// Append-only revision log.
///
/// On-disk format, repeated per revision:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Revision)]
/// ```
///
/// Recovery reads front-to-back. A torn tail (short header or payload) ends
/// recovery and is truncated away; entries that fail their CRC are skipped.
/// A failed append truncates its partial frame, so every append starts on a
/// frame boundary.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    config: WalConfig,
}

impl WriteAheadLog {
    /// Open (or create) the log file at `path`.
    pub fn open(path: &Path, config: WalConfig) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter {
                file,
                offset,
                broken: false,
            }),
            config,
        })
    }

    /// Append one revision. Returns the byte offset of the entry.
    pub fn append(&self, revision: &Revision) -> LedgerResult<u64> {
        let payload =
            bincode::serialize(revision).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| LedgerError::Serialization("revision exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self.writer.lock().map_err(|_| LedgerError::poisoned("WAL"))?;
        if w.broken {
            return Err(LedgerError::StoreError(
                "WAL holds a partial frame; reopen the ledger".into(),
            ));
        }
        let entry_offset = w.offset;

        if let Err(e) = w.write_frame(&frame, self.config.sync_mode == SyncMode::EveryWrite) {
            if let Err(trunc) = w.truncate_to_offset() {
                warn!(offset = entry_offset, error = %trunc, "cannot roll back partial WAL frame");
                w.broken = true;
            }
            return Err(e.into());
        }
        w.offset += frame.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), "WAL append");
        Ok(entry_offset)
    }

    /// Read back every intact revision in write order.
    ///
    /// A torn tail is truncated so the next append follows the last
    /// complete frame.
    pub fn recover(&self) -> LedgerResult<Vec<Revision>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut revisions = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
                warn!(offset, length, file_len, "torn WAL entry; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            file.read_exact(&mut payload)?;
            offset += HEADER_SIZE as u64 + length as u64;

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping WAL entry"
                );
                continue;
            }

            match bincode::deserialize::<Revision>(&payload) {
                Ok(revision) => revisions.push(revision),
                Err(e) => warn!(offset, error = %e, "undecodable WAL entry; skipping"),
            }
        }

        if offset < file_len {
            let mut w = self.writer.lock().map_err(|_| LedgerError::poisoned("WAL"))?;
            w.offset = offset;
            w.truncate_to_offset()?;
            w.broken = false;
            warn!(offset, dropped = file_len - offset, "truncated torn WAL tail");
        }

        debug!(recovered = revisions.len(), "WAL recovery complete");
        Ok(revisions)
    }

    /// Current end-of-log offset.
    pub fn offset(&self) -> LedgerResult<u64> {
        Ok(self.writer.lock().map_err(|_| LedgerError::poisoned("WAL"))?.offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
