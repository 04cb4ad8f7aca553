// Append-only JSON-lines journal of committed sample batches
use crate::domain::sample::HealthSample;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const WRITE_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
struct BatchLine {
    samples: Vec<HealthSample>,
}

/// One line per committed batch, so a batch is either fully on disk or,
/// after a crash mid-write, a torn final line that replay drops.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
    committed_len: u64,
}

struct Replay {
    batches: Vec<Vec<HealthSample>>,
    valid_len: u64,
    // The last kept batch is missing its newline.
    unterminated: bool,
}

impl Journal {
    /// Open (creating if needed) the journal and return every batch it holds.
    pub async fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<Vec<HealthSample>>)> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create journal directory {}", parent.display()))?;
        }

        let replay = Self::replay(&path).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open journal {}", path.display()))?;

        let on_disk = file.metadata().await?.len();
        if on_disk > replay.valid_len {
            file.set_len(replay.valid_len)
                .await
                .with_context(|| format!("Failed to truncate journal {}", path.display()))?;
        }

        let mut journal = Self {
            path,
            file,
            committed_len: replay.valid_len,
        };
        if replay.unterminated {
            journal.write_line(b"\n").await?;
            journal.committed_len += 1;
        }
        Ok((journal, replay.batches))
    }

    async fn replay(path: &Path) -> Result<Replay> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Replay {
                    batches: Vec::new(),
                    valid_len: 0,
                    unterminated: false,
                })
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read journal {}", path.display()))
            }
        };

        // Lines are read as raw bytes: a torn write may split a UTF-8 sequence.
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        let mut batches = Vec::new();
        let mut pending_error: Option<(usize, serde_json::Error)> = None;
        let mut line_no = 0;
        let mut valid_len = 0_u64;
        let mut unterminated = false;

        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .await
                .with_context(|| format!("Failed to read journal {}", path.display()))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            let terminated = raw.last() == Some(&b'\n');
            let line = raw.strip_suffix(b"\n").unwrap_or(&raw[..]);

            if line.iter().all(u8::is_ascii_whitespace) {
                if pending_error.is_none() && terminated {
                    valid_len += read as u64;
                }
                continue;
            }
            // A bad line is only tolerable as the very last one.
            if let Some((bad_line, e)) = pending_error.take() {
                anyhow::bail!("Journal {} corrupt at line {}: {}", path.display(), bad_line, e);
            }
            match serde_json::from_slice::<BatchLine>(line) {
                Ok(batch) => {
                    valid_len += read as u64;
                    unterminated = !terminated;
                    batches.push(batch.samples);
                }
                Err(e) => pending_error = Some((line_no, e)),
            }
        }

        if let Some((bad_line, e)) = pending_error {
            tracing::warn!(
                "Dropping torn final batch at line {} of {}: {}",
                bad_line,
                path.display(),
                e
            );
        }

        Ok(Replay {
            batches,
            valid_len,
            unterminated,
        })
    }

    /// Write one batch and flush it to disk before returning. On failure the
    /// file is cut back to the last committed batch.
    pub async fn append(&mut self, batch: &[HealthSample]) -> Result<()> {
        match self.write_batch(batch).await {
            Ok(written) => {
                self.committed_len += written;
                Ok(())
            }
            Err(e) => {
                if let Err(truncate_err) = self.file.set_len(self.committed_len).await {
                    tracing::error!(
                        "Failed to roll back journal {}: {}",
                        self.path.display(),
                        truncate_err
                    );
                }
                Err(e)
            }
        }
    }

    // Encodes one sample at a time so a large upload is never held twice in memory.
    async fn write_batch(&mut self, batch: &[HealthSample]) -> Result<u64> {
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, &mut self.file);
        let mut encoded = Vec::new();
        let mut written = 0_u64;

        writer.write_all(b"{\"samples\":[").await?;
        written += 12;
        for (i, sample) in batch.iter().enumerate() {
            encoded.clear();
            if i > 0 {
                encoded.push(b',');
            }
            serde_json::to_writer(&mut encoded, sample)
                .context("Failed to serialize sample batch")?;
            writer
                .write_all(&encoded)
                .await
                .with_context(|| format!("Failed to write journal {}", self.path.display()))?;
            written += encoded.len() as u64;
        }
        writer.write_all(b"]}\n").await?;
        written += 3;

        writer
            .flush()
            .await
            .with_context(|| format!("Failed to flush journal {}", self.path.display()))?;
        drop(writer);
        self.file
            .sync_data()
            .await
            .with_context(|| format!("Failed to sync journal {}", self.path.display()))?;
        Ok(written)
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.file
            .write_all(line)
            .await
            .with_context(|| format!("Failed to write journal {}", self.path.display()))?;
        self.file
            .flush()
            .await
            .with_context(|| format!("Failed to flush journal {}", self.path.display()))?;
        self.file
            .sync_data()
            .await
            .with_context(|| format!("Failed to sync journal {}", self.path.display()))?;
        Ok(())
    }
}
