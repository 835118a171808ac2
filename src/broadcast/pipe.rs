//! Single-writer, multi-reader broadcast pipe
//!
//! One write-endpoint fans out to `n` independent read-endpoints, each backed
//! by its own in-memory pipe lane. A write is complete only once the chunk
//! has been forwarded to every lane, so throughput is bounded by the slowest
//! consumer. That is the intended back-pressure trade-off: consumers never
//! corrupt each other's view of the stream, and the producer never buffers
//! more than one lane's worth of data.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadBuf};

use super::error::{BroadcastError, LaneFault};

/// Default per-lane buffer size
///
/// Small on purpose. A stalled consumer should push back on the writer after
/// a few chunks rather than let data pile up in memory.
pub const DEFAULT_PIPE_BUFFER: usize = 8 * 1024;

/// Chunk size used by [`broadcast_copy`]
const COPY_CHUNK_SIZE: usize = 16 * 1024;

struct Lane {
    index: usize,
    tx: DuplexStream,
}

/// Result of one accepted write
///
/// `accepted` always equals the length of the submitted chunk; a failed lane
/// is surfaced through `fault` instead of a short write, so the producer is
/// free to keep draining its source while the fault is handled out of band.
#[derive(Debug)]
pub struct WriteReport {
    /// Bytes accepted from the producer (always the full chunk)
    pub accepted: usize,
    /// First per-lane failure encountered, if any
    pub fault: Option<LaneFault>,
}

impl WriteReport {
    /// Whether every lane accepted the chunk
    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
    }
}

/// The write-endpoint of a broadcast pipe
///
/// Exclusive access is enforced by ownership: `write` and `close` take
/// `&mut self`, so they cannot race. Writing after `close` fails with
/// [`BroadcastError::Closed`] rather than blocking or panicking.
pub struct BroadcastWriter {
    lanes: Vec<Lane>,
    closed: bool,
}

impl BroadcastWriter {
    /// Forward a chunk to every lane
    ///
    /// A stalled lane blocks the call until its reader drains or drops. A
    /// failed lane does not abort the remaining forwards; the first failure
    /// is reported in the returned [`WriteReport`] while the chunk is still
    /// counted as fully accepted.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<WriteReport, BroadcastError> {
        if self.closed {
            return Err(BroadcastError::Closed);
        }

        let mut fault: Option<LaneFault> = None;
        for lane in &mut self.lanes {
            if let Err(e) = lane.tx.write_all(chunk).await {
                if fault.is_none() {
                    fault = Some(LaneFault::new(lane.index, e));
                }
            }
        }

        Ok(WriteReport {
            accepted: chunk.len(),
            fault,
        })
    }

    /// Close the write-endpoint
    ///
    /// Idempotent. Every lane is shut down exactly once even if an earlier
    /// lane fails; the first failure is returned after all lanes were
    /// attempted. Readers observe end-of-stream once their buffered bytes
    /// are drained.
    pub async fn close(&mut self) -> Result<(), BroadcastError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first: Option<LaneFault> = None;
        for lane in &mut self.lanes {
            if let Err(e) = lane.tx.shutdown().await {
                if first.is_none() {
                    first = Some(LaneFault::new(lane.index, e));
                }
            }
        }

        match first {
            Some(fault) => Err(BroadcastError::Lane(fault)),
            None => Ok(()),
        }
    }

    /// Whether the write-endpoint has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of lanes this writer fans out to
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}

/// One read-endpoint of a broadcast pipe
///
/// Implements [`AsyncRead`]. Closing (or dropping) a reader affects only its
/// own lane: subsequent writes report a fault for this lane while siblings
/// keep receiving data.
pub struct BroadcastReader {
    lane: usize,
    inner: DuplexStream,
}

impl BroadcastReader {
    /// Index of the lane this reader drains
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Close this read-endpoint
    ///
    /// Equivalent to dropping the reader.
    pub fn close(self) {}
}

impl AsyncRead for BroadcastReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Create a broadcast pipe with `n` read-endpoints and the default buffer
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn broadcast_pipe(n: usize) -> (BroadcastWriter, Vec<BroadcastReader>) {
    broadcast_pipe_with(n, DEFAULT_PIPE_BUFFER)
}

/// Create a broadcast pipe with `n` read-endpoints and a per-lane buffer size
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn broadcast_pipe_with(n: usize, buffer: usize) -> (BroadcastWriter, Vec<BroadcastReader>) {
    assert!(n >= 1, "broadcast pipe needs at least one reader");

    let mut lanes = Vec::with_capacity(n);
    let mut readers = Vec::with_capacity(n);

    for index in 0..n {
        let (tx, rx) = duplex(buffer);
        lanes.push(Lane { index, tx });
        readers.push(BroadcastReader { lane: index, inner: rx });
    }

    (BroadcastWriter { lanes, closed: false }, readers)
}

/// Create a two-reader broadcast pipe
///
/// Convenience for the common archive-plus-extract fan-out.
pub fn broadcast_pair(buffer: usize) -> (BroadcastWriter, BroadcastReader, BroadcastReader) {
    let (tx_a, rx_a) = duplex(buffer);
    let (tx_b, rx_b) = duplex(buffer);

    let writer = BroadcastWriter {
        lanes: vec![Lane { index: 0, tx: tx_a }, Lane { index: 1, tx: tx_b }],
        closed: false,
    };

    (
        writer,
        BroadcastReader { lane: 0, inner: rx_a },
        BroadcastReader { lane: 1, inner: rx_b },
    )
}

/// Drain a source stream into a broadcast writer
///
/// The copy-task body: reads the source chunk by chunk and forwards each
/// chunk to every lane. Lane faults are logged and pumping continues so the
/// producer drains its source even when a consumer died early. Stops with an
/// error when the source fails mid-read or the writer was already closed.
///
/// The caller is responsible for closing the writer afterwards, on every
/// exit path.
pub async fn broadcast_copy<S>(source: &mut S, writer: &mut BroadcastWriter) -> io::Result<u64>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(COPY_CHUNK_SIZE);
    let mut copied: u64 = 0;

    loop {
        buf.clear();
        let n = source.read_buf(&mut buf).await?;
        if n == 0 {
            return Ok(copied);
        }

        match writer.write(&buf[..n]).await {
            Ok(report) => {
                copied += report.accepted as u64;
                if let Some(fault) = report.fault {
                    tracing::warn!(
                        lane = fault.lane,
                        error = %fault.error,
                        "broadcast lane write failed, continuing with remaining lanes"
                    );
                }
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::BrokenPipe, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::time::timeout;

    use super::*;

    async fn drain(mut reader: BroadcastReader) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    /// Source that yields `remaining` bytes of 0xAB, then fails
    struct FailingSource {
        remaining: usize,
    }

    impl AsyncRead for FailingSource {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "sensor feed dropped")));
            }
            let n = self.remaining.min(buf.remaining());
            buf.put_slice(&vec![0xAB; n]);
            self.remaining -= n;
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_fanout_identical_copies() {
        for n in 1..=3 {
            let (mut writer, readers) = broadcast_pipe(n);
            let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

            let chunks = payload.clone();
            let writer_task = tokio::spawn(async move {
                for chunk in chunks.chunks(1000) {
                    let report = writer.write(chunk).await.unwrap();
                    assert_eq!(report.accepted, chunk.len());
                    assert!(report.is_clean());
                }
                writer.close().await.unwrap();
            });

            let mut handles = Vec::new();
            for reader in readers {
                handles.push(tokio::spawn(drain(reader)));
            }
            for handle in handles {
                assert_eq!(handle.await.unwrap(), payload);
            }
            writer_task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_close_signals_eof_after_buffered_bytes() {
        let (mut writer, readers) = broadcast_pipe(2);

        writer.write(b"tail bytes").await.unwrap();
        writer.close().await.unwrap();

        for reader in readers {
            assert_eq!(drain(reader).await, b"tail bytes");
        }
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let (mut writer, readers) = broadcast_pipe(2);

        writer.write(b"abc").await.unwrap();
        writer.close().await.unwrap();
        // Close is idempotent
        writer.close().await.unwrap();
        assert!(writer.is_closed());

        let err = writer.write(b"more").await.unwrap_err();
        assert!(matches!(err, BroadcastError::Closed));

        // Nothing partial leaked into the lanes
        for reader in readers {
            assert_eq!(drain(reader).await, b"abc");
        }
    }

    #[tokio::test]
    async fn test_early_reader_close_keeps_survivors_alive() {
        timeout(Duration::from_secs(5), async {
            let (mut writer, mut readers) = broadcast_pipe(2);
            let survivor = readers.pop().unwrap();
            let early = readers.pop().unwrap();
            assert_eq!(early.lane(), 0);

            writer.write(b"first").await.unwrap();
            early.close();

            // The dead lane faults, the survivor keeps receiving, the chunk
            // is still reported fully accepted.
            let report = writer.write(b" second").await.unwrap();
            assert_eq!(report.accepted, 7);
            let fault = report.fault.expect("dead lane should fault");
            assert_eq!(fault.lane, 0);

            let _ = writer.close().await;
            assert_eq!(drain(survivor).await, b"first second");
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_stalled_reader_blocks_writer() {
        let (mut writer, readers) = broadcast_pipe_with(2, 16);
        // Neither reader drains, so a chunk larger than the lane buffer
        // cannot complete.
        let blocked = timeout(Duration::from_millis(100), writer.write(&[0u8; 64])).await;
        assert!(blocked.is_err());
        drop(readers);
    }

    #[tokio::test]
    async fn test_copy_drains_source_into_all_lanes() {
        let (mut writer, readers) = broadcast_pipe(3);
        let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 241) as u8).collect();

        let source = payload.clone();
        let copy = tokio::spawn(async move {
            let mut source = std::io::Cursor::new(source);
            let copied = broadcast_copy(&mut source, &mut writer).await.unwrap();
            writer.close().await.unwrap();
            copied
        });

        let mut handles = Vec::new();
        for reader in readers {
            handles.push(tokio::spawn(drain(reader)));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), payload);
        }
        assert_eq!(copy.await.unwrap(), payload.len() as u64);
    }

    #[tokio::test]
    async fn test_copy_source_error_propagates() {
        let (mut writer, readers) = broadcast_pipe(2);

        let copy = tokio::spawn(async move {
            let mut source = FailingSource { remaining: 10 };
            let result = broadcast_copy(&mut source, &mut writer).await;
            let _ = writer.close().await;
            result
        });

        // Readers observe a short stream, not an error
        for reader in readers {
            assert_eq!(drain(reader).await, vec![0xAB; 10]);
        }

        let err = copy.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "sensor feed dropped");
    }

    #[tokio::test]
    async fn test_copy_continues_after_reader_drop() {
        timeout(Duration::from_secs(5), async {
            let (mut writer, mut readers) = broadcast_pipe(2);
            let survivor = readers.pop().unwrap();
            drop(readers);

            let payload: Vec<u8> = vec![0x42; 20_000];
            let source = payload.clone();
            let copy = tokio::spawn(async move {
                let mut source = std::io::Cursor::new(source);
                let copied = broadcast_copy(&mut source, &mut writer).await.unwrap();
                writer.close().await.ok();
                copied
            });

            assert_eq!(drain(survivor).await, payload);
            // The producer drained its whole source despite the dead lane
            assert_eq!(copy.await.unwrap(), payload.len() as u64);
        })
        .await
        .unwrap();
    }

    #[test]
    #[should_panic(expected = "at least one reader")]
    fn test_zero_readers_panics() {
        let _ = broadcast_pipe(0);
    }
}
