//! Capture file schema and framing.
//!
//! A capture is a sequence of frames `[len:u32 LE][crc32:u32 LE][payload]`
//! where `payload` is a bincode-encoded [`CaptureFrame`]. The first frame is
//! normally a [`CaptureHeader`], followed by one [`CapturedFlow`] per recorded
//! HTTP exchange. Bodies are stored already decoded to text.
use anyhow::{Context, Result, bail};
use crc32fast::Hasher as Crc32;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};

pub const CAPTURE_VERSION: u16 = 1;

/// Refuse frames larger than this; a corrupt length would otherwise allocate
/// whatever it claims.
pub const MAX_FRAME_LEN: u32 = 64 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureHeader {
    pub version: u16,
    pub created_unix_ns: u128,
    /// Free-form label of what recorded the file (tool, host, ...).
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFlow {
    pub seq: u64,
    pub captured_unix_ns: u128,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub response_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureFrame {
    Header(CaptureHeader),
    Flow(CapturedFlow),
}

pub fn write_frame<W: Write>(w: &mut W, frame: &CaptureFrame) -> Result<()> {
    let payload = bincode::serialize(frame)?;
    let mut hasher = Crc32::new();
    hasher.update(&payload);
    let crc = hasher.finalize();

    let len = u32::try_from(payload.len()).context("frame too large")?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&crc.to_le_bytes())?;
    w.write_all(&payload)?;
    Ok(())
}

/// Read the next frame. `Ok(None)` at a clean end of file; a CRC mismatch or
/// a frame cut short is an error.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Option<CaptureFrame>> {
    let mut buf = [0u8; 4];
    match r.read_exact(&mut buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(buf);
    if len > MAX_FRAME_LEN {
        bail!("frame length {len} exceeds limit");
    }
    r.read_exact(&mut buf).context("truncated frame header")?;
    let crc_on_file = u32::from_le_bytes(buf);
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload).context("truncated frame payload")?;

    let mut hasher = Crc32::new();
    hasher.update(&payload);
    let crc_calc = hasher.finalize();
    if crc_calc != crc_on_file {
        bail!("CRC mismatch: file={crc_on_file:#x}, calc={crc_calc:#x}");
    }
    let frame = bincode::deserialize(&payload).context("bincode decode")?;
    Ok(Some(frame))
}

/// Iterates the frames of a capture stream. Stops after the first error.
pub struct CaptureReader<R> {
    inner: R,
    frames: usize,
    failed: bool,
}

impl<R: Read> CaptureReader<R> {
    pub fn new(inner: R) -> Self {
        CaptureReader { inner, frames: 0, failed: false }
    }

    /// Frames successfully read so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<CaptureFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match read_frame(&mut self.inner) {
            Ok(Some(frame)) => {
                self.frames += 1;
                Some(Ok(frame))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.context(format!("frame {}", self.frames))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn flow(seq: u64) -> CapturedFlow {
        CapturedFlow {
            seq,
            captured_unix_ns: 1_700_000_000_000_000_000,
            method: "GET".into(),
            url: "https://example.test/matchmarketscontentapi/markets?x=1".into(),
            status: 200,
            response_body: "MG;NA=Game;|PA;NA=Alice;".into(),
        }
    }

    #[test]
    fn reader_yields_frames_then_stops() {
        let mut buf = Vec::new();
        let header = CaptureFrame::Header(CaptureHeader { version: CAPTURE_VERSION, created_unix_ns: 0, source: "test".into() });
        write_frame(&mut buf, &header).unwrap();
        write_frame(&mut buf, &CaptureFrame::Flow(flow(0))).unwrap();
        write_frame(&mut buf, &CaptureFrame::Flow(flow(1))).unwrap();

        let mut rdr = CaptureReader::new(Cursor::new(buf));
        assert_eq!(rdr.next().unwrap().unwrap(), header);
        assert_eq!(rdr.next().unwrap().unwrap(), CaptureFrame::Flow(flow(0)));
        assert!(matches!(rdr.next(), Some(Ok(CaptureFrame::Flow(f))) if f.seq == 1));
        assert!(rdr.next().is_none());
        assert_eq!(rdr.frames(), 3);
    }

    #[test]
    fn corrupt_payload_fails_crc() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &CaptureFrame::Flow(flow(7))).unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        let err = read_frame(&mut Cursor::new(buf)).unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"));
    }

    #[test]
    fn truncated_frame_is_an_error_and_stops_iteration() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &CaptureFrame::Flow(flow(0))).unwrap();
        write_frame(&mut buf, &CaptureFrame::Flow(flow(1))).unwrap();
        buf.truncate(buf.len() - 3);
        let mut rdr = CaptureReader::new(Cursor::new(buf));
        assert!(rdr.next().unwrap().is_ok());
        assert!(rdr.next().unwrap().is_err());
        assert!(rdr.next().is_none());
        assert_eq!(rdr.frames(), 1);
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut buf = (MAX_FRAME_LEN + 1).to_le_bytes().to_vec();
        buf.extend_from_slice(&[0u8; 4]);
        assert!(read_frame(&mut Cursor::new(buf)).is_err());
        assert!(read_frame(&mut Cursor::new(Vec::new())).unwrap().is_none());
    }
}
