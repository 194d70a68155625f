//! Streaming response bodies
//!
//! Chunked file reads feeding a channel-backed `hyper` body. A reader
//! task owns the open file handle for the whole response lifetime; when
//! the consumer stops reading and drops the body, the channel closes,
//! the task winds down, and the handle is released with it.

use crate::http::range::ByteRangeRequest;
use crate::http::response::ResponseBody;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes, Frame};
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;

/// Fixed read size for streamed file content.
pub const READ_CHUNK_SIZE: usize = 8192;

/// Body yielding chunks produced by a reader task. An `Err` chunk ends
/// the stream and is surfaced to the transport layer.
struct ChannelBody {
    receiver: mpsc::Receiver<io::Result<Bytes>>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut()
            .receiver
            .poll_recv(cx)
            .map(|chunk| chunk.map(|result| result.map(Frame::data)))
    }
}

/// Stream the inclusive byte span `[start, end]` of an open file.
#[must_use]
pub fn stream_file_range(file: File, start: u64, end: u64) -> ResponseBody {
    let (sender, receiver) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut file = file;
        if let Err(e) = send_range(&mut file, start, end, &sender).await {
            // Receiver may already be gone; nothing more to do then.
            let _ = sender.send(Err(e)).await;
        }
    });

    ChannelBody { receiver }.boxed()
}

/// Stream a `multipart/byteranges` body: one framed part per requested
/// range, all read from a single file handle, terminated by the closing
/// boundary marker.
#[must_use]
pub fn stream_multipart(file: File, request: ByteRangeRequest, size: u64) -> ResponseBody {
    let (sender, receiver) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut file = file;

        for range in &request.ranges {
            let part_header = format!(
                "--{}\r\nContent-Type: {}\r\nContent-Range: bytes {}-{}/{}\r\n\r\n",
                request.boundary, request.content_type, range.start, range.end, size,
            );
            if sender.send(Ok(Bytes::from(part_header))).await.is_err() {
                return;
            }

            if let Err(e) = send_range(&mut file, range.start, range.end, &sender).await {
                let _ = sender.send(Err(e)).await;
                return;
            }

            if sender.send(Ok(Bytes::from_static(b"\r\n"))).await.is_err() {
                return;
            }
        }

        let terminator = format!("--{}--", request.boundary);
        let _ = sender.send(Ok(Bytes::from(terminator))).await;
    });

    ChannelBody { receiver }.boxed()
}

/// Read `[start, end]` from the file in fixed-size chunks, pushing each
/// chunk into the channel. Stops early when the file ends before the
/// span does or when the consumer goes away.
async fn send_range(
    file: &mut File,
    start: u64,
    end: u64,
    sender: &mpsc::Sender<io::Result<Bytes>>,
) -> io::Result<()> {
    file.seek(SeekFrom::Start(start)).await?;

    let mut remaining = end - start + 1;
    while remaining > 0 {
        let want = usize::try_from(remaining.min(READ_CHUNK_SIZE as u64)).unwrap_or(READ_CHUNK_SIZE);
        let mut buf = vec![0u8; want];
        let got = file.read(&mut buf).await?;

        if got == 0 {
            return Ok(());
        }

        buf.truncate(got);
        remaining -= got as u64;
        if sender.send(Ok(Bytes::from(buf))).await.is_err() {
            return Ok(());
        }

        if got < want {
            return Ok(());
        }
    }

    Ok(())
}
