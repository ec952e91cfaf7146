use crate::audio::AudioError;
use crate::audio::capture::{CaptureConstraints, CaptureFormat, CaptureSource, ChunkSink};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

/// Capture source that replays fixed interleaved chunks when opened.
pub(crate) struct ScriptedSource {
    format: CaptureFormat,
    chunks: Vec<Vec<f32>>,
    fail_with: Option<fn() -> AudioError>,
    mime: Option<String>,
    releases: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new(sample_rate: u32, channels: u16, chunks: Vec<Vec<f32>>) -> Self {
        Self {
            format: CaptureFormat {
                sample_rate,
                channels,
            },
            chunks,
            fail_with: None,
            mime: None,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn mono(sample_rate: u32, chunks: Vec<Vec<f32>>) -> Self {
        Self::new(sample_rate, 1, chunks)
    }

    pub(crate) fn failing(fail_with: fn() -> AudioError) -> Self {
        Self {
            fail_with: Some(fail_with),
            ..Self::mono(44_100, Vec::new())
        }
    }

    pub(crate) fn with_mime(mut self, mime: &str) -> Self {
        self.mime = Some(mime.to_string());
        self
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub(crate) fn release_counter(&self) -> Arc<AtomicUsize> {
        self.releases.clone()
    }
}

impl CaptureSource for ScriptedSource {
    fn open(
        &mut self,
        _constraints: &CaptureConstraints,
        sink: ChunkSink,
    ) -> Result<CaptureFormat, AudioError> {
        if let Some(fail_with) = self.fail_with {
            return Err(fail_with());
        }
        for chunk in &self.chunks {
            sink.push(chunk.clone());
        }
        Ok(self.format)
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn native_mime_type(&self) -> Option<String> {
        self.mime.clone()
    }
}

/// Mono sine at `amplitude` peak.
pub(crate) fn sine(sample_rate: u32, secs: f32, freq: f32, amplitude: f32) -> Vec<f32> {
    let frames = (sample_rate as f32 * secs) as usize;
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Raw request captured by [`one_shot_server`].
pub(crate) struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

/// Serve exactly one HTTP request with a canned response on a background
/// thread. Returns the base URL and a handle yielding the request.
pub(crate) fn one_shot_server(
    status: &str,
    content_type: &str,
    body: &str,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        let (head_end, content_length) = loop {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "client closed before sending a full request");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, len);
            }
        };
        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        CapturedRequest {
            head: String::from_utf8_lossy(&buf[..head_end]).into_owned(),
            body: buf[head_end..].to_vec(),
        }
    });

    (format!("http://{addr}"), handle)
}

/// A local address with nothing listening on it.
pub(crate) fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
