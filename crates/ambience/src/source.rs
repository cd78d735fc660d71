use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use image::DynamicImage;

/// Errors surfaced by the image-loading paths.
///
/// Only load calls fail; engine state is never touched by a failed load, so
/// whatever album was displayed before the call keeps rendering.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch '{location}': {message}")]
    Fetch { location: String, message: String },
    #[error("failed to decode image data: {0}")]
    Decode(String),
    #[error("raw pixel buffer is {actual} bytes, expected {expected} ({width}x{height} RGBA)")]
    PixelLength {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },
    #[error("load was superseded by a newer load or a stop")]
    Cancelled,
    #[error("engine was disposed before the load resolved")]
    Disposed,
}

/// A decoded RGBA8 raster ready for GPU upload.
///
/// This is the hand-off type between the decoding collaborators and the
/// engine's ingest stage; the engine never sees encoded bytes.
#[derive(Clone)]
pub struct RasterSource {
    pub(crate) pixels: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl RasterSource {
    /// Wraps an already-decoded image, converting to RGBA8.
    pub fn from_image(image: DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            pixels: rgba.into_raw(),
            width,
            height,
        }
    }

    /// Wraps a raw RGBA8 pixel buffer, validating its length.
    pub fn from_raw_pixels(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, LoadError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(LoadError::PixelLength {
                expected,
                actual: pixels.len(),
                width,
                height,
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSource")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Awaitable handle returned by [`crate::Engine::load_image`].
///
/// Resolution is signalled only after the decoded image has been uploaded and
/// blurred on the rendering thread, not when the fetch finishes. Poll with
/// [`LoadTicket::try_result`] from the rendering thread, or block on
/// [`LoadTicket::wait`] from another thread.
pub struct LoadTicket {
    receiver: Receiver<Result<(), LoadError>>,
}

impl LoadTicket {
    /// Blocks until the load resolves.
    pub fn wait(self) -> Result<(), LoadError> {
        self.receiver.recv().unwrap_or(Err(LoadError::Cancelled))
    }

    /// Returns the outcome if the load has resolved, `None` otherwise.
    pub fn try_result(&self) -> Option<Result<(), LoadError>> {
        self.receiver.try_recv().ok()
    }

    /// A ticket that resolved before any work started (e.g. on a disposed
    /// engine).
    pub(crate) fn resolved(outcome: Result<(), LoadError>) -> Self {
        let (sender, receiver) = bounded(1);
        let _ = sender.try_send(outcome);
        Self { receiver }
    }
}

/// An in-flight fetch+decode tracked by the engine between frames.
pub(crate) struct PendingLoad {
    decoded: Receiver<Result<RasterSource, LoadError>>,
    completion: Sender<Result<(), LoadError>>,
}

impl PendingLoad {
    /// Reports a terminal outcome to the ticket holder.
    pub fn resolve(&self, outcome: Result<(), LoadError>) {
        let _ = self.completion.try_send(outcome);
    }

    /// Polls the decode worker without blocking.
    pub fn poll(&self) -> Option<Result<RasterSource, LoadError>> {
        self.decoded.try_recv().ok()
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        // A replaced or abandoned load still resolves its ticket; if it
        // already resolved, the channel is full and this is a no-op.
        let _ = self.completion.try_send(Err(LoadError::Cancelled));
    }
}

/// Spawns the fetch+decode worker for a path or `http(s)` URL.
///
/// The returned [`PendingLoad`] is polled on the rendering thread; the
/// [`LoadTicket`] goes back to the caller.
pub(crate) fn spawn_load(location: &str) -> (PendingLoad, LoadTicket) {
    let (decoded_tx, decoded_rx) = bounded(1);
    let (completion_tx, completion_rx) = bounded(1);
    let target = location.to_string();

    let spawned = thread::Builder::new()
        .name("ambience-decode".into())
        .spawn(move || {
            let result = fetch_and_decode(&target);
            let _ = decoded_tx.send(result);
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "failed to spawn decode worker");
    }

    (
        PendingLoad {
            decoded: decoded_rx,
            completion: completion_tx,
        },
        LoadTicket {
            receiver: completion_rx,
        },
    )
}

fn fetch_and_decode(location: &str) -> Result<RasterSource, LoadError> {
    let bytes = fetch_bytes(location)?;
    let image = image::load_from_memory(&bytes).map_err(|err| LoadError::Decode(err.to_string()))?;
    let raster = RasterSource::from_image(image);
    tracing::debug!(
        location,
        width = raster.width,
        height = raster.height,
        "decoded source image"
    );
    Ok(raster)
}

fn fetch_bytes(location: &str) -> Result<Vec<u8>, LoadError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let response = reqwest::blocking::get(location)
            .and_then(|response| response.error_for_status())
            .map_err(|err| LoadError::Fetch {
                location: location.to_string(),
                message: err.to_string(),
            })?;
        let bytes = response.bytes().map_err(|err| LoadError::Fetch {
            location: location.to_string(),
            message: err.to_string(),
        })?;
        Ok(bytes.to_vec())
    } else {
        std::fs::read(Path::new(location)).map_err(|err| LoadError::Fetch {
            location: location.to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_pixels_require_exact_rgba_length() {
        let ok = RasterSource::from_raw_pixels(vec![0u8; 2 * 3 * 4], 2, 3);
        assert!(ok.is_ok());

        let short = RasterSource::from_raw_pixels(vec![0u8; 5], 2, 3);
        assert!(matches!(
            short,
            Err(LoadError::PixelLength {
                expected: 24,
                actual: 5,
                ..
            })
        ));

        let empty = RasterSource::from_raw_pixels(Vec::new(), 0, 0);
        assert!(empty.is_err());
    }

    #[test]
    fn dropped_pending_load_cancels_its_ticket() {
        let (pending, ticket) = spawn_load("/definitely/not/a/file.png");
        drop(pending);
        // The worker outcome no longer matters; the drop already resolved it.
        assert!(matches!(ticket.wait(), Err(LoadError::Cancelled)));
    }

    #[test]
    fn missing_file_reports_fetch_error() {
        let (pending, _ticket) = spawn_load("/definitely/not/a/file.png");
        // Block until the worker reports.
        let outcome = pending
            .decoded
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("worker reply");
        assert!(matches!(outcome, Err(LoadError::Fetch { .. })));
    }
}
