//! ffmpeg-backed frame source.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use ffmpeg::format::{self, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{Context as Scaler, Flags as ScalingFlags};
use image::RgbImage;
use slide_sift_common::frame::Frame;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::timeline::FrameSource;

/// Container-level seek time base (microseconds per second).
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Seekable video file decoding to RGB frames.
///
/// Keeps the demuxer, decoder and scaler alive for the lifetime of the
/// stream. Seeks land on the nearest prior keyframe and resynchronize by
/// decoding forward to the exact frame, so random access is exact but
/// costly. The file handle is released on drop.
pub struct VideoStream {
    input: format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: Scaler,
    stream_index: usize,
    time_base: ffmpeg::Rational,
    frame_count: u64,
    rate: f64,
    /// Index of the frame the next sequential read returns.
    cursor: u64,
    /// Set after a seek until the decode loop has caught up to the cursor.
    needs_resync: bool,
    /// `true` once `send_eof` has been issued to the decoder.
    eof_sent: bool,
}

impl VideoStream {
    /// Open a video file. Any failure to open or query the source here is
    /// fatal; nothing later in the pipeline retries it.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        ffmpeg::init().map_err(|e| EngineError::StreamUnavailable(e.to_string()))?;

        let input = format::input(&path.as_ref().to_path_buf())
            .map_err(|e| EngineError::StreamUnavailable(e.to_string()))?;

        let (stream_index, time_base, rate, frame_count, parameters) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| EngineError::StreamUnavailable("no video stream".into()))?;

            let time_base = stream.time_base();
            let avg = stream.avg_frame_rate();
            let rate = if avg.denominator() == 0 {
                0.0
            } else {
                avg.numerator() as f64 / avg.denominator() as f64
            };

            let reported = stream.frames();
            let frame_count = if reported > 0 {
                reported as u64
            } else {
                estimate_frame_count(stream.duration(), time_base, input.duration(), rate).ok_or_else(
                    || EngineError::StreamUnavailable("cannot determine frame count".into()),
                )?
            };

            (
                stream.index(),
                time_base,
                rate,
                frame_count,
                stream.parameters(),
            )
        };

        let decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|e| EngineError::StreamUnavailable(e.to_string()))?
            .decoder()
            .video()
            .map_err(|e| EngineError::StreamUnavailable(e.to_string()))?;

        let scaler = Scaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| EngineError::StreamUnavailable(e.to_string()))?;

        debug!(
            stream_index,
            frame_count, rate, "opened video stream"
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            frame_count,
            rate,
            cursor: 0,
            needs_resync: false,
            eof_sent: false,
        })
    }

    fn frame_number_of(&self, pts: i64) -> u64 {
        let seconds =
            pts as f64 * self.time_base.numerator() as f64 / self.time_base.denominator() as f64;
        (seconds * self.rate).round().max(0.0) as u64
    }

    /// Decode the next raw frame in presentation order, feeding packets as
    /// needed and draining the decoder once the container is exhausted.
    fn decode_next(&mut self) -> Option<ffmpeg::frame::Video> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Some(decoded);
            }
            if self.eof_sent {
                return None;
            }

            let next_packet = {
                let mut packets = self.input.packets();
                packets.next().map(|(stream, packet)| (stream.index(), packet))
            };
            match next_packet {
                Some((index, packet)) if index == self.stream_index => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        warn!(error = %e, "decode error, treating as end of stream");
                        return None;
                    }
                }
                Some(_) => {} // other streams are ignored
                None => {
                    if self.decoder.send_eof().is_err() {
                        return None;
                    }
                    self.eof_sent = true;
                }
            }
        }
    }

    fn to_frame(&mut self, decoded: &ffmpeg::frame::Video) -> Option<Frame> {
        let mut rgb = ffmpeg::frame::Video::empty();
        if let Err(e) = self.scaler.run(decoded, &mut rgb) {
            warn!(error = %e, "scaler failed, treating as end of stream");
            return None;
        }

        let width = rgb.width();
        let height = rgb.height();
        let stride = rgb.stride(0);
        let data = rgb.data(0);
        let row_len = width as usize * 3;

        let mut buf = Vec::with_capacity(row_len * height as usize);
        for y in 0..height as usize {
            buf.extend_from_slice(&data[y * stride..y * stride + row_len]);
        }
        RgbImage::from_raw(width, height, buf).map(Frame::new)
    }
}

impl FrameSource for VideoStream {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frame_rate(&self) -> f64 {
        self.rate
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, pos: u64) -> EngineResult<()> {
        if pos == self.cursor && !self.needs_resync {
            return Ok(());
        }
        if pos >= self.frame_count {
            // Past the end: nothing to decode there, and some demuxers
            // reject the seek outright. The next read reports exhaustion.
            self.cursor = pos;
            self.needs_resync = false;
            return Ok(());
        }
        let seconds = if self.rate > 0.0 {
            pos as f64 / self.rate
        } else {
            0.0
        };
        let ts = (seconds * AV_TIME_BASE) as i64;
        self.input.seek(ts, ..ts).map_err(|e| EngineError::Seek {
            position: pos,
            reason: e.to_string(),
        })?;
        self.decoder.flush();
        self.eof_sent = false;
        self.cursor = pos;
        self.needs_resync = true;
        debug!(pos, ts, "seek");
        Ok(())
    }

    fn read(&mut self) -> Option<Frame> {
        let target = self.cursor;
        if target >= self.frame_count {
            return None;
        }
        loop {
            let decoded = self.decode_next()?;
            if self.needs_resync {
                // Discard the pre-roll frames between the keyframe the seek
                // landed on and the requested position.
                let number = self.frame_number_of(decoded.pts().unwrap_or(0));
                if number < target {
                    continue;
                }
                self.needs_resync = false;
            }
            self.cursor = target + 1;
            return self.to_frame(&decoded);
        }
    }
}

/// Estimate the total frame count when the container does not report one:
/// prefer the stream duration, fall back to the container duration.
fn estimate_frame_count(
    stream_duration: i64,
    time_base: ffmpeg::Rational,
    container_duration: i64,
    rate: f64,
) -> Option<u64> {
    if rate <= 0.0 {
        return None;
    }
    let seconds = if stream_duration > 0 && time_base.denominator() != 0 {
        stream_duration as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
    } else if container_duration > 0 {
        container_duration as f64 / AV_TIME_BASE
    } else {
        return None;
    };
    let count = (seconds * rate).round() as u64;
    (count > 0).then_some(count)
}
