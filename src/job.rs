//! Job controller (C7): the top-level per-job state machine.
//!
//! Owns an already-opened transport for the duration of one `print`/
//! `print_multi` call, validates every label before any byte is written,
//! then drives the command emitter (C6) through the prelude and one phase
//! sequence per label, closing the transport on every exit path.

use crate::command::{self, Frame, MEDIA_TYPE_HEAT_SHRINK, MEDIA_TYPE_LAMINATED};
use crate::error::{Error, Result};
use crate::media::{Media, MediaKind};
use crate::model::{window_for, ModelProfile};
use crate::packbits;
use crate::packing::pack_row;
use crate::raster::RasterSource;
use crate::status::Status;
use crate::transport::Transport;

/// One print unit: an already-opened raster source plus the media and
/// per-label options it will be printed with.
pub struct Label<'a> {
    pub source: &'a mut dyn RasterSource,
    pub media: Media,
    pub margin_mm: Option<f32>,
    pub high_resolution: bool,
}

/// Job-wide options that apply to every label.
pub struct PrintOptions {
    pub use_compression: bool,
    pub half_cut: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            use_compression: true,
            half_cut: true,
        }
    }
}

pub struct JobController<T: Transport> {
    transport: T,
    profile: ModelProfile,
}

impl<T: Transport> JobController<T> {
    pub fn new(transport: T, profile: ModelProfile) -> Self {
        JobController { transport, profile }
    }

    pub fn print(&mut self, label: &mut Label, options: &PrintOptions) -> Result<()> {
        self.print_multi(std::slice::from_mut(label), options)
    }

    pub fn print_multi(&mut self, labels: &mut [Label], options: &PrintOptions) -> Result<()> {
        let result = self.run_job(labels, options);
        // close() is idempotent and swallows its own errors; the controller
        // never lets a cleanup failure mask the original result.
        let _ = self.transport.close();
        result
    }

    fn run_job(&mut self, labels: &mut [Label], options: &PrintOptions) -> Result<()> {
        if labels.is_empty() {
            return Err(Error::ValidationError("a job requires at least one label".to_string()));
        }

        // Validation happens entirely before any byte is written.
        let mut windows = Vec::with_capacity(labels.len());
        for label in labels.iter() {
            if let Some(margin) = label.margin_mm {
                if margin < 0.0 {
                    return Err(Error::ValidationError(format!("margin must be non-negative, got {margin}")));
                }
            }
            let window = window_for(&self.profile, label.media)?;
            if label.source.printable_pins() != window.printable_pins {
                return Err(Error::ValidationError(format!(
                    "raster source has {} printable pins, but {:?} on this model needs {}",
                    label.source.printable_pins(),
                    label.media,
                    window.printable_pins
                )));
            }
            windows.push(window);
        }

        let mut prelude = Frame::new();
        prelude.invalidate().initialize().status_request();
        self.transport.write_all(&prelude.build())?;

        if let Some(raw) = self.transport.read_status()? {
            Status::parse(&raw)?.into_result()?;
        }
        // No reply (timed out or unsupported on this transport): proceed
        // without status validation rather than fail the job.

        let last_index = labels.len() - 1;
        for (i, label) in labels.iter_mut().enumerate() {
            let window = windows[i];
            let is_last = i == last_index;
            let descriptor = label.media.descriptor();
            let media_type = match descriptor.kind {
                MediaKind::LaminatedTape => MEDIA_TYPE_LAMINATED,
                MediaKind::HeatShrinkTube2_1 | MediaKind::HeatShrinkTube3_1 => MEDIA_TYPE_HEAT_SHRINK,
            };

            let compress = self.profile.compression_required || options.use_compression;
            if self.profile.compression_required && !options.use_compression {
                log::warn!(
                    "{} requires compression; ignoring --no-compression for this label",
                    self.profile.model
                );
            }

            let margin_dots = match label.margin_mm {
                Some(mm) => command::margin_dots(mm, self.profile.base_dpi, label.high_resolution),
                None => command::default_margin_dots(label.high_resolution),
            };

            let rows = label.source.height() as u32;
            let raster_count = if label.high_resolution { rows * 2 } else { rows };

            let mut frame = Frame::new();
            frame
                .switch_to_raster_mode()
                .print_information(media_type, descriptor.reported_width_mm, raster_count)
                .advanced_mode(label.high_resolution, is_last)
                .margin(margin_dots)
                .compression_mode(compress);

            while let Some(row) = label.source.next_row() {
                let line = pack_row(&row, window.printable_pins, window.left_pad, self.profile.bytes_per_line);
                let repeats = if label.high_resolution { 2 } else { 1 };
                for _ in 0..repeats {
                    emit_row(&mut frame, &line, compress);
                }
            }

            let full_cut = !options.half_cut || is_last;
            frame.page_end(full_cut);

            self.transport.write_all(&frame.build())?;
        }

        Ok(())
    }
}

fn emit_row(frame: &mut Frame, line: &[u8], compress: bool) {
    if crate::packing::is_all_zero(line) {
        frame.zero_row();
    } else if compress {
        frame.raster_row(&packbits::encode(line));
    } else {
        frame.raster_row(line);
    }
}
