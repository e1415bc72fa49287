//! End-to-end wire-format scenarios driven through the public API only,
//! against an in-memory fake transport. Mirrors the seed scenarios recorded
//! in SPEC_FULL.md §8.

use ptouch_rs::error::{Error, Result};
use ptouch_rs::job::{JobController, Label, PrintOptions};
use ptouch_rs::media::Media;
use ptouch_rs::model::{profile_for, PrinterModel};
use ptouch_rs::packbits;
use ptouch_rs::raster::RasterSource;
use ptouch_rs::transport::Transport;
use std::cell::RefCell;
use std::rc::Rc;

struct VecSource {
    printable_pins: u16,
    rows: Vec<Vec<u8>>,
    next: usize,
}

impl VecSource {
    fn new(printable_pins: u16, rows: Vec<Vec<u8>>) -> Self {
        VecSource {
            printable_pins,
            rows,
            next: 0,
        }
    }
}

impl RasterSource for VecSource {
    fn printable_pins(&self) -> u16 {
        self.printable_pins
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    fn next_row(&mut self) -> Option<Vec<u8>> {
        let row = self.rows.get(self.next).cloned();
        self.next += 1;
        row
    }
}

#[derive(Default)]
struct MemoryTransport {
    written: Rc<RefCell<Vec<u8>>>,
}

impl Transport for MemoryTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.written.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    fn read_status(&mut self) -> Result<Option<[u8; 32]>> {
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Scenario 2 from SPEC_FULL.md §8: 560-pin, 24mm tape, high-resolution,
/// compression on, 3 rows of alternating `FF 00 ...` bytes.
#[test]
fn scenario_2_high_res_compressed_560_pin_job() {
    let profile = profile_for(PrinterModel::P900);
    let transport = MemoryTransport::default();
    let written = transport.written.clone();
    let mut controller = JobController::new(transport, profile);

    let alternating: Vec<u8> = (0..40).map(|i| if i % 2 == 0 { 0xFF } else { 0x00 }).collect();
    let mut source = VecSource::new(320, vec![alternating.clone(), alternating.clone(), alternating]);
    let mut label = Label {
        source: &mut source,
        media: Media::Tape24,
        margin_mm: None,
        high_resolution: true,
    };
    let options = PrintOptions {
        use_compression: true,
        half_cut: true,
    };
    controller.print(&mut label, &options).unwrap();

    let bytes = written.borrow().clone();

    // raster_count in print-information must be 2 * 3 rows = 6.
    let print_info_offset = 100 + 2 + 3 + 4; // invalidate + ESC@ + ESCiS + ESCia01
    assert_eq!(&bytes[print_info_offset..print_info_offset + 3], &[0x1B, 0x69, 0x7A]);
    let raster_count_offset = print_info_offset + 3 + 4; // flags, media_type, width, media_length
    assert_eq!(
        u32::from_le_bytes(bytes[raster_count_offset..raster_count_offset + 4].try_into().unwrap()),
        6
    );

    // Margin is doubled: default 14 dots -> 28.
    let margin_needle = [0x1B, 0x69, 0x64, 28, 0x00];
    assert!(bytes.windows(5).any(|w| w == margin_needle));

    // Compression mode is packbits.
    assert!(bytes.windows(2).any(|w| w == [0x4D, 0x02]));

    // Every raster-row command appears exactly twice (high-resolution doubling).
    let row_count = bytes.iter().filter(|&&b| b == 0x47).count();
    assert_eq!(row_count, 2 * 3);

    assert_eq!(bytes.last(), Some(&0x1A));
}

/// Scenario 3: a two-label job with the default half-cut policy emits a
/// fresh compression-mode command per label and a single `0x0C` between
/// labels.
#[test]
fn scenario_3_two_label_half_cut_job_re_emits_compression_mode_per_label() {
    let profile = profile_for(PrinterModel::P900);
    let transport = MemoryTransport::default();
    let written = transport.written.clone();
    let mut controller = JobController::new(transport, profile);

    let mut s1 = VecSource::new(320, vec![vec![0xFF; 40]]);
    let mut s2 = VecSource::new(320, vec![vec![0x00; 40]]);
    let mut labels = vec![
        Label {
            source: &mut s1,
            media: Media::Tape24,
            margin_mm: None,
            high_resolution: false,
        },
        Label {
            source: &mut s2,
            media: Media::Tape24,
            margin_mm: None,
            high_resolution: false,
        },
    ];
    controller
        .print_multi(&mut labels, &PrintOptions::default())
        .unwrap();

    let bytes = written.borrow().clone();
    assert_eq!(bytes.iter().filter(|&&b| b == 0x4D).count(), 2);
    assert_eq!(bytes.iter().filter(|&&b| b == 0x0C).count(), 1);
    assert_eq!(bytes.last(), Some(&0x1A));
}

/// Scenario 4: a model that doesn't support heat-shrink fails the whole job,
/// before a single byte touches the transport, for any heat-shrink width.
#[test]
fn scenario_4_unsupported_media_fails_closed_before_any_write() {
    let profile = profile_for(PrinterModel::P910BT);
    let transport = MemoryTransport::default();
    let written = transport.written.clone();
    let mut controller = JobController::new(transport, profile);

    let mut source = VecSource::new(56, vec![]);
    let mut label = Label {
        source: &mut source,
        media: Media::Tube2_1_5_8,
        margin_mm: None,
        high_resolution: false,
    };
    let err = controller.print(&mut label, &PrintOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedMedia { .. }));
    assert!(written.borrow().is_empty());
}

/// Scenario 5: a `compression_required` model forces compression on even
/// when the caller explicitly asks for it off.
#[test]
fn scenario_5_compression_required_override_wins_over_caller_request() {
    let profile = profile_for(PrinterModel::E550W);
    let transport = MemoryTransport::default();
    let written = transport.written.clone();
    let mut controller = JobController::new(transport, profile);

    let mut source = VecSource::new(70, vec![vec![0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11]]);
    let mut label = Label {
        source: &mut source,
        media: Media::Tape12,
        margin_mm: None,
        high_resolution: false,
    };
    let options = PrintOptions {
        use_compression: false,
        half_cut: true,
    };
    controller.print(&mut label, &options).unwrap();

    let bytes = written.borrow().clone();
    assert!(bytes.windows(2).any(|w| w == [0x4D, 0x02]));
    // The row is not a bare `5A` zero-row and not the 16-byte uncompressed
    // line; it must have gone through the packbits encoder.
    assert!(bytes.iter().any(|&b| b == 0x47));
}

/// Packbits round-trips for an arbitrary `bytes_per_line`-sized buffer, the
/// quantified invariant from SPEC_FULL.md §8.
#[test]
fn packbits_round_trips_for_every_model_bytes_per_line() {
    for profile in [profile_for(PrinterModel::E550W), profile_for(PrinterModel::P900)] {
        let mut data = Vec::with_capacity(profile.bytes_per_line as usize);
        let mut seed = 7u32;
        for _ in 0..profile.bytes_per_line {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            data.push((seed >> 24) as u8);
        }
        assert_eq!(packbits::decode(&packbits::encode(&data)), data);
    }
}
