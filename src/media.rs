//! Media registry (C1): the tape and heat-shrink tube catalog.
//!
//! Media is modeled as a tagged enum rather than a class hierarchy: every
//! variant is `Copy` and maps to an immutable [`MediaDescriptor`] record via
//! [`Media::descriptor`]. The model registry (`crate::model`) keys its
//! per-model pin windows directly on these variants.

use std::sync::Once;

/// Which physical family a piece of media belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    LaminatedTape,
    HeatShrinkTube2_1,
    HeatShrinkTube3_1,
}

/// Immutable description of one piece of media.
///
/// `reported_width_mm` is what the printer's status reply carries in byte 10
/// (which can differ from the human-facing width — 3.5mm tape reports as
/// 4mm). `nominal_width_dmm` is the human-facing width in tenths of a
/// millimeter, used for `--tape-width`/`--tube-width` selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub nominal_width_dmm: u16,
    pub reported_width_mm: u8,
}

impl MediaDescriptor {
    pub fn nominal_width_mm(&self) -> f32 {
        self.nominal_width_dmm as f32 / 10.0
    }
}

/// Tagged catalog of every tape and heat-shrink tube the driver knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Media {
    Tape3_5,
    Tape6,
    Tape9,
    Tape12,
    Tape18,
    Tape24,
    Tape36,

    Tube2_1_5_8,
    Tube2_1_8_8,
    Tube2_1_11_7,
    Tube2_1_17_7,
    Tube2_1_23_6,

    Tube3_1_5_2,
    Tube3_1_9_0,
    Tube3_1_11_2,
    Tube3_1_21_0,
    Tube3_1_31_0,
}

impl Media {
    pub fn descriptor(self) -> MediaDescriptor {
        use Media::*;
        use MediaKind::*;
        let (kind, nominal_dmm, reported_mm) = match self {
            Tape3_5 => (LaminatedTape, 35, 4),
            Tape6 => (LaminatedTape, 60, 6),
            Tape9 => (LaminatedTape, 90, 9),
            Tape12 => (LaminatedTape, 120, 12),
            Tape18 => (LaminatedTape, 180, 18),
            Tape24 => (LaminatedTape, 240, 24),
            Tape36 => (LaminatedTape, 360, 36),

            Tube2_1_5_8 => (HeatShrinkTube2_1, 58, 6),
            Tube2_1_8_8 => (HeatShrinkTube2_1, 88, 9),
            Tube2_1_11_7 => (HeatShrinkTube2_1, 117, 12),
            Tube2_1_17_7 => (HeatShrinkTube2_1, 177, 18),
            Tube2_1_23_6 => (HeatShrinkTube2_1, 236, 24),

            Tube3_1_5_2 => (HeatShrinkTube3_1, 52, 6),
            Tube3_1_9_0 => (HeatShrinkTube3_1, 90, 9),
            Tube3_1_11_2 => (HeatShrinkTube3_1, 112, 12),
            Tube3_1_21_0 => (HeatShrinkTube3_1, 210, 24),
            Tube3_1_31_0 => (HeatShrinkTube3_1, 310, 36),
        };
        MediaDescriptor {
            kind,
            nominal_width_dmm: nominal_dmm,
            reported_width_mm: reported_mm,
        }
    }

    /// Look up laminated tape by its nominal width in millimeters.
    pub fn laminated_tape_mm(mm: f32) -> Option<Self> {
        match to_dmm(mm) {
            35 => Some(Media::Tape3_5),
            60 => Some(Media::Tape6),
            90 => Some(Media::Tape9),
            120 => Some(Media::Tape12),
            180 => Some(Media::Tape18),
            240 => Some(Media::Tape24),
            360 => Some(Media::Tape36),
            _ => None,
        }
    }

    /// Look up a heat-shrink tube by its nominal diameter in millimeters.
    /// Diameters are unique across the 2:1 and 3:1 series.
    pub fn heat_shrink_tube_mm(mm: f32) -> Option<Self> {
        match to_dmm(mm) {
            58 => Some(Media::Tube2_1_5_8),
            88 => Some(Media::Tube2_1_8_8),
            117 => Some(Media::Tube2_1_11_7),
            177 => Some(Media::Tube2_1_17_7),
            236 => Some(Media::Tube2_1_23_6),
            52 => Some(Media::Tube3_1_5_2),
            90 => Some(Media::Tube3_1_9_0),
            112 => Some(Media::Tube3_1_11_2),
            210 => Some(Media::Tube3_1_21_0),
            310 => Some(Media::Tube3_1_31_0),
            _ => None,
        }
    }
}

fn to_dmm(mm: f32) -> u16 {
    (mm * 10.0).round() as u16
}

static LAMINATED_ALIAS_WARNED: Once = Once::new();

/// Deprecated alias names, kept for callers migrating off the driver's
/// original `LaminatedTapeNmm` naming. Each resolves to the canonical
/// `Media::TapeN` variant and logs a deprecation note exactly once per
/// process rather than warning at every construction.
pub mod compat {
    use super::{Media, LAMINATED_ALIAS_WARNED};

    #[deprecated(note = "use Media::laminated_tape_mm instead")]
    pub fn laminated_tape_mm(mm: f32) -> Option<Media> {
        LAMINATED_ALIAS_WARNED.call_once(|| {
            log::warn!(
                "LaminatedTapeNmm is deprecated and will be removed; use Media::TapeNmm instead"
            );
        });
        Media::laminated_tape_mm(mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laminated_descriptor_reports_rounded_width() {
        let d = Media::Tape3_5.descriptor();
        assert_eq!(d.reported_width_mm, 4);
        assert_eq!(d.nominal_width_mm(), 3.5);
    }

    #[test]
    fn lookup_by_width_round_trips() {
        assert_eq!(Media::laminated_tape_mm(12.0), Some(Media::Tape12));
        assert_eq!(Media::heat_shrink_tube_mm(5.8), Some(Media::Tube2_1_5_8));
        assert_eq!(Media::heat_shrink_tube_mm(31.0), Some(Media::Tube3_1_31_0));
        assert_eq!(Media::laminated_tape_mm(13.0), None);
    }

    #[test]
    fn deprecated_alias_resolves_to_canonical_media() {
        #[allow(deprecated)]
        let resolved = compat::laminated_tape_mm(9.0);
        assert_eq!(resolved, Some(Media::Tape9));
    }
}
