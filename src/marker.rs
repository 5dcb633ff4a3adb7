//! JPEG marker codes and metadata classification

// JPEG markers
pub const SOI: u8 = 0xD8; // Start of Image
pub const EOI: u8 = 0xD9; // End of Image
pub const SOS: u8 = 0xDA; // Start of Scan (entropy-coded data follows)
pub const APP1: u8 = 0xE1; // Exif / XMP
pub const APP14: u8 = 0xEE; // Adobe / copyright-style
pub const COM: u8 = 0xFE; // Comment

// Markers without a length field
pub const TEM: u8 = 0x01;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;

/// Prefix byte of every marker
pub const MARKER_PREFIX: u8 = 0xFF;

/// Stuffed zero following a literal 0xFF inside entropy-coded data
pub const STUFFED_ZERO: u8 = 0x00;

/// True for markers that are exactly two bytes with no length field
pub fn is_standalone(marker: u8) -> bool {
    matches!(marker, TEM | SOI | EOI | RST0..=RST7)
}

/// True for restart markers, which belong to entropy-coded data
pub fn is_restart(marker: u8) -> bool {
    (RST0..=RST7).contains(&marker)
}

/// Get human-readable label for a JPEG marker
pub fn marker_label(marker: u8) -> &'static str {
    match marker {
        0x01 => "TEM",
        0xC0 => "SOF0",
        0xC1 => "SOF1",
        0xC2 => "SOF2",
        0xC3 => "SOF3",
        0xC4 => "DHT",
        0xC5 => "SOF5",
        0xC6 => "SOF6",
        0xC7 => "SOF7",
        0xC9 => "SOF9",
        0xCA => "SOF10",
        0xCB => "SOF11",
        0xCC => "DAC",
        0xCD => "SOF13",
        0xCE => "SOF14",
        0xCF => "SOF15",
        0xD0 => "RST0",
        0xD1 => "RST1",
        0xD2 => "RST2",
        0xD3 => "RST3",
        0xD4 => "RST4",
        0xD5 => "RST5",
        0xD6 => "RST6",
        0xD7 => "RST7",
        0xD8 => "SOI",
        0xD9 => "EOI",
        0xDA => "SOS",
        0xDB => "DQT",
        0xDC => "DNL",
        0xDD => "DRI",
        0xDE => "DHP",
        0xDF => "EXP",
        0xE0 => "APP0",
        0xE1 => "APP1",
        0xE2 => "APP2",
        0xE3 => "APP3",
        0xE4 => "APP4",
        0xE5 => "APP5",
        0xE6 => "APP6",
        0xE7 => "APP7",
        0xE8 => "APP8",
        0xE9 => "APP9",
        0xEA => "APP10",
        0xEB => "APP11",
        0xEC => "APP12",
        0xED => "APP13",
        0xEE => "APP14",
        0xEF => "APP15",
        0xFE => "COM",
        _ => "OTHER",
    }
}

/// Set of marker bytes whose segments are carried over from the metadata donor
///
/// Every segment whose marker is in the set is copied from the donor stream,
/// and every segment whose marker is in the set is dropped from the target
/// stream. Supporting another donor-preserved segment type (ICC profiles in
/// APP2, Photoshop IRB in APP13, ...) only requires adding its marker.
///
/// # Example
///
/// ```
/// use jpeg_splice::MetadataSet;
///
/// // Default set plus ICC profiles
/// let set = MetadataSet::default().with(0xE2);
/// assert!(set.contains(0xE1));
/// assert!(set.contains(0xE2));
/// assert!(!set.contains(0xDB));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetadataSet {
    bits: [u64; 4],
}

impl MetadataSet {
    /// Markers carried over by default: Exif APP1, APP14, and COM
    pub const DEFAULT_MARKERS: [u8; 3] = [APP1, APP14, COM];

    /// A set containing no markers
    pub const fn empty() -> Self {
        Self { bits: [0; 4] }
    }

    /// Build a set from a list of marker bytes
    pub fn from_markers(markers: &[u8]) -> Self {
        markers.iter().fold(Self::empty(), |set, &m| set.with(m))
    }

    /// Add a marker to the set
    pub fn with(mut self, marker: u8) -> Self {
        self.bits[(marker >> 6) as usize] |= 1u64 << (marker & 0x3F);
        self
    }

    /// Remove a marker from the set
    pub fn without(mut self, marker: u8) -> Self {
        self.bits[(marker >> 6) as usize] &= !(1u64 << (marker & 0x3F));
        self
    }

    /// Check whether a marker is classified as metadata
    pub fn contains(&self, marker: u8) -> bool {
        self.bits[(marker >> 6) as usize] & (1u64 << (marker & 0x3F)) != 0
    }

    /// Iterate over the markers in ascending order
    pub fn markers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&m| self.contains(m))
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&word| word == 0)
    }
}

impl Default for MetadataSet {
    fn default() -> Self {
        Self::from_markers(&Self::DEFAULT_MARKERS)
    }
}

/// Classify a marker against the default metadata set
pub fn is_metadata_marker(marker: u8) -> bool {
    MetadataSet::default().contains(marker)
}
