//! Privacy classification of tag names.

/// Terms that mark a tag as identifying (matched as case-insensitive substrings).
pub const SENSITIVE_TERMS: &[&str] = &[
    "SerialNumber",
    "BodySerialNumber",
    "LensSerialNumber",
    "CameraSerialNumber",
    "InternalSerialNumber",
    "Serial Number",
    "Make",
    "Model",
    "Software",
    "Artist",
    "Copyright",
    "OwnerName",
    "GPSInfo",
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "DateTime",
    "DateTimeOriginal",
    "DateTimeDigitized",
    "MakerNote",
    "UserComment",
    "ImageUniqueID",
    "DocumentName",
];

const SERIAL_TERM: &str = "serial";

/// How a tag should be flagged in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sensitivity {
    pub is_sensitive: bool,
    pub is_hardware_identifier: bool,
}

/// Classify a tag name.
///
/// The two flags are computed independently of each other.
pub fn classify(tag_name: &str) -> Sensitivity {
    let lowered = tag_name.to_lowercase();

    Sensitivity {
        is_sensitive: SENSITIVE_TERMS
            .iter()
            .any(|term| lowered.contains(&term.to_lowercase())),
        is_hardware_identifier: lowered.contains(SERIAL_TERM),
    }
}
