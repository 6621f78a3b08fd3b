//! Tag name resolution.
//!
//! Names come from the EXIF tag tables shipped with `kamadak-exif`, with a
//! few overrides so that pointer tags and common vendor extensions read the
//! way photographers know them. Unknown ids resolve to their decimal value.

use exif::{Context, Tag};

/// Tag id namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// IFD0 and the Exif sub-directory.
    Primary,
    /// The GPS sub-directory.
    Gps,
}

/// Name of the GPS pointer tag in the primary namespace.
pub const GPS_INFO: &str = "GPSInfo";

/// Name of the proprietary maker block.
pub const MAKER_NOTE: &str = "MakerNote";

/// Primary tags that the EXIF tables either lack or name differently.
const PRIMARY_OVERRIDES: &[(u16, &str)] = &[
    (0x000B, "ProcessingSoftware"),
    (0x010D, "DocumentName"),
    (0x013C, "HostComputer"),
    (0x4746, "Rating"),
    (0x8769, "ExifOffset"),
    (0x8825, GPS_INFO),
    (0x9C9B, "XPTitle"),
    (0x9C9C, "XPComment"),
    (0x9C9D, "XPAuthor"),
    (0x9C9E, "XPKeywords"),
    (0x9C9F, "XPSubject"),
    (0xA005, "InteropOffset"),
    (0xA430, "CameraOwnerName"),
    (0xA431, "BodySerialNumber"),
    (0xA435, "LensSerialNumber"),
    (0xC62F, "CameraSerialNumber"),
];

/// Resolve a raw tag id to a display name.
pub fn resolve(namespace: Namespace, id: u16) -> String {
    match namespace {
        Namespace::Primary => resolve_primary(id),
        Namespace::Gps => known_name(Tag(Context::Gps, id)),
    }
    .unwrap_or_else(|| id.to_string())
}

fn resolve_primary(id: u16) -> Option<String> {
    if let Some((_, name)) = PRIMARY_OVERRIDES.iter().find(|(tag, _)| *tag == id) {
        return Some((*name).to_string());
    }
    known_name(Tag(Context::Tiff, id)).or_else(|| known_name(Tag(Context::Exif, id)))
}

fn known_name(tag: Tag) -> Option<String> {
    // Tags without a description are not in the tables; their Display
    // output is a debug rendering rather than a name.
    tag.description().map(|_| tag.to_string())
}
