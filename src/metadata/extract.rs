//! Metadata extraction.
//!
//! Extraction runs in two layers:
//!
//! - [`read_primary_tags`] lists the primary tag table as the EXIF parser
//!   sees it. A GPS table it resolved arrives as a directory; one it did not
//!   arrives as a bare offset.
//! - [`resolve_gps_offset`] follows such an offset through the raw EXIF
//!   buffer.
//!
//! [`assemble`] composes the two into the name/value mapping of a
//! [`MetadataSnapshot`]. [`extract`] wraps the whole pass and never fails:
//! any error becomes a single `Error` entry.

use crate::error::{Error, Result};
use crate::formats::ifd::{self, tags as ifd_tags};
use crate::formats::ImageFormat;
use crate::metadata::tags::{GPS_INFO, MAKER_NOTE, Namespace, resolve};
use crate::metadata::Value;
use image::{ColorType, ImageDecoder, ImageReader};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Key used when extraction fails.
pub const ERROR_KEY: &str = "Error";

/// Labels of the descriptive fields, in report order.
pub const DESCRIPTIVE_FIELDS: [&str; 3] = ["Image Format", "Image Mode", "Image Size"];

/// Character code headers that prefix a UserComment value.
const USER_COMMENT_HEADERS: [&[u8; 8]; 4] = [
    b"ASCII\0\0\0",
    b"UNICODE\0",
    b"JIS\0\0\0\0\0",
    b"\0\0\0\0\0\0\0\0",
];

/// What the container itself looks like. Never treated as metadata to clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Container format name, e.g. `JPEG`.
    pub format: String,
    /// Color mode, e.g. `RGB` or `RGBA`.
    pub color_mode: String,
    /// Pixel dimensions as `(width, height)`.
    pub dimensions: (u32, u32),
    /// The supported format the content was detected as, if any.
    pub container: Option<ImageFormat>,
}

impl ImageDescriptor {
    /// Read the container header without decoding pixel data.
    pub fn read(path: &Path) -> Result<Self> {
        let reader = ImageReader::open(path)
            .map_err(|e| Error::io_with_path(e, path))?
            .with_guessed_format()
            .map_err(|e| Error::io_with_path(e, path))?;

        let detected = reader
            .format()
            .ok_or_else(|| Error::unsupported_format(path, None))?;
        let container = ImageFormat::from_container(detected);
        let decoder = reader.into_decoder().map_err(|e| Error::decode(path, e))?;
        let (width, height) = decoder.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::invalid_image(path, "image has no pixels"));
        }

        Ok(Self {
            format: container
                .map(|f| f.name().to_string())
                .unwrap_or_else(|| format!("{:?}", detected).to_uppercase()),
            color_mode: color_mode_name(decoder.color_type()),
            dimensions: (width, height),
            container,
        })
    }

    /// The descriptive fields as label/value pairs.
    pub fn fields(&self) -> [(&'static str, String); 3] {
        let (width, height) = self.dimensions;
        [
            (DESCRIPTIVE_FIELDS[0], self.format.clone()),
            (DESCRIPTIVE_FIELDS[1], self.color_mode.clone()),
            (DESCRIPTIVE_FIELDS[2], format!("({}, {})", width, height)),
        ]
    }
}

/// Short color mode names.
fn color_mode_name(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;32F",
        ColorType::Rgba32F => "RGBA;32F",
        other => return format!("{:?}", other),
    }
    .to_string()
}

/// Tag name to value mapping for one image, plus its descriptive fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataSnapshot {
    /// Provenance and identity tags, keyed by resolved name.
    pub tags: BTreeMap<String, Value>,
    /// Container description; absent only when extraction failed.
    pub descriptor: Option<ImageDescriptor>,
}

impl MetadataSnapshot {
    /// A snapshot holding only an extraction error.
    pub fn error(message: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(ERROR_KEY.to_string(), Value::Text(message.into()));
        Self {
            tags,
            descriptor: None,
        }
    }

    /// True when no tags besides the descriptive fields were found.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tags.get(name)
    }

    /// Tag names in sorted order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// The extraction error, if the snapshot collapsed to one.
    pub fn error_message(&self) -> Option<&str> {
        if self.descriptor.is_some() {
            return None;
        }
        self.tags.get(ERROR_KEY).and_then(Value::as_text)
    }
}

/// A raw primary tag before names are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub id: u16,
    pub value: TagValue,
}

/// Raw tag payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// A plain value.
    Scalar(Value),
    /// An unresolved pointer to a nested directory.
    Offset(u32),
    /// A nested directory the parser already resolved.
    Directory(Vec<(u16, Value)>),
}

/// Extract a snapshot from an image file. Never fails.
pub fn extract(path: &Path) -> MetadataSnapshot {
    match try_extract(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "metadata extraction failed");
            MetadataSnapshot::error(e.to_string())
        }
    }
}

fn try_extract(path: &Path) -> Result<MetadataSnapshot> {
    let descriptor = ImageDescriptor::read(path)?;

    let tags = match descriptor.container {
        Some(container) => match read_exif(path, container)? {
            Some(exif) => assemble(
                read_primary_tags(&exif),
                |offset| resolve_gps_offset(&exif, offset),
                container == ImageFormat::Tiff,
            ),
            None => BTreeMap::new(),
        },
        None => BTreeMap::new(),
    };

    debug!(path = %path.display(), tags = tags.len(), "extracted metadata");
    Ok(MetadataSnapshot {
        tags,
        descriptor: Some(descriptor),
    })
}

/// Read the EXIF block of a file, if the container has one.
pub fn read_exif(path: &Path, format: ImageFormat) -> Result<Option<exif::Exif>> {
    if !format.carries_exif() {
        return Ok(None);
    }

    let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
    match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List the primary tag table (IFD0 and the Exif sub-directory).
///
/// GPS fields the parser resolved are gathered into one directory entry
/// under the GPS pointer id. If it resolved none but IFD0 still carries the
/// pointer, the entry holds the bare offset instead.
pub fn read_primary_tags(exif: &exif::Exif) -> Vec<RawTag> {
    let mut tags = Vec::new();
    let mut gps = Vec::new();

    for field in exif.fields() {
        if field.ifd_num != exif::In::PRIMARY {
            continue;
        }
        let id = field.tag.number();
        match field.tag.context() {
            exif::Context::Gps => gps.push((id, Value::from(&field.value))),
            exif::Context::Tiff | exif::Context::Exif => {
                if matches!(
                    id,
                    ifd_tags::EXIF_IFD | ifd_tags::GPS_IFD | ifd_tags::INTEROPERABILITY_IFD
                ) {
                    continue;
                }
                tags.push(RawTag {
                    id,
                    value: TagValue::Scalar(Value::from(&field.value)),
                });
            }
            _ => {}
        }
    }

    if !gps.is_empty() {
        tags.push(RawTag {
            id: ifd_tags::GPS_IFD,
            value: TagValue::Directory(gps),
        });
    } else if let Some(offset) = ifd::find_pointer(exif.buf(), ifd_tags::GPS_IFD) {
        tags.push(RawTag {
            id: ifd_tags::GPS_IFD,
            value: TagValue::Offset(offset),
        });
    }

    tags
}

/// Follow a GPS directory offset through the raw EXIF buffer.
pub fn resolve_gps_offset(exif: &exif::Exif, offset: u32) -> Option<Vec<(u16, Value)>> {
    ifd::dereference(exif.buf(), offset)
}

/// Build the name/value mapping from primary tags.
///
/// `dereference` is consulted only when the GPS entry is a bare offset,
/// whether typed as one or read as a plain integer. When
/// it resolves, its result is final for this pass. Later tags that resolve
/// to an existing name overwrite it. With `skip_structural`, TIFF pixel
/// layout tags are left out.
pub fn assemble<F>(
    primary: Vec<RawTag>,
    dereference: F,
    skip_structural: bool,
) -> BTreeMap<String, Value>
where
    F: FnOnce(u32) -> Option<Vec<(u16, Value)>>,
{
    let mut metadata = BTreeMap::new();
    let mut gps_resolved = false;

    let gps_offset = primary
        .iter()
        .filter(|tag| resolve(Namespace::Primary, tag.id) == GPS_INFO)
        .find_map(|tag| match tag.value {
            TagValue::Offset(offset) => Some(offset),
            TagValue::Scalar(Value::Int(offset)) => u32::try_from(offset).ok(),
            _ => None,
        });

    if let Some(entries) = gps_offset.and_then(dereference) {
        metadata.insert(GPS_INFO.to_string(), gps_map(entries));
        gps_resolved = true;
    }

    for tag in primary {
        if skip_structural && ifd::is_structural_tag(tag.id) {
            continue;
        }

        let name = resolve(Namespace::Primary, tag.id);
        if name == GPS_INFO && gps_resolved {
            continue;
        }

        let value = match (name.as_str(), tag.value) {
            (GPS_INFO, TagValue::Directory(entries)) => gps_map(entries),
            (GPS_INFO, TagValue::Offset(offset)) => offset_note(i64::from(offset)),
            (GPS_INFO, TagValue::Scalar(Value::Int(offset))) => offset_note(offset),
            (MAKER_NOTE, TagValue::Scalar(Value::Bytes(bytes))) => Value::Text(format!(
                "<Proprietary data: {} bytes - May contain device serial numbers>",
                bytes.len()
            )),
            (MAKER_NOTE, _) => Value::Text(String::from(
                "<Proprietary manufacturer data - May contain device serial numbers>",
            )),
            (_, TagValue::Scalar(value)) => coerce(&name, value),
            (_, TagValue::Offset(offset)) => Value::Int(i64::from(offset)),
            (_, TagValue::Directory(entries)) => Value::Map(
                entries
                    .into_iter()
                    .map(|(id, v)| (resolve(Namespace::Primary, id), v))
                    .collect(),
            ),
        };

        metadata.insert(name, value);
    }

    metadata
}

fn gps_map(entries: Vec<(u16, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(id, value)| (resolve(Namespace::Gps, id), value))
            .collect(),
    )
}

fn offset_note(offset: i64) -> Value {
    Value::Text(format!(
        "IFD offset: {} (GPS data pointer, not actual GPS coordinates)",
        offset
    ))
}

/// Make a primary value printable: bytes become text, sequences a joined list.
fn coerce(name: &str, value: Value) -> Value {
    match value {
        Value::Bytes(bytes) => {
            let body = if name == "UserComment" {
                strip_comment_header(&bytes)
            } else {
                &bytes
            };
            Value::Text(decode_bytes(body))
        }
        seq @ Value::Seq(_) => Value::Text(seq.to_string()),
        other => other,
    }
}

fn strip_comment_header(bytes: &[u8]) -> &[u8] {
    match bytes.get(..8) {
        Some(head) if USER_COMMENT_HEADERS.iter().any(|h| h.as_slice() == head) => &bytes[8..],
        _ => bytes,
    }
}

fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.chars().filter(|&c| c != '\0').collect(),
        Err(_) => format!("<bytes: {} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(id: u16, value: Value) -> RawTag {
        RawTag {
            id,
            value: TagValue::Scalar(value),
        }
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_names_are_resolved() {
        let tags = assemble(
            vec![scalar(0x010F, text("AcmeCorp")), scalar(0x0110, text("X100"))],
            |_| None,
            false,
        );
        assert_eq!(tags.get("Make"), Some(&text("AcmeCorp")));
        assert_eq!(tags.get("Model"), Some(&text("X100")));
    }

    #[test]
    fn test_gps_offset_without_fallback_is_explained() {
        let tags = assemble(
            vec![RawTag {
                id: ifd_tags::GPS_IFD,
                value: TagValue::Offset(1234),
            }],
            |_| None,
            false,
        );
        let value = tags.get(GPS_INFO).unwrap();
        assert_eq!(
            value.as_text(),
            Some("IFD offset: 1234 (GPS data pointer, not actual GPS coordinates)")
        );
        assert_ne!(value, &Value::Int(1234));
    }

    #[test]
    fn test_gps_bare_integer_is_explained() {
        let tags = assemble(vec![scalar(ifd_tags::GPS_IFD, Value::Int(26))], |_| None, false);
        assert!(tags[GPS_INFO].as_text().unwrap().starts_with("IFD offset: 26"));
    }

    #[test]
    fn test_gps_offset_is_dereferenced() {
        let mut asked = None;
        let tags = assemble(
            vec![RawTag {
                id: ifd_tags::GPS_IFD,
                value: TagValue::Offset(98),
            }],
            |offset| {
                asked = Some(offset);
                Some(vec![(1, text("N")), (2, Value::from_floats([40.0, 0.0, 0.0]))])
            },
            false,
        );

        assert_eq!(asked, Some(98));
        let gps = tags[GPS_INFO].as_map().unwrap();
        assert_eq!(gps.get("GPSLatitudeRef"), Some(&text("N")));
        assert_eq!(gps.get("GPSLatitude").unwrap().to_string(), "40, 0, 0");
    }

    #[test]
    fn test_gps_bare_integer_is_dereferenced() {
        let mut asked = None;
        let tags = assemble(
            vec![scalar(ifd_tags::GPS_IFD, Value::Int(26))],
            |offset| {
                asked = Some(offset);
                Some(vec![(1, text("S"))])
            },
            false,
        );

        assert_eq!(asked, Some(26));
        assert_eq!(
            tags[GPS_INFO].as_map().unwrap().get("GPSLatitudeRef"),
            Some(&text("S"))
        );

        let tags = assemble(
            vec![scalar(ifd_tags::GPS_IFD, Value::Int(-1))],
            |_| panic!("negative offsets are not followed"),
            false,
        );
        assert!(tags[GPS_INFO].as_text().unwrap().starts_with("IFD offset: -1"));
    }

    #[test]
    fn test_fallback_not_consulted_for_resolved_directory() {
        let tags = assemble(
            vec![RawTag {
                id: ifd_tags::GPS_IFD,
                value: TagValue::Directory(vec![(6, Value::Float(12.5))]),
            }],
            |_| panic!("directory was already resolved"),
            false,
        );
        assert_eq!(
            tags[GPS_INFO].as_map().unwrap().get("GPSAltitude"),
            Some(&Value::Float(12.5))
        );
    }

    #[test]
    fn test_maker_note_is_redacted() {
        let tags = assemble(
            vec![scalar(0x927C, Value::Bytes(b"SERIAL=12345".to_vec()))],
            |_| None,
            false,
        );
        let note = tags[MAKER_NOTE].as_text().unwrap();
        assert_eq!(
            note,
            "<Proprietary data: 12 bytes - May contain device serial numbers>"
        );
        assert!(!note.contains("12345"));

        let tags = assemble(vec![scalar(0x927C, Value::Int(3))], |_| None, false);
        assert!(tags[MAKER_NOTE].as_text().unwrap().starts_with("<Proprietary manufacturer"));
    }

    #[test]
    fn test_bytes_and_sequences_are_coerced() {
        let tags = assemble(
            vec![
                scalar(0x9286, Value::Bytes(b"ASCII\0\0\0hello there".to_vec())),
                scalar(0x013B, Value::Bytes(vec![0xFF, 0xFE, 0xFD])),
                scalar(0x0212, Value::from_ints([2, 1])),
            ],
            |_| None,
            false,
        );
        assert_eq!(tags["UserComment"], text("hello there"));
        assert_eq!(tags["Artist"], text("<bytes: 3 bytes>"));
        assert_eq!(tags["YCbCrSubSampling"], text("2, 1"));
    }

    #[test]
    fn test_structural_tags_skipped_on_request() {
        let primary = vec![scalar(0x0100, Value::Int(64)), scalar(0x010F, text("Acme"))];
        let with = assemble(primary.clone(), |_| None, false);
        let without = assemble(primary, |_| None, true);
        assert!(with.contains_key("ImageWidth"));
        assert!(!without.contains_key("ImageWidth"));
        assert!(without.contains_key("Make"));
    }

    #[test]
    fn test_unknown_tags_keep_numeric_name() {
        let tags = assemble(vec![scalar(0xFFF0, Value::Int(1))], |_| None, false);
        assert_eq!(tags.get("65520"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_error_snapshot() {
        let snapshot = MetadataSnapshot::error("cannot identify image file");
        assert_eq!(snapshot.error_message(), Some("cannot identify image file"));
        assert!(snapshot.descriptor.is_none());
        assert_eq!(snapshot.tag_names().collect::<Vec<_>>(), vec![ERROR_KEY]);
    }

    #[test]
    fn test_extract_missing_file_collapses_to_error() {
        let snapshot = extract(Path::new("/definitely/not/here.jpg"));
        assert!(snapshot.error_message().is_some());
    }

    #[test]
    fn test_descriptor_fields() {
        let descriptor = ImageDescriptor {
            format: String::from("PNG"),
            color_mode: String::from("RGBA"),
            dimensions: (4, 3),
            container: Some(ImageFormat::Png),
        };
        let fields = descriptor.fields();
        assert_eq!(fields[0], ("Image Format", String::from("PNG")));
        assert_eq!(fields[2], ("Image Size", String::from("(4, 3)")));
    }

    #[test]
    fn test_primary_tags_from_parsed_exif() {
        use crate::formats::ifd::testing::{Entry, build_tiff};

        let tiff = build_tiff(
            vec![Entry::ascii(0x010F, "AcmeCorp")],
            vec![Entry::ascii(0xA431, "SN123")],
            vec![Entry::rationals(2, &[(40, 1), (0, 1), (0, 1)])],
        );
        let exif = exif::Reader::new().read_raw(tiff).unwrap();

        let primary = read_primary_tags(&exif);
        assert!(primary.iter().all(|t| t.id != ifd_tags::EXIF_IFD));

        let tags = assemble(primary, |offset| resolve_gps_offset(&exif, offset), false);
        assert_eq!(tags["Make"], text("AcmeCorp"));
        assert_eq!(tags["BodySerialNumber"], text("SN123"));
        assert!(tags[GPS_INFO].as_map().unwrap().contains_key("GPSLatitude"));
    }

    #[test]
    fn test_empty_gps_directory_keeps_pointer() {
        use crate::formats::ifd::testing::{Entry, build_tiff};

        // The pointer lands just past IFD0, where an empty directory follows.
        let mut tiff = build_tiff(
            vec![Entry::ascii(0x010F, "Acme"), Entry::long(ifd_tags::GPS_IFD, 0)],
            vec![],
            vec![],
        );
        tiff.extend_from_slice(&[0; 6]);
        let pointer = ifd::find_pointer(&tiff, ifd_tags::GPS_IFD).unwrap();
        let exif = exif::Reader::new().read_raw(tiff).unwrap();

        let primary = read_primary_tags(&exif);
        assert!(primary.iter().any(|t| matches!(t.value, TagValue::Offset(o) if o == pointer)));

        let tags = assemble(primary, |offset| resolve_gps_offset(&exif, offset), false);
        let note = tags[GPS_INFO].as_text().unwrap();
        assert_eq!(
            note,
            format!("IFD offset: {pointer} (GPS data pointer, not actual GPS coordinates)")
        );
        assert_eq!(tags["Make"], text("Acme"));
    }
}
