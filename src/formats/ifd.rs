//! Raw TIFF directory reader for EXIF buffers.
//!
//! An EXIF block is a small TIFF file: an 8-byte header followed by Image
//! File Directories (IFDs). Each IFD holds 12-byte entries:
//!
//! - tag (2 bytes)
//! - field type (2 bytes)
//! - value count (4 bytes)
//! - value, or offset to the value when it does not fit in 4 bytes
//!
//! Nested tables such as the GPS directory are referenced from IFD0 by an
//! offset-valued pointer tag. This reader walks those tables directly,
//! independent of the higher level EXIF parser.

use crate::metadata::Value;

/// Byte order markers.
const LITTLE_ENDIAN: [u8; 2] = [0x49, 0x49]; // "II"
const BIG_ENDIAN: [u8; 2] = [0x4D, 0x4D]; // "MM"

/// Upper bound on entries read from one directory.
const MAX_ENTRIES: usize = 1024;

/// Byte order for reading multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn read_u16(&self, data: &[u8]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes([data[0], data[1]]),
            ByteOrder::Big => u16::from_be_bytes([data[0], data[1]]),
        }
    }

    fn read_u32(&self, data: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            ByteOrder::Big => u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
        }
    }

    fn read_u64(&self, data: &[u8]) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&data[..8]);
        match self {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        }
    }
}

/// TIFF tag IDs.
pub mod tags {
    // Pointers to nested directories.
    pub const EXIF_IFD: u16 = 34665;
    pub const GPS_IFD: u16 = 34853;
    pub const INTEROPERABILITY_IFD: u16 = 40965;

    // Baseline tags that describe pixel layout.
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const X_RESOLUTION: u16 = 282;
    pub const Y_RESOLUTION: u16 = 283;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const RESOLUTION_UNIT: u16 = 296;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const EXTRA_SAMPLES: u16 = 338;
    pub const SAMPLE_FORMAT: u16 = 339;
}

/// Tags that describe a TIFF container's own pixel layout.
pub const STRUCTURAL_TAGS: &[u16] = &[
    tags::IMAGE_WIDTH,
    tags::IMAGE_LENGTH,
    tags::BITS_PER_SAMPLE,
    tags::COMPRESSION,
    tags::PHOTOMETRIC_INTERPRETATION,
    tags::STRIP_OFFSETS,
    tags::SAMPLES_PER_PIXEL,
    tags::ROWS_PER_STRIP,
    tags::STRIP_BYTE_COUNTS,
    tags::X_RESOLUTION,
    tags::Y_RESOLUTION,
    tags::PLANAR_CONFIGURATION,
    tags::RESOLUTION_UNIT,
    tags::PREDICTOR,
    tags::TILE_WIDTH,
    tags::TILE_LENGTH,
    tags::TILE_OFFSETS,
    tags::TILE_BYTE_COUNTS,
    tags::EXTRA_SAMPLES,
    tags::SAMPLE_FORMAT,
];

/// Check if a tag only describes the container's pixel layout.
pub fn is_structural_tag(tag: u16) -> bool {
    STRUCTURAL_TAGS.contains(&tag)
}

/// TIFF field type sizes.
fn type_size(field_type: u16) -> usize {
    match field_type {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 1,
    }
}

/// An IFD entry.
#[derive(Debug, Clone)]
struct IfdEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value_offset: [u8; 4],
}

impl IfdEntry {
    /// Total value size in bytes, if it does not overflow.
    fn byte_len(&self) -> Option<usize> {
        type_size(self.field_type).checked_mul(self.count as usize)
    }

    /// Check if the value is stored inline (within the 4-byte value field).
    fn is_inline(&self) -> bool {
        self.byte_len().is_some_and(|len| len <= 4)
    }

    /// Borrow the raw value bytes, following the offset when needed.
    fn value_bytes<'a>(&'a self, buf: &'a [u8], order: ByteOrder) -> Option<&'a [u8]> {
        let len = self.byte_len()?;
        if self.is_inline() {
            return Some(&self.value_offset[..len]);
        }
        let start = order.read_u32(&self.value_offset) as usize;
        let end = start.checked_add(len)?;
        buf.get(start..end)
    }

    /// Decode the entry into a report value.
    fn decode(&self, buf: &[u8], order: ByteOrder) -> Option<Value> {
        let raw = self.value_bytes(buf, order)?;
        let size = type_size(self.field_type);
        let items = raw.chunks_exact(size);

        let value = match self.field_type {
            1 if raw.len() == 1 => Value::Int(i64::from(raw[0])),
            1 | 7 => Value::Bytes(raw.to_vec()),
            2 => Value::from_ascii(raw.split(|&b| b == 0).filter(|p| !p.is_empty())),
            3 => Value::from_ints(items.map(|c| i64::from(order.read_u16(c)))),
            4 => Value::from_ints(items.map(|c| i64::from(order.read_u32(c)))),
            6 => Value::from_ints(raw.iter().map(|&b| i64::from(b as i8))),
            8 => Value::from_ints(items.map(|c| i64::from(order.read_u16(c) as i16))),
            9 => Value::from_ints(items.map(|c| i64::from(order.read_u32(c) as i32))),
            5 => Value::from_floats(items.map(|c| {
                f64::from(order.read_u32(c)) / f64::from(order.read_u32(&c[4..]))
            })),
            10 => Value::from_floats(items.map(|c| {
                f64::from(order.read_u32(c) as i32) / f64::from(order.read_u32(&c[4..]) as i32)
            })),
            11 => Value::from_floats(items.map(|c| f64::from(f32::from_bits(order.read_u32(c))))),
            12 => Value::from_floats(items.map(|c| f64::from_bits(order.read_u64(c)))),
            _ => return None,
        };
        Some(value)
    }
}

/// Parse the TIFF header, returning byte order and the IFD0 offset.
fn parse_header(buf: &[u8]) -> Option<(ByteOrder, usize)> {
    if buf.len() < 8 {
        return None;
    }

    let order = if buf[0..2] == LITTLE_ENDIAN {
        ByteOrder::Little
    } else if buf[0..2] == BIG_ENDIAN {
        ByteOrder::Big
    } else {
        return None;
    };

    if order.read_u16(&buf[2..]) != 42 {
        return None;
    }

    Some((order, order.read_u32(&buf[4..]) as usize))
}

/// Parse IFD entries at `offset`.
fn parse_ifd(buf: &[u8], offset: usize, order: ByteOrder) -> Option<Vec<IfdEntry>> {
    let count_bytes = buf.get(offset..offset.checked_add(2)?)?;
    let num_entries = order.read_u16(count_bytes) as usize;
    if num_entries > MAX_ENTRIES {
        return None;
    }

    let mut entries = Vec::with_capacity(num_entries);
    let mut pos = offset + 2;

    for _ in 0..num_entries {
        let raw = buf.get(pos..pos + 12)?;
        entries.push(IfdEntry {
            tag: order.read_u16(raw),
            field_type: order.read_u16(&raw[2..]),
            count: order.read_u32(&raw[4..]),
            value_offset: [raw[8], raw[9], raw[10], raw[11]],
        });
        pos += 12;
    }

    Some(entries)
}

/// Find an offset-valued pointer tag in IFD0.
///
/// Returns the raw offset without following it.
pub fn find_pointer(buf: &[u8], tag: u16) -> Option<u32> {
    let (order, ifd0) = parse_header(buf)?;
    let entries = parse_ifd(buf, ifd0, order)?;

    entries
        .iter()
        .find(|e| e.tag == tag && matches!(e.field_type, 4 | 13) && e.count == 1)
        .map(|e| order.read_u32(&e.value_offset))
}

/// Follow an IFD offset and decode every entry of the directory it names.
///
/// Returns `None` when the offset does not land on a readable directory.
/// Entries with unknown field types or out-of-range values are skipped.
pub fn dereference(buf: &[u8], offset: u32) -> Option<Vec<(u16, Value)>> {
    let (order, _) = parse_header(buf)?;
    let entries = parse_ifd(buf, offset as usize, order)?;

    let decoded: Vec<(u16, Value)> = entries
        .iter()
        .filter_map(|e| e.decode(buf, order).map(|v| (e.tag, v)))
        .collect();

    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builder for small little-endian TIFF/EXIF buffers.

    /// One directory entry to encode.
    #[derive(Debug, Clone)]
    pub struct Entry {
        pub tag: u16,
        pub field_type: u16,
        pub count: u32,
        pub data: Vec<u8>,
    }

    impl Entry {
        pub fn ascii(tag: u16, text: &str) -> Self {
            let mut data = text.as_bytes().to_vec();
            data.push(0);
            Self {
                tag,
                field_type: 2,
                count: data.len() as u32,
                data,
            }
        }

        pub fn long(tag: u16, value: u32) -> Self {
            Self {
                tag,
                field_type: 4,
                count: 1,
                data: value.to_le_bytes().to_vec(),
            }
        }

        pub fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
            let mut data = Vec::new();
            for (num, den) in values {
                data.extend_from_slice(&num.to_le_bytes());
                data.extend_from_slice(&den.to_le_bytes());
            }
            Self {
                tag,
                field_type: 5,
                count: values.len() as u32,
                data,
            }
        }

        pub fn undefined(tag: u16, bytes: &[u8]) -> Self {
            Self {
                tag,
                field_type: 7,
                count: bytes.len() as u32,
                data: bytes.to_vec(),
            }
        }
    }

    fn padded_len(data: &[u8]) -> u32 {
        if data.len() <= 4 {
            0
        } else {
            (data.len() + data.len() % 2) as u32
        }
    }

    fn ifd_len(entries: &[Entry]) -> u32 {
        let extra: u32 = entries.iter().map(|e| padded_len(&e.data)).sum();
        2 + 12 * entries.len() as u32 + 4 + extra
    }

    fn encode_ifd(entries: &[Entry], base: u32) -> Vec<u8> {
        let mut head = Vec::new();
        let mut extra = Vec::new();
        let data_start = base + 2 + 12 * entries.len() as u32 + 4;

        head.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for e in entries {
            head.extend_from_slice(&e.tag.to_le_bytes());
            head.extend_from_slice(&e.field_type.to_le_bytes());
            head.extend_from_slice(&e.count.to_le_bytes());
            if e.data.len() <= 4 {
                let mut inline = e.data.clone();
                inline.resize(4, 0);
                head.extend_from_slice(&inline);
            } else {
                let offset = data_start + extra.len() as u32;
                head.extend_from_slice(&offset.to_le_bytes());
                extra.extend_from_slice(&e.data);
                if extra.len() % 2 == 1 {
                    extra.push(0);
                }
            }
        }
        head.extend_from_slice(&0u32.to_le_bytes());
        head.extend_from_slice(&extra);
        head
    }

    /// Encode IFD0 plus optional Exif and GPS sub-directories.
    pub fn build_tiff(mut ifd0: Vec<Entry>, exif: Vec<Entry>, gps: Vec<Entry>) -> Vec<u8> {
        if !exif.is_empty() {
            ifd0.push(Entry::long(super::tags::EXIF_IFD, 0));
        }
        if !gps.is_empty() {
            ifd0.push(Entry::long(super::tags::GPS_IFD, 0));
        }
        ifd0.sort_by_key(|e| e.tag);

        let exif_offset = 8 + ifd_len(&ifd0);
        let gps_offset = exif_offset + if exif.is_empty() { 0 } else { ifd_len(&exif) };
        for e in &mut ifd0 {
            if e.tag == super::tags::EXIF_IFD {
                e.data = exif_offset.to_le_bytes().to_vec();
            } else if e.tag == super::tags::GPS_IFD {
                e.data = gps_offset.to_le_bytes().to_vec();
            }
        }

        let mut out = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        out.extend(encode_ifd(&ifd0, 8));
        if !exif.is_empty() {
            out.extend(encode_ifd(&exif, exif_offset));
        }
        if !gps.is_empty() {
            out.extend(encode_ifd(&gps, gps_offset));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Entry, build_tiff};
    use super::*;

    fn gps_sample() -> Vec<u8> {
        build_tiff(
            vec![Entry::ascii(271, "AcmeCorp")],
            vec![],
            vec![
                Entry::ascii(1, "N"),
                Entry::rationals(2, &[(40, 1), (0, 1), (0, 1)]),
                Entry::rationals(6, &[(25, 2)]),
            ],
        )
    }

    #[test]
    fn test_parse_header_rejects_garbage() {
        assert!(parse_header(b"not a tiff").is_none());
        assert!(parse_header(&[0x49, 0x49]).is_none());
        assert!(parse_header(&[0x49, 0x49, 0x2B, 0x00, 8, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_find_pointer_returns_raw_offset() {
        let buf = gps_sample();
        let offset = find_pointer(&buf, tags::GPS_IFD).unwrap();
        assert!(offset > 8);
        assert!((offset as usize) < buf.len());
        assert!(find_pointer(&buf, tags::EXIF_IFD).is_none());
    }

    #[test]
    fn test_dereference_gps_directory() {
        let buf = gps_sample();
        let offset = find_pointer(&buf, tags::GPS_IFD).unwrap();
        let entries = dereference(&buf, offset).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (1, Value::Text(String::from("N"))));
        assert_eq!(
            entries[1],
            (2, Value::Seq(vec![Value::Float(40.0), Value::Float(0.0), Value::Float(0.0)]))
        );
        assert_eq!(entries[2], (6, Value::Float(12.5)));
    }

    #[test]
    fn test_dereference_out_of_range() {
        let buf = gps_sample();
        assert!(dereference(&buf, 10_000).is_none());
        assert!(dereference(&buf[..12], 8).is_none());
    }

    #[test]
    fn test_inline_undefined_value() {
        let buf = build_tiff(vec![Entry::undefined(0x9000, b"0232")], vec![], vec![]);
        let entries = dereference(&buf, 8).unwrap();
        assert_eq!(entries[0], (0x9000, Value::Bytes(b"0232".to_vec())));
    }

    #[test]
    fn test_structural_tags() {
        assert!(is_structural_tag(tags::IMAGE_WIDTH));
        assert!(is_structural_tag(tags::STRIP_OFFSETS));
        assert!(!is_structural_tag(271));
        assert!(!is_structural_tag(tags::GPS_IFD));
    }
}
