//! Parser for the Android binary XML format used by `AndroidManifest.xml`.
//!
//! APK manifests are compiled by `aapt2` into a chunked binary encoding: a
//! string pool followed by a flattened element stream whose attribute values
//! are typed (string-pool references, integers, booleans). This module reads
//! just enough of that encoding to answer the publishing questions: package
//! name, version code, version name and minSdkVersion.

use thiserror::Error;

/// Chunk type for the whole document.
const RES_XML_TYPE: u16 = 0x0003;
/// Chunk type for the string pool.
const RES_STRING_POOL_TYPE: u16 = 0x0001;
/// Chunk type for an element start tag.
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;

/// String pool flag: strings are UTF-8 encoded rather than UTF-16.
const UTF8_FLAG: u32 = 1 << 8;

/// Typed value holding a string-pool reference.
const TYPE_STRING: u8 = 0x03;
/// Typed value holding a decimal integer.
const TYPE_INT_DEC: u8 = 0x10;
/// Typed value holding a hexadecimal integer.
const TYPE_INT_HEX: u8 = 0x11;

/// Errors raised while decoding a binary manifest
#[derive(Error, Debug)]
pub enum AxmlError {
    /// The data ended before a complete chunk could be read
    #[error("truncated chunk at offset {offset}")]
    Truncated {
        /// Offset at which data ran out
        offset: usize,
    },

    /// The document does not start with a binary XML header
    #[error("not a binary XML document (type 0x{found:04x})")]
    NotBinaryXml {
        /// Chunk type found instead
        found: u16,
    },

    /// A string pool index was out of range
    #[error("string pool index {index} out of range")]
    BadStringIndex {
        /// The offending index
        index: usize,
    },

    /// The manifest element is missing a required attribute
    #[error("manifest has no {attribute} attribute")]
    MissingAttribute {
        /// Attribute name
        attribute: &'static str,
    },
}

/// The subset of manifest fields the publisher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Application id from the `package` attribute
    pub package_name: String,
    /// `android:versionCode`
    pub version_code: i64,
    /// `android:versionName`, if declared
    pub version_name: Option<String>,
    /// `android:minSdkVersion` from `<uses-sdk>`, if declared
    pub min_sdk_version: Option<String>,
}

/// Parses a compiled `AndroidManifest.xml` document.
pub fn parse_manifest(data: &[u8]) -> Result<ManifestInfo, AxmlError> {
    let header = ChunkHeader::read(data, 0)?;
    if header.chunk_type != RES_XML_TYPE {
        return Err(AxmlError::NotBinaryXml {
            found: header.chunk_type,
        });
    }

    let mut strings: Vec<String> = Vec::new();
    let mut package_name = None;
    let mut version_code = None;
    let mut version_name = None;
    let mut min_sdk_version = None;

    let mut offset = header.header_size as usize;
    while offset + 8 <= data.len() {
        let chunk = ChunkHeader::read(data, offset)?;
        let chunk_end = offset
            .checked_add(chunk.size as usize)
            .filter(|end| *end <= data.len())
            .ok_or(AxmlError::Truncated { offset })?;

        match chunk.chunk_type {
            RES_STRING_POOL_TYPE => {
                strings = parse_string_pool(&data[offset..chunk_end])?;
            }
            RES_XML_START_ELEMENT_TYPE => {
                let element = Element::read(data, offset, chunk_end, &strings)?;
                match element.name.as_str() {
                    "manifest" => {
                        package_name = element.string_attribute("package");
                        version_code = element.int_attribute("versionCode");
                        version_name = element.string_attribute("versionName");
                    }
                    "uses-sdk" => {
                        // minSdkVersion is usually an integer, but codename
                        // releases declare it as a string
                        min_sdk_version = element
                            .int_attribute("minSdkVersion")
                            .map(|v| v.to_string())
                            .or_else(|| element.string_attribute("minSdkVersion"));
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        // A zero-size chunk would loop forever
        if chunk.size < 8 {
            return Err(AxmlError::Truncated { offset });
        }
        offset = chunk_end;
    }

    Ok(ManifestInfo {
        package_name: package_name.ok_or(AxmlError::MissingAttribute {
            attribute: "package",
        })?,
        version_code: version_code.ok_or(AxmlError::MissingAttribute {
            attribute: "versionCode",
        })? as i64,
        version_name,
        min_sdk_version,
    })
}

/// Common 8-byte header prefix of every chunk.
struct ChunkHeader {
    chunk_type: u16,
    header_size: u16,
    size: u32,
}

impl ChunkHeader {
    fn read(data: &[u8], offset: usize) -> Result<Self, AxmlError> {
        Ok(Self {
            chunk_type: read_u16(data, offset)?,
            header_size: read_u16(data, offset + 2)?,
            size: read_u32(data, offset + 4)?,
        })
    }
}

/// One decoded start-element chunk.
struct Element {
    name: String,
    attributes: Vec<Attribute>,
}

/// One decoded attribute with its typed value.
struct Attribute {
    name: String,
    raw_value: Option<String>,
    data_type: u8,
    data: u32,
}

impl Element {
    fn read(
        data: &[u8],
        offset: usize,
        chunk_end: usize,
        strings: &[String],
    ) -> Result<Self, AxmlError> {
        // Node header: chunk header, line number, comment. The attribute
        // extension begins right after it.
        let ext = offset + 16;
        let name_index = read_u32(data, ext + 4)? as usize;
        let attribute_start = read_u16(data, ext + 8)? as usize;
        let attribute_size = read_u16(data, ext + 10)? as usize;
        let attribute_count = read_u16(data, ext + 12)? as usize;

        let name = pool_string(strings, name_index)?;

        let mut attributes = Vec::with_capacity(attribute_count);
        for i in 0..attribute_count {
            let at = ext + attribute_start + i * attribute_size;
            if at + 20 > chunk_end {
                return Err(AxmlError::Truncated { offset: at });
            }
            let attr_name_index = read_u32(data, at + 4)? as usize;
            let raw_value_index = read_u32(data, at + 8)? as usize;
            let data_type = read_u8(data, at + 15)?;
            let value_data = read_u32(data, at + 16)?;

            attributes.push(Attribute {
                name: pool_string(strings, attr_name_index)?,
                raw_value: (raw_value_index != 0xffff_ffff)
                    .then(|| pool_string(strings, raw_value_index))
                    .transpose()?,
                data_type,
                data: value_data,
            });
        }

        Ok(Self { name, attributes })
    }

    /// Looks up a string-valued attribute by name.
    fn string_attribute(&self, name: &str) -> Option<String> {
        self.attributes.iter().find(|a| a.name == name).and_then(|a| {
            a.raw_value
                .clone()
                .or_else(|| match a.data_type {
                    TYPE_INT_DEC | TYPE_INT_HEX => Some(a.data.to_string()),
                    _ => None,
                })
        })
    }

    /// Looks up an integer-valued attribute by name.
    fn int_attribute(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name && matches!(a.data_type, TYPE_INT_DEC | TYPE_INT_HEX))
            .map(|a| a.data)
    }
}

fn parse_string_pool(chunk: &[u8]) -> Result<Vec<String>, AxmlError> {
    let header_size = read_u16(chunk, 2)? as usize;
    let string_count = read_u32(chunk, 8)? as usize;
    let flags = read_u32(chunk, 16)?;
    let strings_start = read_u32(chunk, 20)? as usize;

    let utf8 = flags & UTF8_FLAG != 0;
    let mut strings = Vec::with_capacity(string_count);
    for i in 0..string_count {
        let rel = read_u32(chunk, header_size + i * 4)? as usize;
        let at = strings_start + rel;
        let s = if utf8 {
            read_utf8_string(chunk, at)?
        } else {
            read_utf16_string(chunk, at)?
        };
        strings.push(s);
    }
    Ok(strings)
}

fn read_utf16_string(data: &[u8], offset: usize) -> Result<String, AxmlError> {
    let mut at = offset;
    let mut len = read_u16(data, at)? as usize;
    at += 2;
    if len & 0x8000 != 0 {
        // Two-word length for strings longer than 32767 code units
        len = ((len & 0x7fff) << 16) | read_u16(data, at)? as usize;
        at += 2;
    }

    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(read_u16(data, at)?);
        at += 2;
    }
    Ok(String::from_utf16_lossy(&units))
}

fn read_utf8_string(data: &[u8], offset: usize) -> Result<String, AxmlError> {
    let mut at = offset;
    // UTF-16 length, then byte length, each 1 or 2 bytes
    let (_, skipped) = read_utf8_length(data, at)?;
    at += skipped;
    let (byte_len, skipped) = read_utf8_length(data, at)?;
    at += skipped;

    let end = at
        .checked_add(byte_len)
        .filter(|end| *end <= data.len())
        .ok_or(AxmlError::Truncated { offset: at })?;
    Ok(String::from_utf8_lossy(&data[at..end]).into_owned())
}

fn read_utf8_length(data: &[u8], offset: usize) -> Result<(usize, usize), AxmlError> {
    let first = read_u8(data, offset)? as usize;
    if first & 0x80 != 0 {
        let second = read_u8(data, offset + 1)? as usize;
        Ok((((first & 0x7f) << 8) | second, 2))
    } else {
        Ok((first, 1))
    }
}

fn pool_string(strings: &[String], index: usize) -> Result<String, AxmlError> {
    strings
        .get(index)
        .cloned()
        .ok_or(AxmlError::BadStringIndex { index })
}

fn read_u8(data: &[u8], offset: usize) -> Result<u8, AxmlError> {
    data.get(offset)
        .copied()
        .ok_or(AxmlError::Truncated { offset })
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, AxmlError> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(AxmlError::Truncated { offset })?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, AxmlError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(AxmlError::Truncated { offset })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal compiled manifest with a UTF-16 string pool, a
    /// `<manifest>` element and a `<uses-sdk>` element.
    fn build_manifest(package: &str, version_code: u32, min_sdk: Option<u32>) -> Vec<u8> {
        let mut strings = vec![
            "package".to_string(),
            "versionCode".to_string(),
            "versionName".to_string(),
            "minSdkVersion".to_string(),
            "manifest".to_string(),
            "uses-sdk".to_string(),
            package.to_string(),
            "1.2.3".to_string(),
        ];
        let pool = build_string_pool(&mut strings);

        let mut elements = Vec::new();
        elements.extend(build_element(
            4,
            &[
                (0, Some(6), TYPE_STRING, 6),
                (1, None, TYPE_INT_DEC, version_code),
                (2, Some(7), TYPE_STRING, 7),
            ],
        ));
        if let Some(min_sdk) = min_sdk {
            elements.extend(build_element(5, &[(3, None, TYPE_INT_DEC, min_sdk)]));
        }

        let total = 8 + pool.len() + elements.len();
        let mut doc = Vec::with_capacity(total);
        doc.extend_from_slice(&RES_XML_TYPE.to_le_bytes());
        doc.extend_from_slice(&8u16.to_le_bytes());
        doc.extend_from_slice(&(total as u32).to_le_bytes());
        doc.extend_from_slice(&pool);
        doc.extend_from_slice(&elements);
        doc
    }

    fn build_string_pool(strings: &mut Vec<String>) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for s in strings.iter() {
            offsets.push(data.len() as u32);
            let units: Vec<u16> = s.encode_utf16().collect();
            data.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for unit in units {
                data.extend_from_slice(&unit.to_le_bytes());
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }

        let header_size = 28u16;
        let strings_start = header_size as u32 + offsets.len() as u32 * 4;
        let size = strings_start + data.len() as u32;

        let mut pool = Vec::with_capacity(size as usize);
        pool.extend_from_slice(&RES_STRING_POOL_TYPE.to_le_bytes());
        pool.extend_from_slice(&header_size.to_le_bytes());
        pool.extend_from_slice(&size.to_le_bytes());
        pool.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        pool.extend_from_slice(&0u32.to_le_bytes()); // style count
        pool.extend_from_slice(&0u32.to_le_bytes()); // flags: UTF-16
        pool.extend_from_slice(&strings_start.to_le_bytes());
        pool.extend_from_slice(&0u32.to_le_bytes()); // styles start
        for offset in offsets {
            pool.extend_from_slice(&offset.to_le_bytes());
        }
        pool.extend_from_slice(&data);
        pool
    }

    fn build_element(name: u32, attrs: &[(u32, Option<u32>, u8, u32)]) -> Vec<u8> {
        let size = 36 + attrs.len() * 20;
        let mut el = Vec::with_capacity(size);
        el.extend_from_slice(&RES_XML_START_ELEMENT_TYPE.to_le_bytes());
        el.extend_from_slice(&16u16.to_le_bytes());
        el.extend_from_slice(&(size as u32).to_le_bytes());
        el.extend_from_slice(&0u32.to_le_bytes()); // line number
        el.extend_from_slice(&0xffff_ffffu32.to_le_bytes()); // comment
        el.extend_from_slice(&0xffff_ffffu32.to_le_bytes()); // namespace
        el.extend_from_slice(&name.to_le_bytes());
        el.extend_from_slice(&20u16.to_le_bytes()); // attribute start
        el.extend_from_slice(&20u16.to_le_bytes()); // attribute size
        el.extend_from_slice(&(attrs.len() as u16).to_le_bytes());
        el.extend_from_slice(&0u16.to_le_bytes()); // id index
        el.extend_from_slice(&0u16.to_le_bytes()); // class index
        el.extend_from_slice(&0u16.to_le_bytes()); // style index
        for (attr_name, raw, data_type, value) in attrs {
            el.extend_from_slice(&0xffff_ffffu32.to_le_bytes()); // namespace
            el.extend_from_slice(&attr_name.to_le_bytes());
            el.extend_from_slice(&raw.unwrap_or(0xffff_ffff).to_le_bytes());
            el.extend_from_slice(&8u16.to_le_bytes()); // value size
            el.push(0); // res0
            el.push(*data_type);
            el.extend_from_slice(&value.to_le_bytes());
        }
        el
    }

    #[test]
    fn test_parse_manifest_fields() {
        let doc = build_manifest("com.example.app", 42, Some(21));
        let info = parse_manifest(&doc).expect("Failed to parse manifest");

        assert_eq!(info.package_name, "com.example.app");
        assert_eq!(info.version_code, 42);
        assert_eq!(info.version_name.as_deref(), Some("1.2.3"));
        assert_eq!(info.min_sdk_version.as_deref(), Some("21"));
    }

    #[test]
    fn test_parse_manifest_without_uses_sdk() {
        let doc = build_manifest("org.test.pkg", 7, None);
        let info = parse_manifest(&doc).expect("Failed to parse manifest");

        assert_eq!(info.version_code, 7);
        assert!(info.min_sdk_version.is_none());
    }

    #[test]
    fn test_rejects_plain_text_xml() {
        let err = parse_manifest(b"<?xml version=\"1.0\"?><manifest/>").unwrap_err();
        assert!(matches!(err, AxmlError::NotBinaryXml { .. }));
    }

    #[test]
    fn test_rejects_truncated_document() {
        let mut doc = build_manifest("com.example.app", 42, Some(21));
        doc.truncate(doc.len() - 10);
        assert!(parse_manifest(&doc).is_err());
    }
}
