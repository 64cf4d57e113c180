//! Shared fixtures: minimal but structurally valid APKs.
//!
//! An APK fixture is a ZIP archive holding a compiled `AndroidManifest.xml`
//! in the binary XML encoding, with a `<manifest>` element carrying the
//! package name and version code.

use std::io::Write as _;
use std::path::{Path, PathBuf};

const RES_XML_TYPE: u16 = 0x0003;
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;

const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;

/// Writes an APK with the given manifest fields and returns its path.
pub fn write_apk(dir: &Path, name: &str, package: &str, version_code: u32) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("Failed to create APK file");

    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("AndroidManifest.xml", options)
        .expect("Failed to start manifest entry");
    writer
        .write_all(&build_manifest(package, version_code))
        .expect("Failed to write manifest");
    writer
        .start_file("classes.dex", options)
        .expect("Failed to start dex entry");
    // Distinct content per version so fixtures never hash alike
    writer
        .write_all(format!("dex {} {}", package, version_code).as_bytes())
        .expect("Failed to write dex entry");
    writer.finish().expect("Failed to finish APK");

    path
}

fn build_manifest(package: &str, version_code: u32) -> Vec<u8> {
    let strings = [
        "package",
        "versionCode",
        "minSdkVersion",
        "manifest",
        "uses-sdk",
        package,
    ];
    let pool = build_string_pool(&strings);

    let mut elements = Vec::new();
    // <manifest package=... android:versionCode=...>
    elements.extend(build_element(
        3,
        &[
            (0, Some(5), TYPE_STRING, 5),
            (1, None, TYPE_INT_DEC, version_code),
        ],
    ));
    // <uses-sdk android:minSdkVersion="21">
    elements.extend(build_element(4, &[(2, None, TYPE_INT_DEC, 21)]));

    let total = 8 + pool.len() + elements.len();
    let mut doc = Vec::with_capacity(total);
    doc.extend_from_slice(&RES_XML_TYPE.to_le_bytes());
    doc.extend_from_slice(&8u16.to_le_bytes());
    doc.extend_from_slice(&(total as u32).to_le_bytes());
    doc.extend_from_slice(&pool);
    doc.extend_from_slice(&elements);
    doc
}

fn build_string_pool(strings: &[&str]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for s in strings {
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
