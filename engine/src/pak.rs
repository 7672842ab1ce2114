use std::{fs, io, path::Path};

use common::vfile::{VFile, VFileSystem};
use stream_unzip::{LocalFileHeader, ZipReader};

const STORED: u16 = 0;
const DEFLATED: u16 = 8;

/// Reads a `.pk3` archive into a file system.
///
/// Only entries under `dir` are kept, keyed by their path relative to it. An empty `dir`
/// keeps the whole archive. Stored and deflated entries are read; an entry that fails to
/// decode or verify is skipped with a warning.
pub fn read_pk3(data: Vec<u8>, dir: &str) -> VFileSystem {
    let mut zip_reader = ZipReader::default();
    zip_reader.update(data.into());
    zip_reader.finish();

    let prefix = dir.trim_matches('/');
    let mut vfs = VFileSystem::default();

    for e in zip_reader.drain_entries() {
        let header = e.header();
        let path: &str = &header.filename;

        if path.ends_with('/') {
            continue;
        }

        let name = if prefix.is_empty() {
            path
        } else {
            match path.strip_prefix(prefix).and_then(|p| p.strip_prefix('/')) {
                Some(name) => name,
                None => continue,
            }
        };

        match entry_data(header, e.compressed_data()) {
            Ok(data) => vfs.insert(name, VFile::from(data)),
            Err(reason) => log::warn!("Skipping pk3 entry {path:?}: {reason}"),
        }
    }

    log::info!("Read {} files from pk3 dir {dir:?}", vfs.len());
    vfs
}

fn entry_data(header: &LocalFileHeader, raw: &[u8]) -> Result<Vec<u8>, String> {
    let data = match header.compression {
        STORED => raw.to_vec(),
        DEFLATED => inflate::inflate_bytes(raw)?,
        other => return Err(format!("compression method {other}")),
    };

    if data.len() != header.uncompressed_size as usize {
        return Err(format!(
            "{} bytes, expected {}",
            data.len(),
            header.uncompressed_size
        ));
    }

    let crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
    if crc.checksum(&data) != header.crc32 {
        return Err("checksum mismatch".to_owned());
    }

    Ok(data)
}

pub fn load_pk3(path: &Path, dir: &str) -> io::Result<VFileSystem> {
    Ok(read_pk3(fs::read(path)?, dir))
}


#[cfg(test)]
mod pak_tests {
    use super::{
        fixtures::{deflate_block, stored_zip, zip},
        *,
    };

    fn archive() -> Vec<u8> {
        stored_zip(&[
            ("models/players/sarge/lower.md3", b"lower"),
            ("models/players/sarge/animation.cfg", b"sex m"),
            ("models/weapons/gun.md3", b"gun"),
        ])
    }

    #[test]
    fn test_read_dir() {
        let vfs = read_pk3(archive(), "models/players/sarge/");

        assert_eq!(vfs.len(), 2);
        assert_eq!(vfs.bytes("lower.md3"), Some(&b"lower"[..]));
        assert_eq!(vfs.bytes("animation.cfg"), Some(&b"sex m"[..]));
        assert!(!vfs.contains("gun.md3"));
    }

    #[test]
    fn test_read_all() {
        let vfs = read_pk3(archive(), "");

        assert_eq!(vfs.len(), 3);
        assert!(vfs.contains("models/weapons/gun.md3"));
    }

    #[test]
    fn test_deflated_entries() {
        let vfs = read_pk3(
            zip(&[
                ("sarge/head.md3", DEFLATED, deflate_block(b"head"), b"head"),
                ("sarge/upper.md3", STORED, b"upper".to_vec(), b"upper"),
                // bad block length
                ("sarge/lower.md3", DEFLATED, vec![1, 4, 0, 0, 0, b'x'], b"x"),
                ("sarge/legs.md3", 12, b"bz".to_vec(), b"bz"),
                ("sarge/torso.md3", STORED, b"torso".to_vec(), b"tarso"),
            ]),
            "sarge",
        );

        assert_eq!(vfs.bytes("head.md3"), Some(&b"head"[..]));
        assert_eq!(vfs.bytes("upper.md3"), Some(&b"upper"[..]));
        assert_eq!(vfs.len(), 2);
    }
}
