use std::{
    fs,
    io::{self, BufReader, Cursor},
    path::Path,
    sync::Arc,
};

use bevy_ecs::system::Resource;
use std::collections::HashMap;

/// A single named file held entirely in memory.
#[derive(Default, Clone, Debug)]
pub struct VFile {
    pub data: Vec<u8>,
}

impl From<Vec<u8>> for VFile {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Flat in-memory directory, keyed by file name.
#[derive(Resource, Default, Clone, Debug)]
pub struct VFileSystem {
    pub files: Arc<HashMap<String, VFile>>,
}

impl VFileSystem {
    /// Loads every regular file of `dir` (not recursive), keyed by its file name.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut files = HashMap::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;

            if !entry.file_type()?.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                log::warn!("Skipping non utf-8 file name {:?}", entry.file_name());
                continue;
            };

            files.insert(name, VFile::from(fs::read(entry.path())?));
        }

        Ok(Self {
            files: Arc::new(files),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, file: VFile) {
        Arc::make_mut(&mut self.files).insert(name.into(), file);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|f| &f.data[..])
    }

    pub fn get(&self, path: &Path) -> Option<BufReader<Cursor<&[u8]>>> {
        self.get_str(path.to_str()?)
    }

    pub fn get_str(&self, path: &str) -> Option<BufReader<Cursor<&[u8]>>> {
        match self.files.get(path) {
            Some(file) => {
                let c = Cursor::new(&file.data[..]);

                Some(BufReader::new(c))
            }
            None => {
                log::error!("{:?} file not found", path);
                None
            }
        }
    }
}

#[cfg(test)]
mod vfile_tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_insert_and_read() {
        let mut fs = VFileSystem::default();
        assert!(fs.is_empty());

        fs.insert("a.md2", VFile::from(vec![1, 2, 3]));
        let copy = fs.clone();
        fs.insert("b.cfg", VFile::from(b"0 1 1 10".to_vec()));

        assert_eq!(fs.len(), 2);
        assert_eq!(copy.len(), 1);
        assert_eq!(fs.bytes("a.md2"), Some(&[1u8, 2, 3][..]));

        let mut text = String::new();
        fs.get_str("b.cfg").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "0 1 1 10");
    }

    #[test]
    fn test_missing() {
        let fs = VFileSystem::default();
        assert!(fs.get_str("nothing").is_none());
        assert!(!fs.contains("nothing"));
    }

    #[test]
    fn test_as_resource() {
        let mut world = bevy_ecs::world::World::new();
        let mut fs = VFileSystem::default();
        fs.insert("x", VFile::default());
        world.insert_resource(fs);

        assert!(world.resource::<VFileSystem>().contains("x"));
    }
}
