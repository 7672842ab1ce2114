use ahash::{AHashMap, AHashSet};

use crate::{
    error::ParseError,
    models::text::content_lines,
};

/// `.skin` file: sub-mesh name to texture path, plus bare link keys naming tags.
#[derive(Clone, Debug, Default)]
pub struct Md3Skin {
    pub paths: AHashMap<String, String>,
    pub link_keys: AHashSet<String>,
}

impl Md3Skin {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut skin = Self::default();

        for (line, content) in content_lines(text) {
            let (name, path) = match content.split_once(',') {
                Some((name, path)) => (name.trim(), path.trim()),
                None => (content, ""),
            };

            if name.is_empty() {
                return Err(ParseError::config(line, "empty name"));
            }

            let inserted = if path.is_empty() {
                skin.link_keys.insert(name.to_owned())
            } else {
                skin.paths.insert(name.to_owned(), path.to_owned()).is_none()
            };

            if !inserted {
                return Err(ParseError::config(line, format!("duplicate name {name:?}")));
            }
        }

        Ok(skin)
    }

    pub fn path(&self, name: &str) -> Option<&str> {
        self.paths.get(name).map(String::as_str)
    }

    /// File name of the texture bound to `name`, without its directories.
    pub fn texture_name(&self, name: &str) -> Option<&str> {
        self.path(name)
            .map(|path| path.rsplit('/').next().unwrap_or(path))
    }
}
