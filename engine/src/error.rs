use std::io;

use thiserror::Error;

/// Failures while decoding a binary model or one of its text side files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("buffer is empty")]
    Empty,
    #[error("{0} is truncated")]
    Truncated(&'static str),
    #[error("bad magic id 0x{found:08X}, expected 0x{expected:08X}")]
    BadMagic { found: u32, expected: u32 },
    #[error("unsupported version {found}, expected {expected}")]
    BadVersion { found: u32, expected: u32 },
    #[error("{section} at 0x{offset:X} extends beyond the buffer ({size} bytes)")]
    OutOfBounds {
        section: &'static str,
        offset: usize,
        size: usize,
    },
    #[error("line {line}: {reason}")]
    BadConfig { line: usize, reason: String },
}

impl ParseError {
    pub(crate) fn config(line: usize, reason: impl Into<String>) -> Self {
        Self::BadConfig {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("frame {index} is out of range ({count} frames)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("normals were requested but no normals table is loaded")]
    MissingNormals,
    #[error("meshes do not share the same topology")]
    Mismatch,
    #[error("model is not loaded")]
    NotLoaded,
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not a bitmap file")]
    BadSignature,
    #[error("unsupported bitmap: {0}")]
    UnsupportedFormat(String),
    #[error("unsupported texture file {0:?}")]
    UnsupportedFile(String),
}

/// Invalid values found while reading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing section [{0}]")]
    MissingSection(String),
    #[error("missing key {key:?} in [{section}]")]
    MissingKey { section: String, key: String },
    #[error("invalid value {value:?} for {key:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("missing file {0:?}")]
    MissingFile(String),
    #[error("failed to parse {file:?}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LoadError {
    pub(crate) fn parse(file: &str) -> impl FnOnce(ParseError) -> LoadError + '_ {
        move |source| LoadError::Parse {
            file: file.to_owned(),
            source,
        }
    }
}
