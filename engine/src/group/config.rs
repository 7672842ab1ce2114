use std::{io, path::PathBuf};

use common::vfile::VFileSystem;
use ini::{Ini, Properties};

use crate::{
    error::ConfigError,
    geometry::Vector3,
    group::{GroupTransform, Md2Info, Md3Info},
    pak::load_pk3,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ModelKind {
    Md2(Md2Info),
    Md3(Md3Info),
}

/// A model to load and where to place it, read from an ini section.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupConfig {
    pub name: String,
    pub dir: PathBuf,
    /// Archive holding `dir`, read instead of the disk when set.
    pub pk3: Option<PathBuf>,
    pub kind: ModelKind,
    pub transform: GroupTransform,
}

impl GroupConfig {
    /// Reads the section named by `model` in `[launch]`.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let launch = section(ini, "launch")?;
        let name = required(launch, "launch", "model")?;

        Self::from_section(ini, name)
    }

    pub fn from_section(ini: &Ini, name: &str) -> Result<Self, ConfigError> {
        let props = section(ini, name)?;

        let dir = PathBuf::from(props.get("dir").unwrap_or("."));
        let pk3 = props.get("pk3").map(PathBuf::from);

        let kind = match required(props, name, "kind")? {
            "md2" => ModelKind::Md2(Md2Info {
                model: required(props, name, "model")?.to_owned(),
                normals: props.get("normals").map(str::to_owned),
                texture: props.get("texture").map(str::to_owned),
                config: props.get("config").map(str::to_owned),
            }),
            "md3" => {
                let mut info = Md3Info::default();
                if let Some(template) = props.get("model_template") {
                    info.model_template = template.to_owned();
                }
                if let Some(template) = props.get("skin_template") {
                    info.skin_template = template.to_owned();
                }
                if let Some(template) = props.get("anim_template") {
                    info.anim_template = template.to_owned();
                }
                if let Some(prefixes) = props.get("prefixes") {
                    info.prefixes = prefixes
                        .split(',')
                        .map(|p| p.trim().to_owned())
                        .filter(|p| !p.is_empty())
                        .collect();
                }
                if let Some(tags) = props.get("tags") {
                    info.tag_overrides = tag_overrides(tags)?;
                }
                ModelKind::Md3(info)
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "kind".to_owned(),
                    value: other.to_owned(),
                })
            }
        };

        let mut transform = GroupTransform::default();
        if let Some(v) = props.get("translation") {
            transform.translation = vector("translation", v)?;
        }
        if let Some(v) = props.get("rotation") {
            transform.rotation = vector("rotation", v)?;
        }
        if let Some(v) = props.get("scale") {
            transform.scaling = vector("scale", v)?;
        }
        if let Some(v) = props.get("combination") {
            transform.combination = v.parse()?;
        }

        Ok(Self {
            name: name.to_owned(),
            dir,
            pk3,
            kind,
            transform,
        })
    }

    /// Files of the model directory, from the archive when one is configured.
    pub fn file_system(&self) -> io::Result<VFileSystem> {
        match &self.pk3 {
            Some(pk3) => {
                let dir = self.dir.to_string_lossy().replace('\\', "/");
                load_pk3(pk3, dir.trim_start_matches("./"))
            }
            None => VFileSystem::from_dir(&self.dir),
        }
    }
}

fn section<'a>(ini: &'a Ini, name: &str) -> Result<&'a Properties, ConfigError> {
    ini.section(Some(name))
        .ok_or_else(|| ConfigError::MissingSection(name.to_owned()))
}

fn required<'a>(props: &'a Properties, section: &str, key: &str) -> Result<&'a str, ConfigError> {
    props.get(key).ok_or_else(|| ConfigError::MissingKey {
        section: section.to_owned(),
        key: key.to_owned(),
    })
}

/// `part:tag` pairs separated by commas.
fn tag_overrides(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((part, tag)) if !part.trim().is_empty() && !tag.trim().is_empty() => {
                Ok((part.trim().to_owned(), tag.trim().to_owned()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "tags".to_owned(),
                value: value.to_owned(),
            }),
        })
        .collect()
}

/// Three whitespace separated floats.
pub fn vector(key: &str, value: &str) -> Result<Vector3<f32>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    };

    let values = value
        .split_whitespace()
        .map(|v| v.parse::<f32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    match values[..] {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(invalid()),
    }
}
