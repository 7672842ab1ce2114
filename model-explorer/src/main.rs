mod callbacks;
mod renderer;

use std::{cell::RefCell, env, rc::Rc};

use common::vfile::VFileSystem;
use ini::Ini;
use qr_engine::{
    error::{ConfigError, LoadError, MeshError},
    geometry::Ray,
    group::{config::vector, GroupConfig, Md2Group, Md3Group, ModelKind},
    models::md3::Md3Gesture,
    render::Renderer,
    resources::Resources,
};
use thiserror::Error;

use callbacks::{ExplorerCallbacks, Stats};
use renderer::LogRenderer;

#[derive(Debug, Error)]
enum ExplorerError {
    #[error("failed to read configuration: {0}")]
    Ini(#[from] ini::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open model files: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Playback options from the `[launch]` section.
struct Launch {
    frames: usize,
    frame_ms: f64,
    gestures: Vec<(String, usize)>,
    ray: Option<Ray<f32>>,
}

impl Launch {
    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let Some(launch) = ini.section(Some("launch")) else {
            return Err(ConfigError::MissingSection("launch".to_owned()));
        };

        let number = |key: &str, default: f64| -> Result<f64, ConfigError> {
            match launch.get(key) {
                Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_owned(),
                    value: v.to_owned(),
                }),
                None => Ok(default),
            }
        };

        // gesture = 6, or upper:11, lower:14 for multi part models
        let mut gestures = Vec::new();
        for entry in launch.get("gesture").unwrap_or_default().split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (part, index) = entry.split_once(':').unwrap_or(("", entry));
            let index = index.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "gesture".to_owned(),
                value: entry.to_owned(),
            })?;
            gestures.push((part.trim().to_owned(), index));
        }

        let ray = match (launch.get("ray_origin"), launch.get("ray_dir")) {
            (Some(origin), Some(dir)) => Some(Ray::new(
                vector("ray_origin", origin)?,
                vector("ray_dir", dir)?,
            )),
            _ => None,
        };

        Ok(Self {
            frames: number("frames", 60.0)? as usize,
            frame_ms: number("frame_ms", 1000.0 / 60.0)?,
            gestures,
            ray,
        })
    }
}

enum Group {
    Md2(Md2Group),
    Md3(Md3Group),
}

impl Group {
    fn load(
        config: &GroupConfig,
        vfs: &VFileSystem,
        callbacks: ExplorerCallbacks,
        resources: &mut Resources,
    ) -> Result<Self, LoadError> {
        let group = match &config.kind {
            ModelKind::Md2(info) => {
                let mut group = Md2Group::new();
                group.set_callbacks(Box::new(callbacks));
                group.transform = config.transform;
                group.load_from_vfs(vfs, info, resources)?;
                Group::Md2(group)
            }
            ModelKind::Md3(info) => {
                let mut group = Md3Group::new();
                group.set_callbacks(Box::new(callbacks));
                group.transform = config.transform;
                group.load_from_vfs(vfs, info, resources)?;
                Group::Md3(group)
            }
        };

        Ok(group)
    }

    fn set_animation(&mut self, part: &str, gesture: usize) -> bool {
        match self {
            Group::Md2(group) => group.set_animation(gesture),
            Group::Md3(group) => Md3Gesture::from_index(gesture)
                .is_some_and(|g| group.set_animation(part, g)),
        }
    }

    fn draw(&mut self, renderer: &mut dyn Renderer, elapsed_ms: f64) -> Result<(), MeshError> {
        match self {
            Group::Md2(group) => group.draw(renderer, elapsed_ms),
            Group::Md3(group) => group.draw(renderer, elapsed_ms),
        }
    }
}

fn run() -> Result<(), ExplorerError> {
    let path = env::args().nth(1).unwrap_or_else(|| "conf.ini".to_owned());
    let ini = Ini::load_from_file(&path)?;

    let launch = Launch::from_ini(&ini)?;
    let config = GroupConfig::from_ini(&ini)?;
    log::info!("Loading {} from {:?}", config.name, config.dir);

    let vfs = config.file_system()?;
    let stats = Rc::new(RefCell::new(Stats::default()));
    let callbacks = ExplorerCallbacks {
        ray: launch.ray,
        stats: stats.clone(),
    };

    let mut resources = Resources::new();
    let mut group = Group::load(&config, &vfs, callbacks, &mut resources)?;
    log::info!("{} textures shared", resources.len());

    for (part, gesture) in launch.gestures.iter() {
        if !group.set_animation(part, *gesture) {
            log::warn!("gesture {gesture} not available for {part:?}");
        }
    }

    let mut renderer = LogRenderer::default();
    for _ in 0..launch.frames {
        renderer.begin_scene();
        group.draw(&mut renderer, launch.frame_ms)?;
        renderer.end_scene();
    }

    let stats = stats.borrow();
    log::info!(
        "{} scenes, {} draws, {} vertices, {} ray hits, {} gestures ended, hash {:#010x}",
        renderer.scenes,
        renderer.draws,
        renderer.vertices,
        stats.hits,
        stats.ended.len(),
        stats.hash
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
