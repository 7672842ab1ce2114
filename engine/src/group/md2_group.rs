use std::{fs, path::Path};

use ahash::AHashMap;
use common::vfile::{VFile, VFileSystem};

use crate::{
    buffer::MemoryBuffer,
    collision::AabbTree,
    error::{LoadError, MeshError, TextureError},
    geometry::{Polygon, Ray},
    group::{
        hash_settings, AnimationRange, AnimationStep, CachedFrame, DrawItem, GroupCallbacks,
        GroupState, GroupTransform, ItemAnimation, NoCallbacks,
    },
    hash::{HashChain, MODEL_HASH_SEED},
    models::{
        interpolate,
        md2::{Md2Config, Md2Model, Md2Normals, Md2Parser},
        Color, DirectionalLight, FramedModel, ModelSettings, VertexFormat, VertexFormats,
    },
    render::Renderer,
    resources::Resources,
    texture::{bmp::decode_bmp, ModelTexture, Texture},
};

/// Files making up an MD2 model. Only `model` is required.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Md2Info {
    pub model: String,
    pub normals: Option<String>,
    pub texture: Option<String>,
    pub config: Option<String>,
}

impl Md2Info {
    fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.model.as_str()).chain(
            [&self.normals, &self.texture, &self.config]
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }
}

/// A single animated MD2 model with its texture, gestures and frame cache.
pub struct Md2Group {
    model: Option<FramedModel>,
    settings: ModelSettings,
    textures: Vec<ModelTexture>,
    config: Md2Config,
    animation: ItemAnimation,
    force_loop: bool,
    cache: AHashMap<u32, CachedFrame>,
    callbacks: Box<dyn GroupCallbacks>,
    pub transform: GroupTransform,
}

impl Default for Md2Group {
    fn default() -> Self {
        Self {
            model: None,
            settings: ModelSettings::default(),
            textures: Vec::new(),
            config: Md2Config::default(),
            animation: ItemAnimation::default(),
            force_loop: true,
            cache: AHashMap::new(),
            callbacks: Box::new(NoCallbacks),
            transform: GroupTransform::default(),
        }
    }
}

impl Md2Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callbacks(&mut self, callbacks: Box<dyn GroupCallbacks>) {
        self.callbacks = callbacks;
    }

    /// Drops the model, textures and gestures. Transforms are kept.
    pub fn clear(&mut self) {
        self.model = None;
        self.textures.clear();
        self.config = Md2Config::default();
        self.animation = ItemAnimation::default();
        self.cache.clear();
    }

    /// Loads the files named by `info` from `dir`.
    pub fn load(&mut self, dir: &Path, info: &Md2Info, resources: &mut Resources) -> Result<(), LoadError> {
        let mut vfs = VFileSystem::default();

        for name in info.files() {
            match fs::read(dir.join(name)) {
                Ok(data) => vfs.insert(name, VFile::from(data)),
                Err(e) => log::debug!("{:?}: {e}", dir.join(name)),
            }
        }

        self.load_from_vfs(&vfs, info, resources)
    }

    /// Loads the files named by `info` from a memory directory. The group is empty on failure.
    pub fn load_from_vfs(
        &mut self,
        vfs: &VFileSystem,
        info: &Md2Info,
        resources: &mut Resources,
    ) -> Result<(), LoadError> {
        self.clear();

        if let Err(e) = self.try_load(vfs, info, resources) {
            log::error!("failed to load {:?}: {e}", info.model);
            self.clear();
            return Err(e);
        }

        let hash = self.hash();
        self.callbacks.on_hash_code_changed(hash);
        Ok(())
    }

    fn try_load(
        &mut self,
        vfs: &VFileSystem,
        info: &Md2Info,
        resources: &mut Resources,
    ) -> Result<(), LoadError> {
        let data = vfs
            .bytes(&info.model)
            .ok_or_else(|| LoadError::MissingFile(info.model.clone()))?;
        let parser = Md2Parser::read(&mut MemoryBuffer::from(data)).map_err(LoadError::parse(&info.model))?;

        let mut format: VertexFormats = VertexFormat::Colors.into();

        let normals = match info.normals.as_deref() {
            Some(name) => match vfs.bytes(name) {
                Some(data) => {
                    format |= VertexFormat::Normals;
                    Some(Md2Normals::read(&mut MemoryBuffer::from(data)).map_err(LoadError::parse(name))?)
                }
                None => {
                    log::warn!("normals file {name:?} not found, lighting disabled");
                    None
                }
            },
            None => None,
        };

        if let Some(name) = info.texture.as_deref() {
            match vfs.bytes(name) {
                Some(data) => {
                    let texture = self.decode_texture(name, data)?;
                    self.textures
                        .push(ModelTexture::new(name, Some(resources.add_texture(texture))));
                    format |= VertexFormat::TexCoords;
                }
                None => log::warn!("texture file {name:?} not found"),
            }
        }

        if let Some(name) = info.config.as_deref() {
            match vfs.bytes(name) {
                Some(data) => {
                    self.config = Md2Config::parse(&String::from_utf8_lossy(data))
                        .map_err(LoadError::parse(name))?;
                }
                None => log::warn!("animation file {name:?} not found"),
            }
        }

        self.settings.format = format;

        let mut model = Md2Model::new(parser, normals);
        model.settings = self.settings;
        self.model = Some(FramedModel::Md2(model));

        log::info!(
            "loaded {:?}: {} frames, {} gestures",
            info.model,
            self.mesh_count(),
            self.config.len()
        );

        Ok(())
    }

    fn decode_texture(&mut self, name: &str, data: &[u8]) -> Result<Texture, TextureError> {
        if let Some(texture) = self.callbacks.on_load_texture(name, data) {
            return Ok(texture);
        }

        if name.to_ascii_lowercase().ends_with(".bmp") {
            return decode_bmp(name, data);
        }

        Err(TextureError::UnsupportedFile(name.to_owned()))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&FramedModel> {
        self.model.as_ref()
    }

    pub fn mesh_count(&self) -> usize {
        self.model.as_ref().map_or(0, FramedModel::mesh_count)
    }

    pub fn textures(&self) -> &[ModelTexture] {
        &self.textures
    }

    pub fn config(&self) -> &Md2Config {
        &self.config
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    fn update_settings(&mut self, update: impl FnOnce(&mut ModelSettings)) {
        update(&mut self.settings);
        if let Some(model) = self.model.as_mut() {
            *model.settings_mut() = self.settings;
        }

        self.reset_cache();
        let hash = self.hash();
        self.callbacks.on_hash_code_changed(hash);
    }

    pub fn set_vertex_format(&mut self, format: VertexFormats) {
        self.update_settings(|s| s.format = format);
    }

    pub fn set_color(&mut self, color: Color) {
        self.update_settings(|s| s.color = color);
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.update_settings(|s| s.light = light);
    }

    pub fn enable_light(&mut self, enabled: bool) {
        self.update_settings(|s| s.light.enabled = enabled);
    }

    /// Keeps every gesture looping even when its config says otherwise.
    pub fn set_force_loop(&mut self, force_loop: bool) {
        self.force_loop = force_loop;
    }

    /// Starts `gesture` from its first frame. Returns false for unknown gestures.
    pub fn set_animation(&mut self, gesture: usize) -> bool {
        let Some(animation) = self.config.get(gesture) else {
            log::warn!("unknown gesture {gesture}");
            return false;
        };

        self.animation = ItemAnimation {
            gesture: Some(gesture),
            looping: animation.looping,
            ..Default::default()
        };
        self.animation.clock.reset(animation.start);
        true
    }

    pub fn gesture(&self) -> Option<usize> {
        self.animation.gesture
    }

    /// Advances the clock of the current gesture.
    pub fn animate(&mut self, elapsed_ms: f64) -> AnimationStep {
        let Some((gesture, animation)) = self
            .animation
            .gesture
            .and_then(|g| self.config.get(g).map(|a| (g, *a)))
        else {
            return AnimationStep::default();
        };

        let range = AnimationRange {
            start: animation.start,
            end: animation.end(),
            fps: animation.fps,
            looping: self.animation.looping,
        };

        let step = self.animation.clock.advance(elapsed_ms, range, self.force_loop);
        if step.ended {
            self.callbacks.on_animation_end(0, gesture);
        }

        step
    }

    fn ensure_cached(&mut self, frame: u32) -> Result<(), MeshError> {
        let model = self.model.as_ref().ok_or(MeshError::NotLoaded)?;

        if !self.cache.contains_key(&frame) {
            let mesh = model.mesh(frame as usize)?;
            let tree = FramedModel::populate_aabb_tree(&mesh);
            self.cache.insert(frame, CachedFrame { mesh, tree });
        }

        Ok(())
    }

    /// Mesh and collision tree of `frame`, built on first use.
    pub fn frame(&mut self, frame: u32) -> Result<&CachedFrame, MeshError> {
        self.ensure_cached(frame)?;
        self.cache.get(&frame).ok_or(MeshError::NotLoaded)
    }

    /// Advances the animation and sends the blended frame to `renderer`.
    pub fn draw(&mut self, renderer: &mut dyn Renderer, elapsed_ms: f64) -> Result<(), MeshError> {
        if !self.is_loaded() {
            return Err(MeshError::NotLoaded);
        }

        let step = self.animate(elapsed_ms);
        self.ensure_cached(step.frame)?;
        self.ensure_cached(step.next_frame)?;

        let matrix = self.transform.matrix();
        let (Some(model), Some(current), Some(next)) = (
            self.model.as_ref(),
            self.cache.get(&step.frame),
            self.cache.get(&step.next_frame),
        ) else {
            return Err(MeshError::NotLoaded);
        };

        let item = DrawItem {
            index: 0,
            model,
            textures: &self.textures,
            matrix: &matrix,
            frame: step.frame,
            next_frame: step.next_frame,
            factor: step.factor,
            mesh: &current.mesh,
            next_mesh: &next.mesh,
        };

        if !self.callbacks.on_draw_item(&item) {
            if step.frame == step.next_frame || step.factor == 0.0 {
                renderer.draw(&current.mesh, &matrix, &self.textures);
            } else {
                let mesh = interpolate(step.factor, &current.mesh, &next.mesh)?;
                renderer.draw(&mesh, &matrix, &self.textures);
            }
        }

        self.callbacks.on_detect_collision(&matrix, &current.tree);
        Ok(())
    }

    /// Polygons of the current frame hit by a world space `ray`, in model space.
    pub fn pick(&mut self, ray: &Ray<f32>) -> Result<Vec<Polygon<f32>>, MeshError> {
        let Some(inverse) = self.transform.matrix().inverse() else {
            return Ok(Vec::new());
        };
        let local = Ray::new(inverse.transform(&ray.pos()), inverse.transform_normal(&ray.dir()));

        let frame = self.animation.clock.frame;
        let tree: &AabbTree = &self.frame(frame)?.tree;
        Ok(tree.hits(&local))
    }

    /// CRC32 over the model, textures and everything that changes the built meshes.
    pub fn hash(&self) -> u32 {
        let mut chain = HashChain::new(MODEL_HASH_SEED)
            .u32(self.model.as_ref().map_or(0, FramedModel::hash));

        for texture in self.textures.iter() {
            chain = chain.u32(texture.hash().unwrap_or(0));
        }

        hash_settings(chain, &self.settings).finish()
    }

    pub fn state(&self) -> GroupState {
        GroupState {
            transform: self.transform,
            animations: vec![self.animation.clone()],
        }
    }

    pub fn set_state(&mut self, state: &GroupState) {
        self.transform = state.transform;
        self.animation = state.animations.first().cloned().unwrap_or_default();
    }
}

#[cfg(test)]
mod md2_group_tests {
    use std::{cell::RefCell, rc::Rc, sync::Arc};

    use super::*;
    use crate::{
        error::ParseError,
        geometry::{Matrix16, Vector3},
        models::{
            md2::{normals::fixtures::normals_file, parser::fixtures::triangle_md2},
            Mesh,
        },
        texture::bmp::fixtures::bmp,
    };

    #[derive(Debug, PartialEq)]
    enum Event {
        Hash(u32),
        End(usize),
        Collision(usize),
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<Event>>>,
        handle_draw: bool,
    }

    impl GroupCallbacks for Recorder {
        fn on_hash_code_changed(&mut self, hash: u32) {
            self.events.borrow_mut().push(Event::Hash(hash));
        }

        fn on_draw_item(&mut self, _item: &DrawItem) -> bool {
            self.handle_draw
        }

        fn on_animation_end(&mut self, _item: usize, gesture: usize) {
            self.events.borrow_mut().push(Event::End(gesture));
        }

        fn on_detect_collision(&mut self, _model_matrix: &Matrix16<f32>, tree: &AabbTree) {
            self.events.borrow_mut().push(Event::Collision(tree.polygon_count()));
        }
    }

    #[derive(Default)]
    struct Capture {
        draws: Vec<(Mesh, Matrix16<f32>)>,
    }

    impl Renderer for Capture {
        fn draw(&mut self, mesh: &Mesh, model_matrix: &Matrix16<f32>, _textures: &[ModelTexture]) {
            self.draws.push((mesh.clone(), *model_matrix));
        }

        fn select_texture(&mut self, _textures: &[ModelTexture], _name: &str) -> bool {
            false
        }
    }

    fn vfs(version: u32) -> VFileSystem {
        let mut vfs = VFileSystem::default();
        vfs.insert("tris.md2", VFile::from(triangle_md2(version)));
        vfs.insert("normals.bin", VFile::from(normals_file(&[[0.0, 0.0, 1.0]])));
        vfs.insert("skin.bmp", VFile::from(bmp(1, &[&[[255, 0, 0]]])));
        vfs.insert("anim.cfg", VFile::from(b"0 2 1 10\n1 1 0 10\n0 2 0 10\n".to_vec()));
        vfs
    }

    fn info() -> Md2Info {
        Md2Info {
            model: "tris.md2".to_owned(),
            normals: Some("normals.bin".to_owned()),
            texture: Some("skin.bmp".to_owned()),
            config: Some("anim.cfg".to_owned()),
        }
    }

    fn loaded() -> (Md2Group, Rc<RefCell<Vec<Event>>>) {
        let mut group = Md2Group::new();
        let recorder = Recorder::default();
        let events = recorder.events.clone();
        group.set_callbacks(Box::new(recorder));

        group.load_from_vfs(&vfs(8), &info(), &mut Resources::new()).unwrap();
        events.borrow_mut().clear();
        (group, events)
    }

    #[test]
    fn test_load_version() {
        let mut group = Md2Group::new();
        let mut resources = Resources::new();

        group.load_from_vfs(&vfs(8), &info(), &mut resources).unwrap();
        assert_eq!(group.mesh_count(), 2);
        assert_eq!(group.config().len(), 3);
        assert_eq!(
            group.settings().format,
            VertexFormat::Colors | VertexFormat::Normals | VertexFormat::TexCoords
        );

        let err = group.load_from_vfs(&vfs(7), &info(), &mut resources).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert_eq!(group.mesh_count(), 0);
        assert!(!group.is_loaded());
        assert!(group.textures().is_empty());
    }

    #[test]
    fn test_optional_files() {
        let mut group = Md2Group::new();
        let info = Md2Info {
            model: "tris.md2".to_owned(),
            normals: Some("missing.bin".to_owned()),
            ..Default::default()
        };

        group.load_from_vfs(&vfs(8), &info, &mut Resources::new()).unwrap();
        assert_eq!(group.settings().format, VertexFormats::from(VertexFormat::Colors));

        let info = Md2Info {
            model: "missing.md2".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            group.load_from_vfs(&vfs(8), &info, &mut Resources::new()),
            Err(LoadError::MissingFile(_))
        ));
    }

    #[test]
    fn test_overflowing_gesture() {
        let mut vfs = vfs(8);
        vfs.insert("anim.cfg", VFile::from(b"4294967295 2 1 10\n".to_vec()));

        let mut group = Md2Group::new();
        let err = group.load_from_vfs(&vfs, &info(), &mut Resources::new()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse { ref file, source: ParseError::BadConfig { line: 1, .. } } if file == "anim.cfg"
        ));
        assert!(!group.is_loaded());
    }

    #[test]
    fn test_texture_needs_decoder() {
        let mut vfs = vfs(8);
        vfs.insert("skin.pcx", VFile::from(vec![0; 16]));
        let info = Md2Info {
            model: "tris.md2".to_owned(),
            texture: Some("skin.pcx".to_owned()),
            ..Default::default()
        };

        let mut group = Md2Group::new();
        assert!(matches!(
            group.load_from_vfs(&vfs, &info, &mut Resources::new()),
            Err(LoadError::Texture(TextureError::UnsupportedFile(_)))
        ));
    }

    #[test]
    fn test_textures_shared() {
        let mut resources = Resources::new();
        let mut a = Md2Group::new();
        let mut b = Md2Group::new();

        a.load_from_vfs(&vfs(8), &info(), &mut resources).unwrap();
        b.load_from_vfs(&vfs(8), &info(), &mut resources).unwrap();

        assert_eq!(resources.len(), 1);
        let (ta, tb) = (&a.textures()[0].texture, &b.textures()[0].texture);
        assert!(Arc::ptr_eq(ta.as_ref().unwrap(), tb.as_ref().unwrap()));
    }

    #[test]
    fn test_cache_invalidation() {
        let (mut group, events) = loaded();

        group.set_animation(0);
        group.draw(&mut Capture::default(), 50.0).unwrap();
        assert_eq!(group.cache_len(), 2);

        group.set_color(Color::rgba(0, 255, 0, 255));
        assert_eq!(group.cache_len(), 0);
        assert!(matches!(events.borrow().last(), Some(Event::Hash(_))));

        let before = group.frame(1).unwrap().mesh.clone();
        assert_eq!(group.cache_len(), 1);

        group.set_vertex_format(VertexFormat::Colors.into());
        let after = group.frame(1).unwrap().mesh.clone();
        assert_eq!(before.len(), after.len());
        assert!(after[0].stride < before[0].stride);
        assert_ne!(before[0].data, after[0].data);
        assert_eq!(after[0].format, VertexFormats::from(VertexFormat::Colors));

        group.enable_light(true);
        group.set_light(DirectionalLight::default());
        assert_eq!(group.cache_len(), 0);
        assert_eq!(
            events.borrow().iter().filter(|e| matches!(e, Event::Hash(_))).count(),
            4
        );
    }

    #[test]
    fn test_hash_sensitivity() {
        let (mut group, _) = loaded();
        let base = group.hash();
        assert_eq!(base, group.hash());

        group.set_color(Color::rgba(1, 2, 3, 4));
        let colored = group.hash();
        assert_ne!(base, colored);

        group.set_color(Color::WHITE);
        assert_eq!(base, group.hash());

        group.enable_light(true);
        assert_ne!(base, group.hash());
        group.enable_light(false);

        let mut light = group.settings().light;
        light.direction = Vector3::new(0.0, 1.0, 0.0);
        group.set_light(light);
        let turned = group.hash();
        assert_ne!(base, turned);

        light.ambient = Color::rgba(10, 20, 30, 255);
        group.set_light(light);
        assert_ne!(turned, group.hash());

        let mut other = Md2Group::new();
        other
            .load_from_vfs(&vfs(8), &Md2Info { model: "tris.md2".to_owned(), ..Default::default() }, &mut Resources::new())
            .unwrap();
        assert_ne!(base, other.hash());
    }

    #[test]
    fn test_draw_interpolates() {
        let (mut group, events) = loaded();
        group.set_vertex_format(VertexFormat::Colors.into());
        group.transform.translation = Vector3::new(0.0, 0.0, 5.0);

        let mut renderer = Capture::default();

        // no gesture: first frame as is
        group.draw(&mut renderer, 50.0).unwrap();
        assert_eq!(renderer.draws[0].0[0].position(0), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(renderer.draws[0].1.transform(&Vector3::zero()), Vector3::new(0.0, 0.0, 5.0));

        group.set_animation(0);
        group.draw(&mut renderer, 50.0).unwrap();
        assert_eq!(renderer.draws[1].0[0].position(0), Vector3::new(1.0, 0.0, 0.0));

        assert!(events.borrow().contains(&Event::Collision(1)));
    }

    #[test]
    fn test_draw_handled_by_callback() {
        let mut group = Md2Group::new();
        group.set_callbacks(Box::new(Recorder {
            handle_draw: true,
            ..Default::default()
        }));
        group.load_from_vfs(&vfs(8), &info(), &mut Resources::new()).unwrap();

        let mut renderer = Capture::default();
        group.draw(&mut renderer, 10.0).unwrap();
        assert!(renderer.draws.is_empty());

        assert_eq!(Md2Group::new().draw(&mut renderer, 10.0), Err(MeshError::NotLoaded));
    }

    #[test]
    fn test_animation_end_once() {
        let (mut group, events) = loaded();
        group.set_force_loop(false);
        group.set_animation(2);

        let mut renderer = Capture::default();
        for _ in 0..5 {
            group.draw(&mut renderer, 100.0).unwrap();
        }

        let ends = events.borrow().iter().filter(|e| matches!(e, Event::End(2))).count();
        assert_eq!(ends, 1);
        assert!(!group.set_animation(3));
    }

    #[test]
    fn test_state_round_trip() {
        let (mut group, _) = loaded();
        group.set_animation(0);
        group.animate(150.0);
        let state = group.state();

        group.transform.scaling = Vector3::splat(3.0);
        group.set_animation(1);

        group.set_state(&state);
        assert_eq!(group.state(), state);
        assert_eq!(group.gesture(), Some(0));
    }

    #[test]
    fn test_pick() {
        let (mut group, _) = loaded();
        group.transform.translation = Vector3::new(0.0, 0.0, 10.0);

        let down = Ray::new(Vector3::new(0.25, 0.25, 20.0), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(group.pick(&down).unwrap().len(), 1);

        let miss = Ray::new(Vector3::new(5.0, 5.0, 20.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(group.pick(&miss).unwrap().is_empty());
    }
}
