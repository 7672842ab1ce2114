use std::path::Path;

use ahash::AHashMap;
use common::vfile::VFileSystem;

use crate::{
    buffer::MemoryBuffer,
    error::{LoadError, MeshError, TextureError},
    geometry::{Matrix16, Quaternion},
    group::{
        hash_settings, AnimationRange, AnimationStep, CachedFrame, DrawItem, GroupCallbacks,
        GroupState, GroupTransform, ItemAnimation, NoCallbacks,
    },
    hash::{HashChain, MODEL_HASH_SEED},
    models::{
        interpolate,
        md3::{Md3AnimConfig, Md3AnimRange, Md3Gesture, Md3Model, Md3Parser, Md3Skin},
        Color, DirectionalLight, FramedModel, ModelSettings, VertexFormat, VertexFormats,
    },
    render::Renderer,
    resources::Resources,
    texture::{bmp::decode_bmp, ModelTexture, Texture},
};

/// Placeholder replaced by the part prefix in file name templates.
pub const PREFIX_KEYWORD: &str = "%s";

/// How to find the files of a multi part player model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Md3Info {
    pub model_template: String,
    pub skin_template: String,
    pub anim_template: String,
    /// Part names, root first.
    pub prefixes: Vec<String>,
    /// Tag that attaches a part to its parent, by part name.
    pub tag_overrides: Vec<(String, String)>,
}

impl Default for Md3Info {
    fn default() -> Self {
        Self {
            model_template: PREFIX_KEYWORD.to_owned(),
            skin_template: PREFIX_KEYWORD.to_owned(),
            anim_template: PREFIX_KEYWORD.to_owned(),
            prefixes: ["lower", "upper", "head"].map(str::to_owned).to_vec(),
            tag_overrides: vec![
                ("head".to_owned(), "tag_head".to_owned()),
                ("upper".to_owned(), "tag_torso".to_owned()),
            ],
        }
    }
}

impl Md3Info {
    pub fn build_name(template: &str, prefix: &str) -> String {
        if template.is_empty() {
            prefix.to_owned()
        } else {
            template.replace(PREFIX_KEYWORD, prefix)
        }
    }

    pub fn tag_for(&self, part: &str) -> Option<&str> {
        self.tag_overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(part))
            .map(|(_, tag)| tag.as_str())
    }
}

/// Connection to another item through one of this item's tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Md3Link {
    pub item: usize,
    pub tag_index: usize,
}

/// One part of the group (legs, torso, head...).
pub struct Md3Item {
    pub name: String,
    pub model: FramedModel,
    pub textures: Vec<ModelTexture>,
    pub animations: AHashMap<Md3Gesture, AnimationRange>,
    pub animation: ItemAnimation,
    pub links_to: Vec<Md3Link>,
    pub links_from: Vec<Md3Link>,
    step: AnimationStep,
    cache: AHashMap<u32, CachedFrame>,
}

impl Md3Item {
    fn parser(&self) -> Option<&Md3Parser> {
        self.model.as_md3().map(|m| &m.parser)
    }

    fn ensure_cached(&mut self, frame: u32) -> Result<(), MeshError> {
        if !self.cache.contains_key(&frame) {
            let mesh = self.model.mesh(frame as usize)?;
            let tree = FramedModel::populate_aabb_tree(&mesh);
            self.cache.insert(frame, CachedFrame { mesh, tree });
        }

        Ok(())
    }

    /// Tag transform at the current animation step, relative to this item.
    fn tag_matrix(&self, tag_index: usize) -> Option<Matrix16<f32>> {
        let parser = self.parser()?;
        let tag = parser.tag(self.step.frame as usize, tag_index)?;
        let next = parser.tag(self.step.next_frame as usize, tag_index)?;

        let t = self.step.factor;
        let position = tag.position().lerp(&next.position(), t);

        let rotation = Quaternion::from_matrix(&tag.rotation_matrix().transpose());
        let next_rotation = Quaternion::from_matrix(&next.rotation_matrix().transpose());

        let mut matrix = rotation.slerp(&next_rotation, t).matrix();
        matrix.table[3][0] = position.x;
        matrix.table[3][1] = position.y;
        matrix.table[3][2] = position.z;

        Some(matrix)
    }
}

fn add_link(links: &mut Vec<Md3Link>, link: Md3Link) {
    if !links.iter().any(|l| l.item == link.item) {
        links.push(link);
    }
}

/// `(source, target, source tag, target tag)` for every tag name an item shares with a later
/// item. `overrides[i]` is the tag children of item `i` attach to, when configured.
fn tag_links(tag_names: &[Vec<String>], overrides: &[Option<&str>]) -> Vec<(usize, usize, usize, usize)> {
    let mut links = Vec::new();

    for (i, source_tags) in tag_names.iter().enumerate() {
        for (j, link_name) in source_tags.iter().enumerate() {
            for (k, target_tags) in tag_names.iter().enumerate().skip(i + 1) {
                let Some(l) = target_tags.iter().position(|t| t == link_name) else {
                    continue;
                };

                let source_tag = overrides.get(i).copied().flatten();
                let target_tag = overrides.get(k).copied().flatten();

                // the tag named after the child wins over the shared name
                let source_index = target_tag
                    .and_then(|name| source_tags.iter().position(|t| t == name))
                    .unwrap_or(j);
                let target_index = source_tag
                    .and_then(|name| target_tags.iter().position(|t| t == name))
                    .unwrap_or(l);

                links.push((i, k, source_index, target_index));
            }
        }
    }

    links
}

fn to_range(range: &Md3AnimRange) -> AnimationRange {
    AnimationRange {
        start: range.start,
        end: range.end(),
        fps: range.fps,
        looping: range.looping(),
    }
}

/// Quake III player: parts attached to each other through named tags.
pub struct Md3Group {
    items: Vec<Md3Item>,
    anim_config: Md3AnimConfig,
    settings: ModelSettings,
    force_loop: bool,
    callbacks: Box<dyn GroupCallbacks>,
    pub transform: GroupTransform,
}

impl Default for Md3Group {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            anim_config: Md3AnimConfig::default(),
            settings: ModelSettings {
                format: VertexFormat::Colors | VertexFormat::TexCoords | VertexFormat::Normals,
                color: Color::WHITE,
                ..Default::default()
            },
            force_loop: true,
            callbacks: Box::new(NoCallbacks),
            transform: GroupTransform::default(),
        }
    }
}

impl Md3Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callbacks(&mut self, callbacks: Box<dyn GroupCallbacks>) {
        self.callbacks = callbacks;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.anim_config = Md3AnimConfig::default();
    }

    pub fn load(&mut self, dir: &Path, info: &Md3Info, resources: &mut Resources) -> Result<(), LoadError> {
        let vfs = VFileSystem::from_dir(dir)?;
        self.load_from_vfs(&vfs, info, resources)
    }

    /// Loads every part named by `info`, then links them. The group is empty on failure.
    pub fn load_from_vfs(
        &mut self,
        vfs: &VFileSystem,
        info: &Md3Info,
        resources: &mut Resources,
    ) -> Result<(), LoadError> {
        self.clear();

        if let Err(e) = self.try_load(vfs, info, resources) {
            log::error!("failed to load md3 group: {e}");
            self.clear();
            return Err(e);
        }

        self.link_model(info);

        let hash = self.hash();
        self.callbacks.on_hash_code_changed(hash);
        Ok(())
    }

    fn try_load(
        &mut self,
        vfs: &VFileSystem,
        info: &Md3Info,
        resources: &mut Resources,
    ) -> Result<(), LoadError> {
        for prefix in info.prefixes.iter() {
            let model_name = Md3Info::build_name(&info.model_template, prefix) + ".md3";
            let data = vfs
                .bytes(&model_name)
                .ok_or_else(|| LoadError::MissingFile(model_name.clone()))?;
            let parser = Md3Parser::read(&mut MemoryBuffer::from(data))
                .map_err(LoadError::parse(&model_name))?;

            let skin_name = Md3Info::build_name(&info.skin_template, prefix) + ".skin";
            let skin_data = vfs
                .bytes(&skin_name)
                .ok_or_else(|| LoadError::MissingFile(skin_name.clone()))?;
            let skin = Md3Skin::parse(&String::from_utf8_lossy(skin_data))
                .map_err(LoadError::parse(&skin_name))?;

            let mut textures = Vec::new();
            for mesh in parser.meshes.iter() {
                let Some(texture_name) = skin.texture_name(mesh.name().to_str()) else {
                    continue;
                };

                let texture = match vfs.bytes(texture_name) {
                    Some(data) => Some(resources.add_texture(self.decode_texture(texture_name, data)?)),
                    None => {
                        log::warn!("texture {texture_name:?} of {prefix:?} not found");
                        None
                    }
                };
                textures.push(ModelTexture::new(texture_name, texture));
            }

            let mut model = Md3Model::new(parser);
            model.settings = self.settings;

            self.items.push(Md3Item {
                name: prefix.clone(),
                model: FramedModel::Md3(model),
                textures,
                animations: AHashMap::new(),
                animation: ItemAnimation::default(),
                links_to: Vec::new(),
                links_from: Vec::new(),
                step: AnimationStep::default(),
                cache: AHashMap::new(),
            });
        }

        let anim_name = Md3Info::build_name(&info.anim_template, "animation") + ".cfg";
        let anim_data = vfs
            .bytes(&anim_name)
            .ok_or_else(|| LoadError::MissingFile(anim_name.clone()))?;
        self.anim_config = Md3AnimConfig::parse(&String::from_utf8_lossy(anim_data))
            .map_err(LoadError::parse(&anim_name))?;

        let upper = self.anim_config.upper_ranges();
        let lower = self.anim_config.lower_ranges();
        for item in self.items.iter_mut() {
            let ranges = match item.name.as_str() {
                "upper" => &upper,
                "lower" => &lower,
                _ => continue,
            };
            item.animations = ranges.iter().map(|(g, r)| (*g, to_range(r))).collect();
        }

        log::info!(
            "loaded md3 group: {} parts, {} gestures",
            self.items.len(),
            self.anim_config.ranges.len()
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

    /// Links each item to the later items sharing one of its tag names.
    fn link_model(&mut self, info: &Md3Info) {
        let tag_names: Vec<Vec<String>> = self
            .items
            .iter()
            .map(|item| {
                item.parser().map_or_else(Vec::new, |p| {
                    (0..p.tag_count())
                        .filter_map(|j| p.tag(0, j))
                        .map(|t| t.name().to_str().to_owned())
                        .collect()
                })
            })
            .collect();

        let overrides: Vec<Option<&str>> =
            self.items.iter().map(|item| info.tag_for(&item.name)).collect();
        let links = tag_links(&tag_names, &overrides);

        for (i, k, source_index, target_index) in links {
            add_link(&mut self.items[i].links_to, Md3Link { item: k, tag_index: source_index });
            add_link(&mut self.items[k].links_from, Md3Link { item: i, tag_index: target_index });
        }

        for item in self.items.iter() {
            log::debug!(
                "{}: links to {:?}",
                item.name,
                item.links_to.iter().map(|l| &self.items[l.item].name).collect::<Vec<_>>()
            );
        }
    }

    pub fn items(&self) -> &[Md3Item] {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&Md3Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn is_loaded(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn anim_config(&self) -> &Md3AnimConfig {
        &self.anim_config
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn set_force_loop(&mut self, force_loop: bool) {
        self.force_loop = force_loop;
    }

    /// Plays `gesture` on the item called `name`. Non looping gestures restart.
    pub fn set_animation(&mut self, name: &str, gesture: Md3Gesture) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.name == name) else {
            return false;
        };
        let Some(range) = item.animations.get(&gesture).copied() else {
            return false;
        };

        item.animation.looping = range.looping;
        if !range.looping {
            item.animation.clock.reset(range.start);
        }
        item.animation.gesture = Some(gesture as usize);
        true
    }

    pub fn cache_len(&self) -> usize {
        self.items.iter().map(|i| i.cache.len()).sum()
    }

    pub fn reset_cache(&mut self) {
        for item in self.items.iter_mut() {
            item.cache.clear();
        }
    }

    fn update_settings(&mut self, update: impl FnOnce(&mut ModelSettings)) {
        update(&mut self.settings);
        for item in self.items.iter_mut() {
            *item.model.settings_mut() = self.settings;
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

    /// Advances the clock of every item.
    pub fn animate(&mut self, elapsed_ms: f64) {
        for (index, item) in self.items.iter_mut().enumerate() {
            let current = item.animation.gesture.and_then(|g| {
                Md3Gesture::from_index(g).and_then(|gesture| item.animations.get(&gesture).copied())
            });

            let Some(range) = current else {
                item.animation.gesture = None;
                item.step = AnimationStep::default();
                continue;
            };

            item.step = item.animation.clock.advance(elapsed_ms, range, self.force_loop);
            if item.step.ended {
                if let Some(gesture) = item.animation.gesture {
                    self.callbacks.on_animation_end(index, gesture);
                }
            }
        }
    }

    /// Animates every item then draws the hierarchy from the first one.
    pub fn draw(&mut self, renderer: &mut dyn Renderer, elapsed_ms: f64) -> Result<(), MeshError> {
        if self.items.is_empty() {
            return Err(MeshError::NotLoaded);
        }

        self.animate(elapsed_ms);

        let matrix = self.transform.matrix();
        self.draw_item(0, &matrix, renderer)
    }

    fn draw_item(
        &mut self,
        index: usize,
        matrix: &Matrix16<f32>,
        renderer: &mut dyn Renderer,
    ) -> Result<(), MeshError> {
        let step = self.items[index].step;
        self.items[index].ensure_cached(step.frame)?;
        self.items[index].ensure_cached(step.next_frame)?;

        let item = &self.items[index];
        let (Some(current), Some(next)) = (item.cache.get(&step.frame), item.cache.get(&step.next_frame))
        else {
            return Err(MeshError::NotLoaded);
        };

        let draw_item = DrawItem {
            index,
            model: &item.model,
            textures: &item.textures,
            matrix,
            frame: step.frame,
            next_frame: step.next_frame,
            factor: step.factor,
            mesh: &current.mesh,
            next_mesh: &next.mesh,
        };

        if !self.callbacks.on_draw_item(&draw_item) {
            if step.frame == step.next_frame || step.factor == 0.0 {
                renderer.draw(&current.mesh, matrix, &item.textures);
            } else {
                let mesh = interpolate(step.factor, &current.mesh, &next.mesh)?;
                renderer.draw(&mesh, matrix, &item.textures);
            }
        }
        self.callbacks.on_detect_collision(matrix, &current.tree);

        let children: Vec<(usize, Matrix16<f32>)> = item
            .links_to
            .iter()
            .filter_map(|link| {
                let tag = item.tag_matrix(link.tag_index);
                if tag.is_none() {
                    log::warn!("{}: no tag {} at frame {}", item.name, link.tag_index, step.frame);
                }
                tag.map(|tag| (link.item, tag.multiply(matrix)))
            })
            .collect();

        for (child, child_matrix) in children {
            self.draw_item(child, &child_matrix, renderer)?;
        }

        Ok(())
    }

    pub fn hash(&self) -> u32 {
        let mut chain = HashChain::new(MODEL_HASH_SEED);

        for item in self.items.iter() {
            chain = chain.u32(item.model.hash());
            for texture in item.textures.iter() {
                chain = chain.u32(texture.hash().unwrap_or(0));
            }
        }

        hash_settings(chain, &self.settings).finish()
    }

    pub fn state(&self) -> GroupState {
        GroupState {
            transform: self.transform,
            animations: self.items.iter().map(|i| i.animation.clone()).collect(),
        }
    }

    pub fn set_state(&mut self, state: &GroupState) {
        self.transform = state.transform;
        for (item, animation) in self.items.iter_mut().zip(state.animations.iter()) {
            item.animation = animation.clone();
        }
    }
}

#[cfg(test)]
mod md3_group_tests {
    use std::{cell::RefCell, rc::Rc};

    use common::vfile::VFile;

    use super::*;
    use crate::{
        geometry::Vector3,
        models::{
            md3::parser::fixtures::{md3, tag},
            Mesh,
        },
        texture::bmp::fixtures::bmp,
    };

    #[derive(Default)]
    struct Capture {
        draws: Vec<(String, Matrix16<f32>)>,
    }

    impl Renderer for Capture {
        fn draw(&mut self, mesh: &Mesh, model_matrix: &Matrix16<f32>, textures: &[ModelTexture]) {
            let texture = textures.first().map(|t| t.name.clone()).unwrap_or_default();
            assert_eq!(mesh[0].name, "tri");
            self.draws.push((texture, *model_matrix));
        }

        fn select_texture(&mut self, _textures: &[ModelTexture], _name: &str) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct Ends(Rc<RefCell<Vec<(usize, usize)>>>);

    impl GroupCallbacks for Ends {
        fn on_animation_end(&mut self, item: usize, gesture: usize) {
            self.0.borrow_mut().push((item, gesture));
        }
    }

    fn animation_cfg() -> String {
        let mut text = String::from("sex f\n");
        for gesture in 0..Md3Gesture::COUNT {
            // torso attack plays once
            let looping = u32::from(gesture != Md3Gesture::TorsoAttack as usize);
            text.push_str(&format!("0 2 {looping} 10\n"));
        }
        text
    }

    fn vfs() -> VFileSystem {
        let mut vfs = VFileSystem::default();
        let texture = bmp(1, &[&[[10, 20, 30]]]);

        vfs.insert(
            "lower.md3",
            VFile::from(md3(
                "lower",
                2,
                &["tag_torso"],
                &[tag("tag_torso", [0.0, 0.0, 1.0]), tag("tag_torso", [0.0, 0.0, 3.0])],
            )),
        );
        vfs.insert(
            "upper.md3",
            VFile::from(md3(
                "upper",
                2,
                &["tag_torso", "tag_head"],
                &[
                    tag("tag_torso", [0.0; 3]),
                    tag("tag_head", [0.0, 0.0, 2.0]),
                    tag("tag_torso", [0.0; 3]),
                    tag("tag_head", [0.0, 0.0, 2.0]),
                ],
            )),
        );
        vfs.insert(
            "head.md3",
            VFile::from(md3("head", 2, &["tag_head"], &[tag("tag_head", [0.0; 3]), tag("tag_head", [0.0; 3])])),
        );

        vfs.insert("lower.skin", VFile::from(b"tri,models/players/test/lower.bmp\n".to_vec()));
        vfs.insert("upper.skin", VFile::from(b"tag_head,\ntri,models/players/test/upper.bmp\n".to_vec()));
        vfs.insert("head.skin", VFile::from(b"tri,models/players/test/head.bmp\n".to_vec()));

        vfs.insert("lower.bmp", VFile::from(texture.clone()));
        vfs.insert("upper.bmp", VFile::from(texture));
        vfs.insert("animation.cfg", VFile::from(animation_cfg().into_bytes()));
        vfs
    }

    fn loaded() -> Md3Group {
        let mut group = Md3Group::new();
        group.load_from_vfs(&vfs(), &Md3Info::default(), &mut Resources::new()).unwrap();
        group
    }

    #[test]
    fn test_build_name() {
        assert_eq!(Md3Info::build_name("models/%s_0", "upper"), "models/upper_0");
        assert_eq!(Md3Info::build_name("", "upper"), "upper");
        assert_eq!(Md3Info::default().tag_for("HEAD"), Some("tag_head"));
        assert_eq!(Md3Info::default().tag_for("lower"), None);
    }

    #[test]
    fn test_load_and_link() {
        let mut resources = Resources::new();
        let mut group = Md3Group::new();
        group.load_from_vfs(&vfs(), &Md3Info::default(), &mut resources).unwrap();

        assert_eq!(group.items().len(), 3);
        assert_eq!(resources.len(), 1);

        let lower = group.item("lower").unwrap();
        let upper = group.item("upper").unwrap();
        let head = group.item("head").unwrap();

        assert_eq!(lower.links_to, vec![Md3Link { item: 1, tag_index: 0 }]);
        assert_eq!(upper.links_from, vec![Md3Link { item: 0, tag_index: 0 }]);
        assert_eq!(upper.links_to, vec![Md3Link { item: 2, tag_index: 1 }]);
        assert_eq!(head.links_from, vec![Md3Link { item: 1, tag_index: 0 }]);
        assert!(head.links_to.is_empty());

        // head.bmp is missing, its slot stays empty
        assert!(head.textures[0].texture.is_none());
        assert_eq!(upper.textures[0].name, "upper.bmp");

        assert_eq!(upper.animations.len(), 13);
        assert_eq!(lower.animations.len(), 18);
        assert!(head.animations.is_empty());
    }

    #[test]
    fn test_tag_links_keep_position() {
        let names = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        let tags = vec![
            names(&["tag_weapon", "tag_torso", "tag_weapon"]),
            names(&["tag_torso", "tag_weapon"]),
        ];

        let links = tag_links(&tags, &[None, None]);
        assert_eq!(links, vec![(0, 1, 0, 1), (0, 1, 1, 0), (0, 1, 2, 1)]);

        // an override on the child redirects every link to the named tag
        let links = tag_links(&tags, &[None, Some("tag_torso")]);
        assert!(links.iter().all(|&(_, _, source, _)| source == 1));
        let links = tag_links(&tags, &[Some("tag_torso"), None]);
        assert!(links.iter().all(|&(_, _, _, target)| target == 0));
    }

    #[test]
    fn test_missing_part() {
        let mut vfs = vfs();
        let mut group = loaded();

        let mut files = (*vfs.files).clone();
        files.remove("head.skin");
        vfs.files = std::sync::Arc::new(files);

        let err = group.load_from_vfs(&vfs, &Md3Info::default(), &mut Resources::new()).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(name) if name == "head.skin"));
        assert!(!group.is_loaded());
    }

    #[test]
    fn test_draw_hierarchy() {
        let mut group = loaded();
        let mut renderer = Capture::default();

        group.draw(&mut renderer, 0.0).unwrap();
        assert_eq!(renderer.draws.len(), 3);

        let origin = |m: &Matrix16<f32>| m.transform(&Vector3::zero());
        assert_eq!(renderer.draws[0].0, "lower.bmp");
        assert!(origin(&renderer.draws[0].1).abs_diff_eq(&Vector3::zero(), 1e-5));
        assert!(origin(&renderer.draws[1].1).abs_diff_eq(&Vector3::new(0.0, 0.0, 1.0), 1e-5));
        assert!(origin(&renderer.draws[2].1).abs_diff_eq(&Vector3::new(0.0, 0.0, 3.0), 1e-5));
    }

    #[test]
    fn test_tags_follow_animation() {
        let mut group = loaded();
        assert!(group.set_animation("lower", Md3Gesture::LegsWalk));

        let mut renderer = Capture::default();
        group.draw(&mut renderer, 50.0).unwrap();

        // halfway between the torso tag of frame 0 and frame 1
        let upper = renderer.draws[1].1.transform(&Vector3::zero());
        assert!(upper.abs_diff_eq(&Vector3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn test_set_animation() {
        let mut group = loaded();

        assert!(!group.set_animation("missing", Md3Gesture::LegsWalk));
        assert!(!group.set_animation("head", Md3Gesture::TorsoStand));
        assert!(!group.set_animation("upper", Md3Gesture::LegsWalk));
        assert!(group.set_animation("upper", Md3Gesture::TorsoAttack));

        let upper = group.item("upper").unwrap();
        assert_eq!(upper.animation.gesture, Some(Md3Gesture::TorsoAttack as usize));
        assert!(!upper.animation.looping);
    }

    #[test]
    fn test_animation_end_per_item() {
        let ends = Rc::new(RefCell::new(Vec::new()));
        let mut group = Md3Group::new();
        group.set_callbacks(Box::new(Ends(ends.clone())));
        group.load_from_vfs(&vfs(), &Md3Info::default(), &mut Resources::new()).unwrap();
        group.set_force_loop(false);

        group.set_animation("upper", Md3Gesture::TorsoAttack);
        group.set_animation("lower", Md3Gesture::LegsRun);

        let mut renderer = Capture::default();
        for _ in 0..4 {
            group.draw(&mut renderer, 100.0).unwrap();
        }

        assert_eq!(*ends.borrow(), vec![(1, Md3Gesture::TorsoAttack as usize)]);
    }

    #[test]
    fn test_hash_and_cache() {
        let mut group = loaded();
        let base = group.hash();

        group.draw(&mut Capture::default(), 0.0).unwrap();
        assert_eq!(group.cache_len(), 3);

        group.set_color(Color::rgba(0, 0, 0, 255));
        assert_eq!(group.cache_len(), 0);
        assert_ne!(group.hash(), base);

        group.set_color(Color::WHITE);
        assert_eq!(group.hash(), base);
    }
}
