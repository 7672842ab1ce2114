use std::{cell::RefCell, rc::Rc};

use qr_engine::{
    collision::AabbTree,
    geometry::{Matrix16, Ray},
    group::{DrawItem, GroupCallbacks},
    models::md3::Md3Gesture,
    texture::Texture,
};

#[derive(Debug, Default)]
pub struct Stats {
    pub hash: u32,
    pub hits: usize,
    pub ended: Vec<(usize, usize)>,
    pub placeholders: Vec<String>,
}

/// Logs group events and picks the drawn frames with a world space ray.
pub struct ExplorerCallbacks {
    pub ray: Option<Ray<f32>>,
    pub stats: Rc<RefCell<Stats>>,
}

impl GroupCallbacks for ExplorerCallbacks {
    fn on_hash_code_changed(&mut self, hash: u32) {
        log::info!("model hash {hash:#010x}");
        self.stats.borrow_mut().hash = hash;
    }

    // tga and jpg skins get a flat grey stand in
    fn on_load_texture(&mut self, name: &str, _data: &[u8]) -> Option<Texture> {
        if name.to_ascii_lowercase().ends_with(".bmp") {
            return None;
        }

        log::warn!("no decoder for {name:?}, using a placeholder");
        self.stats.borrow_mut().placeholders.push(name.to_owned());
        Some(Texture::new(name, 1, 1, vec![128, 128, 128]))
    }

    fn on_draw_item(&mut self, item: &DrawItem) -> bool {
        log::trace!(
            "item {} frame {} -> {} ({:.2})",
            item.index,
            item.frame,
            item.next_frame,
            item.factor
        );
        false
    }

    fn on_animation_end(&mut self, item: usize, gesture: usize) {
        match Md3Gesture::from_index(gesture) {
            Some(g) => log::info!("item {item} finished {g:?}"),
            None => log::info!("item {item} finished gesture {gesture}"),
        }
        self.stats.borrow_mut().ended.push((item, gesture));
    }

    fn on_detect_collision(&mut self, model_matrix: &Matrix16<f32>, tree: &AabbTree) {
        let Some(ray) = self.ray else {
            return;
        };
        let Some(inverse) = model_matrix.inverse() else {
            return;
        };

        let local = Ray::new(inverse.transform(&ray.pos()), inverse.transform_normal(&ray.dir()));
        let hits = tree.hits(&local);
        if !hits.is_empty() {
            log::debug!("ray hits {} polygons", hits.len());
            self.stats.borrow_mut().hits += hits.len();
        }
    }
}
