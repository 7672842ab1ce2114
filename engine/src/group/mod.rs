pub mod animation;
pub mod config;
pub mod md2_group;
pub mod md3_group;

pub use animation::{AnimationClock, AnimationRange, AnimationStep};
pub use config::{GroupConfig, ModelKind};
pub use md2_group::{Md2Group, Md2Info};
pub use md3_group::{Md3Group, Md3Info, Md3Item, Md3Link};

use std::str::FromStr;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::{
    collision::AabbTree,
    error::ConfigError,
    geometry::{Matrix16, Vector3},
    hash::HashChain,
    models::{FramedModel, Mesh, ModelSettings},
    texture::{ModelTexture, Texture},
};

/// Order in which scaling, rotation and translation are applied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
pub enum MatrixCombination {
    #[default]
    ScaleRotateTranslate = 0,
    ScaleTranslateRotate,
    RotateTranslateScale,
    RotateScaleTranslate,
    TranslateRotateScale,
    TranslateScaleRotate,
}

impl MatrixCombination {
    pub fn from_index(index: u32) -> Option<Self> {
        Self::from_u32(index)
    }
}

impl FromStr for MatrixCombination {
    type Err = ConfigError;

    /// Accepts the short names (`srt`, `trs`, ...) or their numeric index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidValue {
            key: "combination".to_owned(),
            value: s.to_owned(),
        };

        if let Ok(index) = s.trim().parse::<u32>() {
            return Self::from_index(index).ok_or_else(invalid);
        }

        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::ScaleRotateTranslate),
            "str" => Ok(Self::ScaleTranslateRotate),
            "rts" => Ok(Self::RotateTranslateScale),
            "rst" => Ok(Self::RotateScaleTranslate),
            "trs" => Ok(Self::TranslateRotateScale),
            "tsr" => Ok(Self::TranslateScaleRotate),
            _ => Err(invalid()),
        }
    }
}

/// Position, orientation and size of a whole group.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroupTransform {
    pub translation: Vector3<f32>,
    /// Angles in radians around each of `rotation_axes`.
    pub rotation: Vector3<f32>,
    pub scaling: Vector3<f32>,
    pub rotation_axes: [Vector3<f32>; 3],
    pub combination: MatrixCombination,
    /// Applied before everything else when set.
    pub initial_matrix: Option<Matrix16<f32>>,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            translation: Vector3::zero(),
            rotation: Vector3::zero(),
            scaling: Vector3::splat(1.0),
            rotation_axes: [
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ],
            combination: MatrixCombination::default(),
            initial_matrix: None,
        }
    }
}

impl GroupTransform {
    pub fn scale_matrix(&self) -> Matrix16<f32> {
        let mut m = Matrix16::identity();
        m.scale(&self.scaling);
        m
    }

    /// Rotation around the x axis, then y, then z.
    pub fn rotation_matrix(&self) -> Matrix16<f32> {
        let angles = [self.rotation.x, self.rotation.y, self.rotation.z];

        angles
            .iter()
            .zip(self.rotation_axes.iter())
            .fold(Matrix16::identity(), |m, (&angle, axis)| {
                let mut r = Matrix16::identity();
                r.rotate(angle, axis);
                m.multiply(&r)
            })
    }

    pub fn translation_matrix(&self) -> Matrix16<f32> {
        let mut m = Matrix16::identity();
        m.translate(&self.translation);
        m
    }

    /// Model matrix of the group.
    pub fn matrix(&self) -> Matrix16<f32> {
        let (s, r, t) = (
            self.scale_matrix(),
            self.rotation_matrix(),
            self.translation_matrix(),
        );

        let order = match self.combination {
            MatrixCombination::ScaleRotateTranslate => [s, r, t],
            MatrixCombination::ScaleTranslateRotate => [s, t, r],
            MatrixCombination::RotateTranslateScale => [r, t, s],
            MatrixCombination::RotateScaleTranslate => [r, s, t],
            MatrixCombination::TranslateRotateScale => [t, r, s],
            MatrixCombination::TranslateScaleRotate => [t, s, r],
        };

        order
            .iter()
            .fold(self.initial_matrix.unwrap_or_default(), |m, step| m.multiply(step))
    }
}

/// Everything a host needs to restore a group to an earlier pose.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupState {
    pub transform: GroupTransform,
    pub animations: Vec<ItemAnimation>,
}

/// Animation state of one item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemAnimation {
    pub gesture: Option<usize>,
    pub clock: AnimationClock,
    pub looping: bool,
}

/// Frame data handed to [`GroupCallbacks::on_draw_item`].
pub struct DrawItem<'a> {
    pub index: usize,
    pub model: &'a FramedModel,
    pub textures: &'a [ModelTexture],
    pub matrix: &'a Matrix16<f32>,
    pub frame: u32,
    pub next_frame: u32,
    pub factor: f32,
    pub mesh: &'a Mesh,
    pub next_mesh: &'a Mesh,
}

/// Hooks a host can install on a group. Every method defaults to doing nothing.
pub trait GroupCallbacks {
    fn on_hash_code_changed(&mut self, _hash: u32) {}

    /// Decodes a texture the group cannot read itself.
    fn on_load_texture(&mut self, _name: &str, _data: &[u8]) -> Option<Texture> {
        None
    }

    /// Returns true when the item was drawn by the host.
    fn on_draw_item(&mut self, _item: &DrawItem) -> bool {
        false
    }

    fn on_animation_end(&mut self, _item: usize, _gesture: usize) {}

    /// Collision tree of the frame just drawn, in model space.
    fn on_detect_collision(&mut self, _model_matrix: &Matrix16<f32>, _tree: &AabbTree) {}
}

/// Callbacks that ignore every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoCallbacks;

impl GroupCallbacks for NoCallbacks {}

/// Chains the mesh building settings into a group hash.
pub(crate) fn hash_settings(chain: HashChain, settings: &ModelSettings) -> HashChain {
    let light = &settings.light;

    chain
        .u32(settings.format.bits())
        .u32(settings.color.to_argb())
        .bool(light.enabled)
        .u32(light.color.to_argb())
        .u32(light.ambient.to_argb())
        .f32(light.direction.x)
        .f32(light.direction.y)
        .f32(light.direction.z)
}

/// Cached output of one frame.
#[derive(Clone, Debug, Default)]
pub struct CachedFrame {
    pub mesh: Mesh,
    pub tree: AabbTree,
}

#[cfg(test)]
mod group_tests {
    use super::*;

    #[test]
    fn test_parse_combination() {
        assert_eq!("trs".parse::<MatrixCombination>().unwrap(), MatrixCombination::TranslateRotateScale);
        assert_eq!(" RST ".parse::<MatrixCombination>().unwrap(), MatrixCombination::RotateScaleTranslate);
        assert_eq!("5".parse::<MatrixCombination>().unwrap(), MatrixCombination::TranslateScaleRotate);

        assert!(matches!(
            "6".parse::<MatrixCombination>(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!("rrr".parse::<MatrixCombination>().is_err());
    }

    #[test]
    fn test_default_is_identity() {
        let transform = GroupTransform::default();
        assert!(transform.matrix().abs_diff_eq(&Matrix16::identity(), 1e-6));
    }

    #[test]
    fn test_combination_order() {
        let mut transform = GroupTransform {
            translation: Vector3::new(1.0, 0.0, 0.0),
            scaling: Vector3::splat(2.0),
            ..Default::default()
        };
        let origin = Vector3::new(1.0, 1.0, 1.0);

        // scale then translate
        transform.combination = MatrixCombination::ScaleRotateTranslate;
        assert_eq!(transform.matrix().transform(&origin), Vector3::new(3.0, 2.0, 2.0));

        // translate then scale
        transform.combination = MatrixCombination::TranslateRotateScale;
        assert_eq!(transform.matrix().transform(&origin), Vector3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_rotation_axes() {
        let transform = GroupTransform {
            rotation: Vector3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            ..Default::default()
        };

        let v = transform.matrix().transform(&Vector3::new(1.0, 0.0, 0.0));
        assert!(v.abs_diff_eq(&Vector3::new(0.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_initial_matrix_first() {
        let mut initial = Matrix16::identity();
        initial.translate(&Vector3::new(0.0, 5.0, 0.0));

        let transform = GroupTransform {
            scaling: Vector3::splat(2.0),
            initial_matrix: Some(initial),
            ..Default::default()
        };

        assert_eq!(
            transform.matrix().transform(&Vector3::zero()),
            Vector3::new(0.0, 10.0, 0.0)
        );
    }
}
