use crate::{
    collision::AabbTree,
    error::MeshError,
    models::{
        md2::Md2Model, md3::Md3Model, mesh_polygons, Color, DirectionalLight, Mesh, VertexFormat,
        VertexFormats,
    },
};

/// Handedness the built meshes are expressed in. Files are right handed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CoordinateSystem {
    #[default]
    RightHanded,
    LeftHanded,
}

/// Options applied while building meshes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelSettings {
    pub format: VertexFormats,
    pub color: Color,
    pub light: DirectionalLight,
    pub coordinate_system: CoordinateSystem,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            format: VertexFormat::Colors.into(),
            color: Color::WHITE,
            light: DirectionalLight::default(),
            coordinate_system: CoordinateSystem::RightHanded,
        }
    }
}

impl ModelSettings {
    pub(crate) fn convert(&self, mut v: [f32; 3]) -> [f32; 3] {
        if self.coordinate_system == CoordinateSystem::LeftHanded {
            v[0] = -v[0];
        }
        v
    }
}

/// A model whose geometry is stored as a sequence of frames.
#[derive(Clone, Debug)]
pub enum FramedModel {
    Md2(Md2Model),
    Md3(Md3Model),
}

impl FramedModel {
    /// Builds the mesh of one frame.
    pub fn mesh(&self, frame: usize) -> Result<Mesh, MeshError> {
        match self {
            FramedModel::Md2(m) => m.mesh(frame),
            FramedModel::Md3(m) => m.mesh(frame),
        }
    }

    pub fn mesh_count(&self) -> usize {
        match self {
            FramedModel::Md2(m) => m.mesh_count(),
            FramedModel::Md3(m) => m.mesh_count(),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        match self {
            FramedModel::Md2(m) => &m.settings,
            FramedModel::Md3(m) => &m.settings,
        }
    }

    pub fn settings_mut(&mut self) -> &mut ModelSettings {
        match self {
            FramedModel::Md2(m) => &mut m.settings,
            FramedModel::Md3(m) => &mut m.settings,
        }
    }

    /// Content hash of the parsed file.
    pub fn hash(&self) -> u32 {
        match self {
            FramedModel::Md2(m) => m.parser.hash(),
            FramedModel::Md3(m) => m.parser.hash(),
        }
    }

    pub fn as_md2(&self) -> Option<&Md2Model> {
        match self {
            FramedModel::Md2(m) => Some(m),
            FramedModel::Md3(_) => None,
        }
    }

    pub fn as_md3(&self) -> Option<&Md3Model> {
        match self {
            FramedModel::Md3(m) => Some(m),
            FramedModel::Md2(_) => None,
        }
    }

    /// Collision tree over every triangle of `mesh`.
    pub fn populate_aabb_tree(mesh: &Mesh) -> AabbTree {
        AabbTree::populate(mesh_polygons(mesh))
    }
}

impl From<Md2Model> for FramedModel {
    fn from(value: Md2Model) -> Self {
        FramedModel::Md2(value)
    }
}

impl From<Md3Model> for FramedModel {
    fn from(value: Md3Model) -> Self {
        FramedModel::Md3(value)
    }
}
