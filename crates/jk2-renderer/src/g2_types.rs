// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_types.rs — Ghoul2 model formats and per-instance override records
// mdxa* structures describe the shared skeleton, mdxm* the shared mesh.
// Everything else is per instance and mutated at run time.

use jk2_common::miniheap::HeapSpan;
use jk2_common::q_shared::{angles_to_axis, Vec3};

pub type QHandle = i32;

pub const MAX_G2_COLLISIONS: usize = 16;
pub const MAX_G2_MODELS: usize = 1024;
pub const MAX_BONE_WEIGHTS: usize = 4;

/// Surface id stored in the override list for generated surfaces.
pub const G2_GENERATED_SURFACE: i32 = 10000;

// bolt links between models in one collection
pub const MODEL_AND: i32 = 0x3ff;
pub const MODEL_SHIFT: i32 = 10;
pub const BOLT_AND: i32 = 0x3ff;
pub const BOLT_SHIFT: i32 = 0;

// collision record face flags
pub const G2_BACKFACE: i32 = 0;
pub const G2_FRONTFACE: i32 = 1;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SurfaceFlags: i32 {
        /// Tag surface used only to locate bolts; never drawn or traced.
        const ISBOLT        = 0x0001;
        const OFF           = 0x0002;
        /// When combined with OFF, the whole subtree is skipped.
        const NODESCENDANTS = 0x0100;
        const GENERATED     = 0x0200;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BoneFlags: i32 {
        const ANGLES_PREMULT  = 0x0001;
        const ANGLES_POSTMULT = 0x0002;
        const ANGLES_REPLACE  = 0x0004;
        const ANGLES_TOTAL    = Self::ANGLES_PREMULT.bits()
                              | Self::ANGLES_POSTMULT.bits()
                              | Self::ANGLES_REPLACE.bits();
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SkelBoneFlags: i32 {
        /// Evaluated whenever its parent is in use.
        const ALWAYSXFORM = 0x0001;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModelFlags: i32 {
        const NOCOLLIDE = 0x0001;
        const NORENDER  = 0x0002;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TraceFlags: i32 {
        /// Stop at the first accepted hit with a minimal record.
        const RETURNONHIT = 0x0001;
    }
}

// ============================================================
// 3x4 affine matrix
// ============================================================

/// Row-major 3x4 matrix; the fourth column is the translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MdxaBone {
    pub matrix: [[f32; 4]; 3],
}

impl Default for MdxaBone {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl MdxaBone {
    pub const IDENTITY: MdxaBone = MdxaBone {
        matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Rotation from euler angles with the forward/left/up axes as columns,
    /// then the given translation.
    pub fn from_angles(angles: &Vec3, origin: &Vec3) -> Self {
        let axis = angles_to_axis(angles);
        let mut m = Self::IDENTITY;
        for row in 0..3 {
            for col in 0..3 {
                m.matrix[row][col] = axis[col][row];
            }
            m.matrix[row][3] = origin[row];
        }
        m
    }

    pub fn from_translation(origin: &Vec3) -> Self {
        let mut m = Self::IDENTITY;
        for row in 0..3 {
            m.matrix[row][3] = origin[row];
        }
        m
    }

    /// Inverse of a rigid transform: transposed rotation, rotated negated translation.
    pub fn inverse(&self) -> Self {
        let src = &self.matrix;
        let mut dest = [[0.0f32; 4]; 3];
        for row in 0..3 {
            for col in 0..3 {
                dest[row][col] = src[col][row];
            }
        }
        for row in 0..3 {
            dest[row][3] = -(dest[row][0] * src[0][3]
                + dest[row][1] * src[1][3]
                + dest[row][2] * src[2][3]);
        }
        Self { matrix: dest }
    }

    /// `self * rhs`, treating both as 4x4 with an implicit 0 0 0 1 row.
    pub fn multiply(&self, rhs: &MdxaBone) -> Self {
        let a = &self.matrix;
        let b = &rhs.matrix;
        let mut out = [[0.0f32; 4]; 3];
        for row in 0..3 {
            for col in 0..4 {
                out[row][col] = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
            }
            out[row][3] += a[row][3];
        }
        Self { matrix: out }
    }

    /// Rotate only.
    pub fn transform_point(&self, v: &Vec3) -> Vec3 {
        let m = &self.matrix;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Rotate then translate.
    pub fn transform_and_translate_point(&self, v: &Vec3) -> Vec3 {
        let r = self.transform_point(v);
        [
            r[0] + self.matrix[0][3],
            r[1] + self.matrix[1][3],
            r[2] + self.matrix[2][3],
        ]
    }

    /// Coefficient-wise blend of the twelve entries. Not rigid in general.
    pub fn lerp(&self, to: &MdxaBone, frac: f32) -> Self {
        let mut out = *self;
        for row in 0..3 {
            for col in 0..4 {
                let a = self.matrix[row][col];
                out.matrix[row][col] = a + (to.matrix[row][col] - a) * frac;
            }
        }
        out
    }
}

// ============================================================
// Skeleton (.gla)
// ============================================================

#[derive(Clone, Debug, Default)]
pub struct MdxaSkel {
    pub name: String,
    pub flags: SkelBoneFlags,
    pub parent: i32,
    pub base_pose_mat: MdxaBone,
    pub base_pose_mat_inv: MdxaBone,
    pub children: Vec<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct MdxaHeader {
    pub name: String,
    pub bones: Vec<MdxaSkel>,
}

// ============================================================
// Mesh (.glm)
// ============================================================

#[derive(Clone, Debug, Default)]
pub struct MdxmSurfHierarchy {
    pub name: String,
    pub flags: SurfaceFlags,
    pub shader: String,
    pub shader_index: QHandle,
    pub parent_index: i32,
    pub child_indexes: Vec<i32>,
}

/// A mesh vertex. Only the first `num_weights - 1` weights are stored; the
/// last one is whatever remains of 1.0.
#[derive(Clone, Copy, Debug, Default)]
pub struct MdxmVertex {
    pub normal: Vec3,
    pub vert_coords: Vec3,
    pub num_weights: u8,
    pub bone_refs: [u8; MAX_BONE_WEIGHTS],
    pub weights: [f32; MAX_BONE_WEIGHTS - 1],
}

impl MdxmVertex {
    /// Build a vertex from (bone reference, weight) pairs. The weight of the
    /// final pair is ignored.
    pub fn new(vert_coords: Vec3, normal: Vec3, weightings: &[(u8, f32)]) -> Self {
        let mut v = Self {
            normal,
            vert_coords,
            num_weights: weightings.len().min(MAX_BONE_WEIGHTS) as u8,
            ..Default::default()
        };
        for (k, &(bone_ref, weight)) in weightings.iter().take(MAX_BONE_WEIGHTS).enumerate() {
            v.bone_refs[k] = bone_ref;
            if k < MAX_BONE_WEIGHTS - 1 {
                v.weights[k] = weight;
            }
        }
        v
    }

    pub fn num_weights(&self) -> usize {
        self.num_weights as usize
    }

    pub fn bone_ref(&self, k: usize) -> usize {
        self.bone_refs[k] as usize
    }

    /// Weight `k`, accumulating into `total`; the last weight is derived.
    pub fn bone_weight(&self, k: usize, total: &mut f32) -> f32 {
        if k + 1 < self.num_weights() {
            let w = self.weights[k];
            *total += w;
            w
        } else {
            1.0 - *total
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MdxmTriangle {
    pub indexes: [i32; 3],
}

#[derive(Clone, Debug, Default)]
pub struct MdxmSurface {
    pub this_surface_index: i32,
    pub verts: Vec<MdxmVertex>,
    pub tex_coords: Vec<[f32; 2]>,
    pub triangles: Vec<MdxmTriangle>,
    /// Vertex bone refs index this list; entries are skeleton bone indices.
    pub bone_references: Vec<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct MdxmLod {
    pub surfaces: Vec<MdxmSurface>,
}

#[derive(Clone, Debug, Default)]
pub struct MdxmHeader {
    pub name: String,
    pub anim_name: String,
    pub anim_index: QHandle,
    pub surf_hierarchy: Vec<MdxmSurfHierarchy>,
    pub lods: Vec<MdxmLod>,
}

#[derive(Clone, Debug, Default)]
pub enum ModelData {
    #[default]
    Bad,
    Mdxa(MdxaHeader),
    Mdxm(MdxmHeader),
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub index: QHandle,
    pub data: ModelData,
    pub num_lods: i32,
}

// ============================================================
// Shaders, skins and hit maps
// ============================================================

/// Byte map sampled at the hit texture coordinate.
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl HitMap {
    pub fn sample(&self, s: f32, t: f32) -> i32 {
        let idx = (t * self.height as f32) as i32 * self.width + (s * self.width as f32) as i32;
        self.data.get(idx as usize).map_or(0, |&b| b as i32)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Shader {
    pub name: String,
    pub index: QHandle,
    /// Index into the hit map table, 0 for none.
    pub hit_location: i32,
    pub hit_material: i32,
}

#[derive(Clone, Debug, Default)]
pub struct SkinSurface {
    pub name: String,
    pub shader: QHandle,
}

#[derive(Clone, Debug, Default)]
pub struct Skin {
    pub name: String,
    pub surfaces: Vec<SkinSurface>,
}

// ============================================================
// Per-instance override lists
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceInfo {
    pub off_flags: SurfaceFlags,
    /// Hierarchy index, `G2_GENERATED_SURFACE` or -1 when free.
    pub surface: i32,
    pub gen_barycentric_j: f32,
    pub gen_barycentric_i: f32,
    /// `(poly << 16) | surface`, both 16 bits.
    pub gen_poly_surface_index: i32,
    pub gen_lod: i32,
}

impl SurfaceInfo {
    pub const FREE: SurfaceInfo = SurfaceInfo {
        off_flags: SurfaceFlags::empty(),
        surface: -1,
        gen_barycentric_j: -1.0,
        gen_barycentric_i: -1.0,
        gen_poly_surface_index: -1,
        gen_lod: -1,
    };

    pub fn is_free(&self) -> bool {
        self.surface == -1
    }

    pub fn is_generated(&self) -> bool {
        self.off_flags.contains(SurfaceFlags::GENERATED)
    }

    /// Hierarchy surface a generated entry was spawned from.
    pub fn gen_surface(&self) -> i32 {
        self.gen_poly_surface_index & 0xffff
    }

    pub fn gen_poly(&self) -> i32 {
        (self.gen_poly_surface_index >> 16) & 0xffff
    }
}

impl Default for SurfaceInfo {
    fn default() -> Self {
        Self::FREE
    }
}

pub fn pack_poly_surface_index(poly: i32, surface: i32) -> i32 {
    ((poly & 0xffff) << 16) | (surface & 0xffff)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneInfo {
    /// Skeleton bone index, -1 when free.
    pub bone_number: i32,
    pub matrix: MdxaBone,
    /// Interpolated matrix used when building the skeleton.
    pub new_matrix: MdxaBone,
    pub flags: BoneFlags,
    pub blend_start: i32,
    pub blend_time: i32,
}

impl BoneInfo {
    pub const FREE: BoneInfo = BoneInfo {
        bone_number: -1,
        matrix: MdxaBone::IDENTITY,
        new_matrix: MdxaBone::IDENTITY,
        flags: BoneFlags::empty(),
        blend_start: 0,
        blend_time: 0,
    };

    pub fn is_free(&self) -> bool {
        self.bone_number == -1
    }
}

impl Default for BoneInfo {
    fn default() -> Self {
        Self::FREE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoltInfo {
    pub bone_number: i32,
    pub surface_number: i32,
    /// Empty for hierarchy surfaces, GENERATED when `surface_number` is an
    /// override list slot.
    pub surface_type: SurfaceFlags,
    pub bolt_used: i32,
}

impl BoltInfo {
    pub const FREE: BoltInfo = BoltInfo {
        bone_number: -1,
        surface_number: -1,
        surface_type: SurfaceFlags::empty(),
        bolt_used: 0,
    };

    pub fn is_free(&self) -> bool {
        self.bone_number == -1 && self.surface_number == -1
    }
}

impl Default for BoltInfo {
    fn default() -> Self {
        Self::FREE
    }
}

pub fn pack_bolt_link(model: i32, bolt: i32) -> i32 {
    ((model & MODEL_AND) << MODEL_SHIFT) | ((bolt & BOLT_AND) << BOLT_SHIFT)
}

/// (model index, bolt index) of a packed link.
pub fn unpack_bolt_link(link: i32) -> (i32, i32) {
    ((link >> MODEL_SHIFT) & MODEL_AND, (link >> BOLT_SHIFT) & BOLT_AND)
}

// ============================================================
// Model instance
// ============================================================

#[derive(Clone, Debug)]
pub struct Ghoul2Info {
    pub slist: Vec<SurfaceInfo>,
    pub blist: Vec<BoneInfo>,
    pub bltlist: Vec<BoltInfo>,
    /// Caller's model index; -1 marks an empty slot in the collection.
    pub model_index: i32,
    pub custom_shader: QHandle,
    pub custom_skin: QHandle,
    /// Packed (model, bolt) this instance hangs from, -1 if free standing.
    pub model_bolt_link: i32,
    pub surface_root: i32,
    pub lod_bias: i32,
    pub flags: ModelFlags,
    pub model: QHandle,
    pub file_name: String,
    pub mesh_frame_num: i32,
    /// Skinned vertices per hierarchy surface for `mesh_frame_num`.
    pub transformed_verts: Vec<Option<HeapSpan>>,
    /// Evaluated skinning matrix per skeleton bone.
    pub bone_cache: Vec<MdxaBone>,
}

impl Default for Ghoul2Info {
    fn default() -> Self {
        Self {
            slist: Vec::new(),
            blist: Vec::new(),
            bltlist: Vec::new(),
            model_index: -1,
            custom_shader: 0,
            custom_skin: 0,
            model_bolt_link: -1,
            surface_root: 0,
            lod_bias: 0,
            flags: ModelFlags::empty(),
            model: 0,
            file_name: String::new(),
            mesh_frame_num: -1,
            transformed_verts: Vec::new(),
            bone_cache: Vec::new(),
        }
    }
}

impl Ghoul2Info {
    pub fn is_active(&self) -> bool {
        self.model_index != -1
    }
}

pub type Ghoul2InfoV = Vec<Ghoul2Info>;

// ============================================================
// Collision records
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionRecord {
    pub distance: f32,
    /// -1 marks a free record.
    pub entity_num: i32,
    pub model_index: i32,
    pub poly_index: i32,
    pub surface_index: i32,
    pub collision_position: Vec3,
    pub collision_normal: Vec3,
    pub flags: i32,
    pub material: i32,
    pub location: i32,
    pub barycentric_i: f32,
    pub barycentric_j: f32,
}

impl CollisionRecord {
    pub const EMPTY: CollisionRecord = CollisionRecord {
        distance: 100000.0,
        entity_num: -1,
        model_index: 0,
        poly_index: 0,
        surface_index: 0,
        collision_position: [0.0; 3],
        collision_normal: [0.0; 3],
        flags: 0,
        material: 0,
        location: 0,
        barycentric_i: 0.0,
        barycentric_j: 0.0,
    };

    pub fn is_free(&self) -> bool {
        self.entity_num == -1
    }
}

impl Default for CollisionRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}
