// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_test_models.rs — small in-memory Ghoul2 assets shared by the unit tests
//
// Skeleton: model_root(0) -> arm(1), head_bone(2) -> jaw(3, ALWAYSXFORM)
// Mesh:     torso(0) -> head(1) -> face(2)
//                    -> tag_hand(3, ISBOLT)
//                    -> r_arm(4)
// The torso is a 16x16 quad in the x=0 plane facing +x.

use jk2_common::q_shared::Vec3;

use crate::g2_api::init_ghoul2_model;
use crate::g2_model::ModelCache;
use crate::g2_types::*;

pub const TEST_GLA: &str = "models/test/skeleton";
pub const TEST_GLM: &str = "models/test/body.glm";

pub const SURF_TORSO: i32 = 0;
pub const SURF_HEAD: i32 = 1;
pub const SURF_FACE: i32 = 2;
pub const SURF_TAG_HAND: i32 = 3;
pub const SURF_R_ARM: i32 = 4;

pub const BONE_ROOT: i32 = 0;
pub const BONE_ARM: i32 = 1;
pub const BONE_HEAD: i32 = 2;
pub const BONE_JAW: i32 = 3;

pub fn test_skeleton() -> MdxaHeader {
    let mut skel = MdxaHeader::new(TEST_GLA);
    skel.add_bone("model_root", -1, MdxaBone::IDENTITY, SkelBoneFlags::empty());
    skel.add_bone("arm", 0, MdxaBone::from_translation(&[0.0, 12.0, 4.0]), SkelBoneFlags::empty());
    skel.add_bone("head_bone", 0, MdxaBone::from_translation(&[0.0, 0.0, 20.0]), SkelBoneFlags::empty());
    skel.add_bone("jaw", 2, MdxaBone::from_translation(&[0.0, 0.0, 22.0]), SkelBoneFlags::ALWAYSXFORM);
    skel
}

fn surface(index: i32, bone: i32, points: &[Vec3], tris: &[[i32; 3]], st: &[[f32; 2]]) -> MdxmSurface {
    MdxmSurface {
        this_surface_index: index,
        verts: points
            .iter()
            .map(|p| MdxmVertex::new(*p, [1.0, 0.0, 0.0], &[(0, 1.0)]))
            .collect(),
        tex_coords: st.to_vec(),
        triangles: tris.iter().map(|&indexes| MdxmTriangle { indexes }).collect(),
        bone_references: vec![bone],
    }
}

fn lod_surfaces() -> Vec<MdxmSurface> {
    let tri_st = [[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]];
    vec![
        surface(
            SURF_TORSO,
            BONE_ROOT,
            &[[0.0, -8.0, 0.0], [0.0, 8.0, 0.0], [0.0, 8.0, 16.0], [0.0, -8.0, 16.0]],
            &[[0, 1, 2], [0, 2, 3]],
            &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        ),
        surface(
            SURF_HEAD,
            BONE_HEAD,
            &[[0.0, -4.0, 20.0], [0.0, 4.0, 20.0], [0.0, 0.0, 28.0]],
            &[[0, 1, 2]],
            &tri_st,
        ),
        surface(
            SURF_FACE,
            BONE_HEAD,
            &[[1.0, -2.0, 22.0], [1.0, 2.0, 22.0], [1.0, 0.0, 26.0]],
            &[[0, 1, 2]],
            &tri_st,
        ),
        surface(
            SURF_TAG_HAND,
            BONE_ARM,
            &[[0.0, 12.0, 0.0], [0.0, 13.0, 0.0], [0.0, 12.0, 1.0]],
            &[[0, 1, 2]],
            &tri_st,
        ),
        surface(
            SURF_R_ARM,
            BONE_ARM,
            &[[0.0, 10.0, 0.0], [0.0, 14.0, 0.0], [0.0, 12.0, 8.0]],
            &[[0, 1, 2]],
            &tri_st,
        ),
    ]
}

pub fn test_mesh() -> MdxmHeader {
    let mut mesh = MdxmHeader::new(TEST_GLM, TEST_GLA);
    mesh.add_surface("torso", -1, SurfaceFlags::empty(), "models/test/torso");
    mesh.add_surface("head", SURF_TORSO, SurfaceFlags::empty(), "models/test/head");
    mesh.add_surface("face", SURF_HEAD, SurfaceFlags::empty(), "models/test/face");
    mesh.add_surface("tag_hand", SURF_TORSO, SurfaceFlags::ISBOLT, "");
    mesh.add_surface("r_arm", SURF_TORSO, SurfaceFlags::empty(), "models/test/arm");
    mesh.add_lod(lod_surfaces());
    mesh.add_lod(lod_surfaces());
    mesh
}

/// Cache holding the test skeleton and mesh; returns the mesh handle.
pub fn test_cache() -> (ModelCache, QHandle) {
    let mut cache = ModelCache::new();
    cache.register_gla(test_skeleton()).unwrap();
    let handle = cache.register_glm(test_mesh()).unwrap();
    (cache, handle)
}

/// Collection holding one instance of the test mesh at index 0.
pub fn test_instance(cache: &ModelCache) -> Ghoul2InfoV {
    let mut ghoul2 = Ghoul2InfoV::new();
    let idx = init_ghoul2_model(&mut ghoul2, cache, TEST_GLM, 1, 0, 0, ModelFlags::empty(), 0);
    assert_eq!(idx, 0);
    ghoul2
}

/// Torso triangle 0 centroid, in model space.
pub fn torso_centroid() -> Vec3 {
    [0.0, 8.0 / 3.0, 16.0 / 3.0]
}
