// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_api.rs — entry points the game and server use to drive Ghoul2 instances

use std::cmp::Ordering;

use jk2_common::common::com_dprintf;
use jk2_common::g2_error::G2Error;
use jk2_common::miniheap::MiniHeap;
use jk2_common::q_shared::Vec3;

use crate::g2_bolts;
use crate::g2_bones;
use crate::g2_misc::{generate_world_matrix, trace_models, transform_model};
use crate::g2_model::{surf_hierarchy, ModelCache};
use crate::g2_surfaces;
use crate::g2_types::*;

/// Active instance `index` with its mesh and skeleton.
fn instance_mut<'g, 'c>(
    ghoul2: &'g mut Ghoul2InfoV,
    index: usize,
    cache: &'c ModelCache,
) -> Option<(&'g mut Ghoul2Info, &'c MdxmHeader, &'c MdxaHeader)> {
    let inst = ghoul2.get_mut(index).filter(|g| g.is_active())?;
    let (_, mdxm, mdxa) = cache.glm_and_gla(inst.model)?;
    Some((inst, mdxm, mdxa))
}

fn instance<'g, 'c>(
    ghoul2: &'g Ghoul2InfoV,
    index: usize,
    cache: &'c ModelCache,
) -> Option<(&'g Ghoul2Info, &'c MdxmHeader, &'c MdxaHeader)> {
    let inst = ghoul2.get(index).filter(|g| g.is_active())?;
    let (_, mdxm, mdxa) = cache.glm_and_gla(inst.model)?;
    Some((inst, mdxm, mdxa))
}

// ============================================================
// Instance lifetime
// ============================================================

/// Add an instance of a registered mesh to a collection, reusing the first
/// empty slot. Returns the slot, or -1 if the file is not a ghoul2 mesh.
pub fn init_ghoul2_model(
    ghoul2: &mut Ghoul2InfoV,
    cache: &ModelCache,
    file_name: &str,
    model_index: i32,
    custom_skin: QHandle,
    custom_shader: QHandle,
    model_flags: ModelFlags,
    lod_bias: i32,
) -> i32 {
    let handle = cache.model_handle(file_name);
    let Some(mdxm) = cache.mdxm(handle) else {
        com_dprintf(&format!("G2_InitGhoul2Model: {} is not a registered ghoul2 mesh\n", file_name));
        return -1;
    };
    if model_index == -1 {
        return -1;
    }

    let surface_root = mdxm
        .surf_hierarchy
        .iter()
        .position(|s| s.parent_index == -1)
        .map_or(0, |i| i as i32);
    let inst = Ghoul2Info {
        model_index,
        custom_skin,
        custom_shader,
        flags: model_flags,
        lod_bias,
        model: handle,
        file_name: file_name.to_string(),
        surface_root,
        ..Default::default()
    };

    if let Some(slot) = ghoul2.iter().position(|g| !g.is_active()) {
        ghoul2[slot] = inst;
        return slot as i32;
    }
    if ghoul2.len() >= MAX_G2_MODELS {
        com_dprintf("G2_InitGhoul2Model: collection is full\n");
        return -1;
    }
    ghoul2.push(inst);
    ghoul2.len() as i32 - 1
}

/// Empty a slot and trim empty slots off the end of the collection.
pub fn remove_ghoul2_model(ghoul2: &mut Ghoul2InfoV, index: usize) -> bool {
    match ghoul2.get_mut(index) {
        Some(inst) if inst.is_active() => *inst = Ghoul2Info::default(),
        _ => return false,
    }
    while ghoul2.last().is_some_and(|g| !g.is_active()) {
        ghoul2.pop();
    }
    true
}

pub fn have_we_ghoul2_models(ghoul2: &Ghoul2InfoV) -> bool {
    ghoul2.iter().any(|g| g.is_active())
}

pub fn set_lod_bias(ghoul2: &mut Ghoul2InfoV, index: usize, lod_bias: i32) -> bool {
    match ghoul2.get_mut(index).filter(|g| g.is_active()) {
        Some(inst) => {
            inst.lod_bias = lod_bias;
            true
        }
        None => false,
    }
}

pub fn set_skin(ghoul2: &mut Ghoul2InfoV, index: usize, custom_skin: QHandle) -> bool {
    match ghoul2.get_mut(index).filter(|g| g.is_active()) {
        Some(inst) => {
            inst.custom_skin = custom_skin;
            true
        }
        None => false,
    }
}

pub fn set_shader(ghoul2: &mut Ghoul2InfoV, index: usize, custom_shader: QHandle) -> bool {
    match ghoul2.get_mut(index).filter(|g| g.is_active()) {
        Some(inst) => {
            inst.custom_shader = custom_shader;
            true
        }
        None => false,
    }
}

pub fn set_ghoul2_model_flags(ghoul2: &mut Ghoul2InfoV, index: usize, flags: ModelFlags) -> bool {
    match ghoul2.get_mut(index).filter(|g| g.is_active()) {
        Some(inst) => {
            inst.flags = flags;
            true
        }
        None => false,
    }
}

pub fn get_ghoul2_model_flags(ghoul2: &Ghoul2InfoV, index: usize) -> ModelFlags {
    ghoul2.get(index).map_or(ModelFlags::empty(), |g| g.flags)
}

// ============================================================
// Surfaces
// ============================================================

pub fn set_surface_on_off(
    ghoul2: &mut Ghoul2InfoV,
    index: usize,
    cache: &ModelCache,
    surface_name: &str,
    flags: SurfaceFlags,
) -> bool {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, mdxm, _)) => g2_surfaces::set_surface_on_off(mdxm, &mut inst.slist, surface_name, flags),
        None => false,
    }
}

pub fn get_surface_on_off(ghoul2: &Ghoul2InfoV, index: usize, cache: &ModelCache, surface_name: &str) -> SurfaceFlags {
    match instance(ghoul2, index, cache) {
        Some((inst, mdxm, _)) => g2_surfaces::is_surface_off(mdxm, &inst.slist, surface_name),
        None => SurfaceFlags::empty(),
    }
}

pub fn get_surface_render_status(
    ghoul2: &Ghoul2InfoV,
    index: usize,
    cache: &ModelCache,
    surface_name: &str,
) -> Option<SurfaceFlags> {
    let (inst, mdxm, _) = instance(ghoul2, index, cache)?;
    g2_surfaces::is_surface_rendered(mdxm, surface_name, &inst.slist)
}

pub fn set_root_surface(ghoul2: &mut Ghoul2InfoV, index: usize, cache: &ModelCache, surface_name: &str) -> bool {
    g2_surfaces::set_root_surface(ghoul2, index, cache, surface_name)
}

/// Spawn a generated surface on a polygon. Returns its override list slot.
pub fn add_surface(
    ghoul2: &mut Ghoul2InfoV,
    index: usize,
    cache: &ModelCache,
    surface_number: i32,
    poly_number: i32,
    barycentric_i: f32,
    barycentric_j: f32,
    lod: i32,
) -> i32 {
    let Some(inst) = ghoul2.get_mut(index).filter(|g| g.is_active()) else {
        return -1;
    };
    let model = cache.get_model_by_handle(inst.model);
    g2_surfaces::add_surface(inst, model, surface_number, poly_number, barycentric_i, barycentric_j, lod)
}

pub fn remove_surface(ghoul2: &mut Ghoul2InfoV, index: usize, surface_index: usize) -> bool {
    match ghoul2.get_mut(index) {
        Some(inst) => g2_surfaces::remove_surface(&mut inst.slist, surface_index),
        None => false,
    }
}

pub fn get_parent_surface(ghoul2: &Ghoul2InfoV, index: usize, cache: &ModelCache, surface: i32) -> i32 {
    instance(ghoul2, index, cache).map_or(-1, |(_, mdxm, _)| g2_surfaces::get_parent_surface(mdxm, surface))
}

pub fn get_surface_index(ghoul2: &Ghoul2InfoV, index: usize, cache: &ModelCache, surface_name: &str) -> i32 {
    instance(ghoul2, index, cache).map_or(-1, |(_, mdxm, _)| g2_surfaces::get_surface_index(mdxm, surface_name))
}

pub fn get_surface_name<'c>(ghoul2: &Ghoul2InfoV, index: usize, cache: &'c ModelCache, surface: i32) -> Option<&'c str> {
    let (_, mdxm, _) = instance(ghoul2, index, cache)?;
    surf_hierarchy(mdxm, surface).map(|s| s.name.as_str())
}

// ============================================================
// Bolts
// ============================================================

pub fn add_bolt(ghoul2: &mut Ghoul2InfoV, index: usize, cache: &ModelCache, name: &str) -> i32 {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, mdxm, mdxa)) => g2_bolts::add_bolt(mdxm, mdxa, &mut inst.bltlist, name),
        None => -1,
    }
}

pub fn add_bolt_surf_num(ghoul2: &mut Ghoul2InfoV, index: usize, surf_num: i32) -> i32 {
    match ghoul2.get_mut(index).filter(|g| g.is_active()) {
        Some(inst) => g2_bolts::add_bolt_surf_num(&mut inst.bltlist, &inst.slist, surf_num),
        None => -1,
    }
}

pub fn remove_bolt(ghoul2: &mut Ghoul2InfoV, index: usize, bolt: usize) -> bool {
    match ghoul2.get_mut(index) {
        Some(inst) => g2_bolts::remove_bolt(&mut inst.bltlist, bolt),
        None => false,
    }
}

/// Hang instance `model_from` off bolt `to_bolt` of instance `to_model` in
/// the same collection.
pub fn attach_g2_model(ghoul2: &mut Ghoul2InfoV, model_from: usize, to_model: usize, to_bolt: usize) -> bool {
    if model_from == to_model {
        return false;
    }
    let link = pack_bolt_link(to_model as i32, to_bolt as i32);
    if !g2_bolts::bolt_link_alive(ghoul2, link) {
        com_dprintf(&format!("G2API_AttachG2Model: bolt {} of model {} is not in use\n", to_bolt, to_model));
        return false;
    }
    match ghoul2.get_mut(model_from).filter(|g| g.is_active()) {
        Some(inst) => {
            inst.model_bolt_link = link;
            true
        }
        None => false,
    }
}

pub fn detach_g2_model(ghoul2: &mut Ghoul2InfoV, index: usize) -> bool {
    match ghoul2.get_mut(index) {
        Some(inst) => {
            inst.model_bolt_link = -1;
            true
        }
        None => false,
    }
}

// ============================================================
// Bones
// ============================================================

pub fn set_bone_angles(
    ghoul2: &mut Ghoul2InfoV,
    index: usize,
    cache: &ModelCache,
    bone_name: &str,
    angles: &Vec3,
    flags: BoneFlags,
    blend_time: i32,
    current_time: i32,
) -> bool {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, _, mdxa)) => {
            g2_bones::set_bone_angles(mdxa, &mut inst.blist, bone_name, angles, flags, blend_time, current_time)
        }
        None => false,
    }
}

pub fn set_bone_angles_matrix(
    ghoul2: &mut Ghoul2InfoV,
    index: usize,
    cache: &ModelCache,
    bone_name: &str,
    matrix: &MdxaBone,
    flags: BoneFlags,
    blend_time: i32,
    current_time: i32,
) -> bool {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, _, mdxa)) => {
            g2_bones::set_bone_angles_matrix(mdxa, &mut inst.blist, bone_name, matrix, flags, blend_time, current_time)
        }
        None => false,
    }
}

pub fn stop_bone_angles(ghoul2: &mut Ghoul2InfoV, index: usize, cache: &ModelCache, bone_name: &str) -> bool {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, _, mdxa)) => g2_bones::stop_bone_angles(mdxa, &mut inst.blist, bone_name),
        None => false,
    }
}

pub fn remove_bone(ghoul2: &mut Ghoul2InfoV, index: usize, cache: &ModelCache, bone_name: &str) -> bool {
    match instance_mut(ghoul2, index, cache) {
        Some((inst, _, mdxa)) => g2_bones::remove_bone(mdxa, &mut inst.blist, bone_name),
        None => false,
    }
}

// ============================================================
// Collision
// ============================================================

pub fn clear_collision_records(records: &mut [CollisionRecord]) {
    records.fill(CollisionRecord::EMPTY);
}

/// Filled records first, nearest first.
fn sort_collision_records(records: &mut [CollisionRecord]) {
    records.sort_by(|a, b| match a.is_free().cmp(&b.is_free()) {
        Ordering::Equal => a.distance.total_cmp(&b.distance),
        other => other,
    });
}

/// Pose, skin and trace a collection placed at `position`/`angles` against a
/// world-space ray. Hits land in the free slots of `records`, which come
/// back sorted by distance. The caller owns `heap` and resets it per frame.
pub fn collision_detect(
    records: &mut [CollisionRecord],
    ghoul2: &mut Ghoul2InfoV,
    cache: &ModelCache,
    angles: &Vec3,
    position: &Vec3,
    frame_num: i32,
    ent_num: i32,
    ray_start: &Vec3,
    ray_end: &Vec3,
    scale: &Vec3,
    heap: &mut MiniHeap,
    trace_flags: TraceFlags,
    use_lod: i32,
    radius: f32,
) -> Result<(), G2Error> {
    for inst in ghoul2.iter_mut().filter(|g| g.is_active()) {
        if let Some((_, _, mdxa)) = cache.glm_and_gla(inst.model) {
            g2_bones::construct_ghoul_skeleton(inst, mdxa, frame_num);
        }
    }

    let world = generate_world_matrix(angles, position);
    transform_model(ghoul2, cache, frame_num, scale, heap, use_lod)?;

    let start = world.world_inv.transform_and_translate_point(ray_start);
    let end = world.world_inv.transform_and_translate_point(ray_end);
    trace_models(ghoul2, cache, heap, &world, &start, &end, records, ent_num, trace_flags, use_lod, radius)?;

    sort_collision_records(records);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g2_test_models::*;

    fn near(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_init_ghoul2_model() {
        let (cache, _) = test_cache();
        let mut ghoul2 = Ghoul2InfoV::new();
        assert_eq!(init_ghoul2_model(&mut ghoul2, &cache, TEST_GLM, 1, 0, 0, ModelFlags::empty(), 0), 0);
        assert_eq!(init_ghoul2_model(&mut ghoul2, &cache, "MODELS/TEST/BODY.GLM", 2, 0, 0, ModelFlags::NORENDER, 1), 1);
        assert_eq!(init_ghoul2_model(&mut ghoul2, &cache, TEST_GLA, 3, 0, 0, ModelFlags::empty(), 0), -1);
        assert_eq!(init_ghoul2_model(&mut ghoul2, &cache, "models/none.glm", 3, 0, 0, ModelFlags::empty(), 0), -1);

        assert_eq!(ghoul2.len(), 2);
        assert_eq!(ghoul2[1].model_index, 2);
        assert_eq!(ghoul2[1].lod_bias, 1);
        assert_eq!(ghoul2[1].surface_root, SURF_TORSO);
        assert_eq!(get_ghoul2_model_flags(&ghoul2, 1), ModelFlags::NORENDER);
        assert!(have_we_ghoul2_models(&ghoul2));
    }

    #[test]
    fn test_remove_ghoul2_model_reuse_and_trim() {
        let (cache, _) = test_cache();
        let mut ghoul2 = Ghoul2InfoV::new();
        for i in 0..3 {
            init_ghoul2_model(&mut ghoul2, &cache, TEST_GLM, i + 1, 0, 0, ModelFlags::empty(), 0);
        }
        assert!(remove_ghoul2_model(&mut ghoul2, 1));
        assert_eq!(ghoul2.len(), 3);
        assert!(!remove_ghoul2_model(&mut ghoul2, 1));
        assert_eq!(init_ghoul2_model(&mut ghoul2, &cache, TEST_GLM, 9, 0, 0, ModelFlags::empty(), 0), 1);

        assert!(remove_ghoul2_model(&mut ghoul2, 2));
        assert_eq!(ghoul2.len(), 2);
        assert!(remove_ghoul2_model(&mut ghoul2, 0));
        assert!(remove_ghoul2_model(&mut ghoul2, 1));
        assert!(ghoul2.is_empty());
        assert!(!have_we_ghoul2_models(&ghoul2));
    }

    #[test]
    fn test_instance_settings() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        assert!(set_lod_bias(&mut ghoul2, 0, 1));
        assert!(set_skin(&mut ghoul2, 0, 3));
        assert!(set_shader(&mut ghoul2, 0, 4));
        assert!(set_ghoul2_model_flags(&mut ghoul2, 0, ModelFlags::NOCOLLIDE));
        assert_eq!((ghoul2[0].lod_bias, ghoul2[0].custom_skin, ghoul2[0].custom_shader), (1, 3, 4));
        assert!(!set_lod_bias(&mut ghoul2, 1, 1));
    }

    #[test]
    fn test_surface_queries() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        assert_eq!(get_surface_index(&ghoul2, 0, &cache, "face"), SURF_FACE);
        assert_eq!(get_parent_surface(&ghoul2, 0, &cache, SURF_FACE), SURF_HEAD);
        assert_eq!(get_surface_name(&ghoul2, 0, &cache, SURF_R_ARM), Some("r_arm"));
        assert_eq!(get_surface_name(&ghoul2, 0, &cache, 42), None);

        assert!(set_surface_on_off(&mut ghoul2, 0, &cache, "head", SurfaceFlags::OFF | SurfaceFlags::NODESCENDANTS));
        assert!(!set_surface_on_off(&mut ghoul2, 0, &cache, "tail", SurfaceFlags::OFF));
        assert_eq!(
            get_surface_on_off(&ghoul2, 0, &cache, "head"),
            SurfaceFlags::OFF | SurfaceFlags::NODESCENDANTS
        );
        assert_eq!(get_surface_render_status(&ghoul2, 0, &cache, "face"), Some(SurfaceFlags::OFF));
        assert_eq!(get_surface_render_status(&ghoul2, 0, &cache, "r_arm"), Some(SurfaceFlags::empty()));
    }

    #[test]
    fn test_generated_surface_packing() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        let slot = add_surface(&mut ghoul2, 0, &cache, 2, 5, 0.25, 0.5, 0);
        assert_eq!(slot, 0);
        let entry = ghoul2[0].slist[0];
        assert_eq!(entry.surface, G2_GENERATED_SURFACE);
        assert!(entry.is_generated());
        assert_eq!((entry.gen_poly(), entry.gen_surface()), (5, 2));
        assert_eq!(entry.gen_lod, 0);

        assert!(remove_surface(&mut ghoul2, 0, 0));
        assert!(ghoul2[0].slist.is_empty());
    }

    #[test]
    fn test_attach_and_detach() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        init_ghoul2_model(&mut ghoul2, &cache, TEST_GLM, 2, 0, 0, ModelFlags::empty(), 0);
        let bolt = add_bolt(&mut ghoul2, 0, &cache, "tag_hand");
        assert_eq!(bolt, 0);

        assert!(!attach_g2_model(&mut ghoul2, 1, 0, 3));
        assert!(attach_g2_model(&mut ghoul2, 1, 0, bolt as usize));
        assert_eq!(unpack_bolt_link(ghoul2[1].model_bolt_link), (0, 0));
        assert!(detach_g2_model(&mut ghoul2, 1));
        assert_eq!(ghoul2[1].model_bolt_link, -1);
    }

    #[test]
    fn test_bone_wrappers() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        assert!(set_bone_angles(&mut ghoul2, 0, &cache, "arm", &[0.0, 45.0, 0.0], BoneFlags::ANGLES_POSTMULT, 0, 0));
        // still carries angles, so the slot stays
        assert!(!remove_bone(&mut ghoul2, 0, &cache, "arm"));
        assert_eq!(ghoul2[0].blist.len(), 1);
        assert!(stop_bone_angles(&mut ghoul2, 0, &cache, "arm"));
        assert!(ghoul2[0].blist.is_empty());
        assert!(!set_bone_angles(&mut ghoul2, 0, &cache, "tail", &[0.0; 3], BoneFlags::ANGLES_POSTMULT, 0, 0));
    }

    #[test]
    fn test_set_root_surface_prunes_outside_subtree() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        init_ghoul2_model(&mut ghoul2, &cache, TEST_GLM, 2, 0, 0, ModelFlags::empty(), 0);

        set_surface_on_off(&mut ghoul2, 0, &cache, "r_arm", SurfaceFlags::OFF);
        set_bone_angles(&mut ghoul2, 0, &cache, "arm", &[0.0, 10.0, 0.0], BoneFlags::ANGLES_POSTMULT, 0, 0);
        set_bone_angles(&mut ghoul2, 0, &cache, "jaw", &[0.0, 10.0, 0.0], BoneFlags::ANGLES_POSTMULT, 0, 0);
        let arm_surf_bolt = add_bolt(&mut ghoul2, 0, &cache, "r_arm");
        add_bolt(&mut ghoul2, 0, &cache, "arm");
        add_bolt(&mut ghoul2, 0, &cache, "jaw");
        add_bolt(&mut ghoul2, 0, &cache, "face");
        assert!(attach_g2_model(&mut ghoul2, 1, 0, arm_surf_bolt as usize));

        assert!(set_root_surface(&mut ghoul2, 0, &cache, "face"));
        assert_eq!(ghoul2[0].surface_root, SURF_FACE);

        let inst = &ghoul2[0];
        assert!(inst.slist.iter().all(|s| s.is_free()));
        let bones: Vec<i32> = inst.blist.iter().filter(|b| !b.is_free()).map(|b| b.bone_number).collect();
        assert_eq!(bones, vec![BONE_JAW]);
        let bolts: Vec<BoltInfo> = inst.bltlist.iter().copied().filter(|b| !b.is_free()).collect();
        assert_eq!(bolts.len(), 2);
        assert_eq!(bolts[0].bone_number, BONE_JAW);
        assert_eq!(bolts[1].surface_number, SURF_FACE);
        // the model hanging off r_arm went with its bolt
        assert_eq!(ghoul2.len(), 1);

        assert!(set_root_surface(&mut ghoul2, 0, &cache, "face"));
        assert!(!set_root_surface(&mut ghoul2, 0, &cache, "wing"));
    }

    #[test]
    fn test_collision_detect_world_space() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        let mut heap = MiniHeap::new(64 * 1024);
        let mut records = [CollisionRecord::EMPTY; MAX_G2_COLLISIONS];
        let c = torso_centroid();

        // turned around and moved to x = 100
        let result = collision_detect(
            &mut records,
            &mut ghoul2,
            &cache,
            &[0.0, 180.0, 0.0],
            &[100.0, 0.0, 0.0],
            1,
            3,
            &[90.0, -c[1], c[2]],
            &[110.0, -c[1], c[2]],
            &[1.0; 3],
            &mut heap,
            TraceFlags::empty(),
            0,
            0.0,
        );
        assert!(result.is_ok());
        assert!(!records[0].is_free());
        assert!(records[1].is_free());

        let rec = records[0];
        assert_eq!(rec.entity_num, 3);
        assert_eq!(rec.surface_index, SURF_TORSO);
        assert!(near(rec.distance, 10.0));
        assert!(near(rec.collision_position[0], 100.0));
        assert!(near(rec.collision_position[1], -c[1]));
        assert!(near(rec.collision_position[2], c[2]));
        assert!(near(rec.collision_normal[0], -1.0));
    }

    #[test]
    fn test_collision_detect_sorts_by_distance() {
        let (cache, _) = test_cache();
        let mut ghoul2 = test_instance(&cache);
        let mut heap = MiniHeap::new(64 * 1024);
        let mut records = [CollisionRecord::EMPTY; MAX_G2_COLLISIONS];

        // the head is traced before the face but lies further along the ray
        collision_detect(
            &mut records,
            &mut ghoul2,
            &cache,
            &[0.0; 3],
            &[0.0; 3],
            1,
            0,
            &[10.0, 0.0, 23.0],
            &[-10.0, 0.0, 23.0],
            &[1.0; 3],
            &mut heap,
            TraceFlags::empty(),
            0,
            0.0,
        )
        .unwrap();

        assert_eq!(records[0].surface_index, SURF_FACE);
        assert!(near(records[0].distance, 9.0));
        assert_eq!(records[1].surface_index, SURF_HEAD);
        assert!(near(records[1].distance, 10.0));
        assert!(records[2].is_free());
    }

    #[test]
    fn test_clear_collision_records() {
        let mut records = [CollisionRecord { entity_num: 4, ..CollisionRecord::EMPTY }; 4];
        clear_collision_records(&mut records);
        assert!(records.iter().all(|r| r.is_free() && r.distance == 100000.0));
    }
}
