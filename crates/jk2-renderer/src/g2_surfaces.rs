// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_surfaces.rs — per-instance surface override list
//
// Entries either override the on/off flags of a hierarchy surface or
// describe a generated surface (a point on one polygon). Removal tombstones
// the entry and trims any free tail; slots in the middle are reused by
// generated surfaces.

use jk2_common::common::com_dprintf;

use crate::g2_bolts::{remove_dead_attachments, remove_redundant_bolts};
use crate::g2_bones::{construct_used_bone_list, remove_redundant_bone_overrides};
use crate::g2_misc::decide_trace_lod;
use crate::g2_model::{surf_hierarchy, ModelCache};
use crate::g2_types::*;

/// Override list slot holding `surface_num`, if any.
pub fn find_override_surface(surface_num: i32, slist: &[SurfaceInfo]) -> Option<usize> {
    slist.iter().position(|s| s.surface == surface_num)
}

/// Hierarchy index and default flags of a named surface.
pub fn is_surface_legal(mdxm: &MdxmHeader, surface_name: &str) -> Option<(i32, SurfaceFlags)> {
    mdxm.surf_hierarchy
        .iter()
        .position(|s| s.name.eq_ignore_ascii_case(surface_name))
        .map(|i| (i as i32, mdxm.surf_hierarchy[i].flags))
}

/// Flags in effect for a hierarchy surface: the override if present, else the default.
pub fn surface_flags(mdxm: &MdxmHeader, slist: &[SurfaceInfo], surface_num: i32) -> SurfaceFlags {
    match find_override_surface(surface_num, slist) {
        Some(i) => slist[i].off_flags,
        None => surf_hierarchy(mdxm, surface_num).map_or(SurfaceFlags::empty(), |s| s.flags),
    }
}

/// Override list slot for a named hierarchy surface, searching newest first.
pub fn find_surface(mdxm: &MdxmHeader, slist: &[SurfaceInfo], surface_name: &str) -> Option<usize> {
    slist.iter().enumerate().rev().find_map(|(i, s)| {
        if s.surface == G2_GENERATED_SURFACE || s.surface == -1 {
            return None;
        }
        surf_hierarchy(mdxm, s.surface)
            .filter(|h| h.name.eq_ignore_ascii_case(surface_name))
            .map(|_| i)
    })
}

const TOGGLE_FLAGS: SurfaceFlags = SurfaceFlags::OFF.union(SurfaceFlags::NODESCENDANTS);

/// Switch a named surface on or off. Only OFF and NODESCENDANTS are taken
/// from `off_flags`; the rest of the surface's flags are kept.
pub fn set_surface_on_off(mdxm: &MdxmHeader, slist: &mut Vec<SurfaceInfo>, surface_name: &str, off_flags: SurfaceFlags) -> bool {
    if let Some(i) = find_surface(mdxm, slist, surface_name) {
        let entry = &mut slist[i];
        entry.off_flags = (entry.off_flags - TOGGLE_FLAGS) | (off_flags & TOGGLE_FLAGS);
        return true;
    }

    let Some((surface_num, flags)) = is_surface_legal(mdxm, surface_name) else {
        com_dprintf(&format!("G2_SetSurfaceOnOff: no surface {} in {}\n", surface_name, mdxm.name));
        return false;
    };
    slist.push(SurfaceInfo {
        off_flags: (flags - TOGGLE_FLAGS) | (off_flags & TOGGLE_FLAGS),
        surface: surface_num,
        ..SurfaceInfo::FREE
    });
    true
}

/// Flags in effect for a named surface, empty if the name is unknown.
pub fn is_surface_off(mdxm: &MdxmHeader, slist: &[SurfaceInfo], surface_name: &str) -> SurfaceFlags {
    if let Some(i) = find_surface(mdxm, slist, surface_name) {
        return slist[i].off_flags;
    }
    is_surface_legal(mdxm, surface_name).map_or(SurfaceFlags::empty(), |(_, flags)| flags)
}

/// Mark every surface under `surface_num` that is not switched off. An off
/// surface with NODESCENDANTS hides its whole subtree.
pub fn find_recursive_surface(mdxm: &MdxmHeader, surface_num: i32, slist: &[SurfaceInfo], active: &mut [bool]) {
    let Some(info) = surf_hierarchy(mdxm, surface_num) else {
        return;
    };
    let flags = surface_flags(mdxm, slist, surface_num);

    if !flags.contains(SurfaceFlags::OFF) {
        active[surface_num as usize] = true;
    } else if flags.contains(SurfaceFlags::NODESCENDANTS) {
        return;
    }

    for &child in &info.child_indexes {
        find_recursive_surface(mdxm, child, slist, active);
    }
}

fn is_active(active: &[bool], surface_num: i32) -> bool {
    surface_num >= 0 && active.get(surface_num as usize).copied().unwrap_or(false)
}

/// Drop overrides and generated surfaces whose hierarchy surface is no longer active.
pub fn remove_redundant_generated_surfaces(slist: &mut Vec<SurfaceInfo>, active: &[bool]) {
    let mut i = 0;
    while i < slist.len() {
        let entry = slist[i];
        if !entry.is_free() {
            let source = if entry.is_generated() {
                entry.gen_surface()
            } else {
                entry.surface
            };
            if !is_active(active, source) {
                remove_surface(slist, i);
            }
        }
        i += 1;
    }
}

/// Re-root the instance at a named surface and drop every override, bone,
/// bolt and attached model that no longer hangs below it.
pub fn set_root_surface(ghoul2: &mut Ghoul2InfoV, model_index: usize, cache: &ModelCache, surface_name: &str) -> bool {
    let Some(inst) = ghoul2.get_mut(model_index).filter(|g| g.is_active()) else {
        return false;
    };
    let Some((_, mdxm, mdxa)) = cache.glm_and_gla(inst.model) else {
        return false;
    };
    let Some((surf, _)) = is_surface_legal(mdxm, surface_name) else {
        return false;
    };
    if inst.surface_root == surf {
        return true;
    }
    inst.surface_root = surf;

    let mut active_surfaces = vec![false; mdxm.surf_hierarchy.len()];
    let mut active_bones = vec![false; mdxa.bones.len()];

    find_recursive_surface(mdxm, surf, &inst.slist, &mut active_surfaces);
    construct_used_bone_list(mdxm, mdxa, surf, &inst.slist, &mut active_bones);

    remove_redundant_generated_surfaces(&mut inst.slist, &active_surfaces);
    remove_redundant_bone_overrides(&mut inst.blist, &active_bones);
    remove_redundant_bolts(&mut inst.bltlist, &inst.slist, &active_surfaces, &active_bones);

    remove_dead_attachments(ghoul2);
    true
}

/// Add a generated surface at a barycentric point of `poly_number`. Returns
/// its override list slot.
pub fn add_surface(
    inst: &mut Ghoul2Info,
    model: &Model,
    surface_number: i32,
    poly_number: i32,
    barycentric_i: f32,
    barycentric_j: f32,
    lod: i32,
) -> i32 {
    let lod = decide_trace_lod(inst, lod, model);
    let entry = SurfaceInfo {
        off_flags: SurfaceFlags::GENERATED,
        surface: G2_GENERATED_SURFACE,
        gen_barycentric_i: barycentric_i,
        gen_barycentric_j: barycentric_j,
        gen_poly_surface_index: pack_poly_surface_index(poly_number, surface_number),
        gen_lod: lod,
    };

    if let Some(i) = inst.slist.iter().position(|s| s.is_free()) {
        inst.slist[i] = entry;
        return i as i32;
    }
    inst.slist.push(entry);
    inst.slist.len() as i32 - 1
}

/// Tombstone an override list slot and trim the free tail.
pub fn remove_surface(slist: &mut Vec<SurfaceInfo>, index: usize) -> bool {
    let Some(entry) = slist.get_mut(index) else {
        return false;
    };
    *entry = SurfaceInfo::FREE;

    while slist.last().is_some_and(|s| s.is_free()) {
        slist.pop();
    }
    true
}

pub fn get_parent_surface(mdxm: &MdxmHeader, index: i32) -> i32 {
    surf_hierarchy(mdxm, index).map_or(-1, |s| s.parent_index)
}

pub fn get_surface_index(mdxm: &MdxmHeader, surface_name: &str) -> i32 {
    is_surface_legal(mdxm, surface_name).map_or(-1, |(i, _)| i)
}

/// Flags a named surface is drawn with. Any ancestor marked NODESCENDANTS
/// reports the surface as OFF, whether or not that ancestor is itself off.
pub fn is_surface_rendered(mdxm: &MdxmHeader, surface_name: &str, slist: &[SurfaceInfo]) -> Option<SurfaceFlags> {
    let (surface_num, _) = is_surface_legal(mdxm, surface_name)?;
    let mut flags = surface_flags(mdxm, slist, surface_num);

    let mut parent = get_parent_surface(mdxm, surface_num);
    while parent != -1 {
        if surface_flags(mdxm, slist, parent).contains(SurfaceFlags::NODESCENDANTS) {
            flags = SurfaceFlags::OFF;
            break;
        }
        parent = get_parent_surface(mdxm, parent);
    }
    Some(flags)
}
