// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_bones.rs — per-instance bone override list and skeleton evaluation

use jk2_common::common::{com_dprintf, com_error};
use jk2_common::q_shared::{Vec3, ERR_FATAL, VEC3_ORIGIN};

use crate::g2_model::find_surface;
use crate::g2_surfaces::surface_flags;
use crate::g2_types::*;

/// Skeleton index of a named bone, -1 if the skeleton has no such bone.
pub fn find_bone_index(mdxa: &MdxaHeader, bone_name: &str) -> i32 {
    mdxa.bones
        .iter()
        .position(|b| b.name.eq_ignore_ascii_case(bone_name))
        .map_or(-1, |i| i as i32)
}

/// Override list slot for a named bone.
pub fn find_bone(mdxa: &MdxaHeader, blist: &[BoneInfo], bone_name: &str) -> Option<usize> {
    let bone = find_bone_index(mdxa, bone_name);
    if bone == -1 {
        return None;
    }
    blist.iter().position(|b| b.bone_number == bone)
}

/// Find or create the override slot for a named bone.
pub fn add_bone(mdxa: &MdxaHeader, blist: &mut Vec<BoneInfo>, bone_name: &str) -> Option<usize> {
    let bone = find_bone_index(mdxa, bone_name);
    if bone == -1 {
        com_dprintf(&format!("G2_Add_Bone: no bone {} in {}\n", bone_name, mdxa.name));
        return None;
    }
    if let Some(i) = blist.iter().position(|b| b.bone_number == bone) {
        return Some(i);
    }

    let entry = BoneInfo {
        bone_number: bone,
        ..BoneInfo::FREE
    };
    if let Some(i) = blist.iter().position(|b| b.is_free()) {
        blist[i] = entry;
        return Some(i);
    }
    blist.push(entry);
    Some(blist.len() - 1)
}

/// Free a slot once nothing is driving it. Returns false, leaving the slot
/// untouched, while any flags are still set.
pub fn remove_bone_index(blist: &mut Vec<BoneInfo>, index: usize) -> bool {
    let Some(entry) = blist.get_mut(index) else {
        return false;
    };
    if !entry.flags.is_empty() {
        return false;
    }
    *entry = BoneInfo::FREE;
    while blist.last().is_some_and(|b| b.is_free()) {
        blist.pop();
    }
    true
}

/// Drop the override for a named bone. An override still carrying angles is
/// kept and reported as not removed; use `stop_bone_angles` for those.
pub fn remove_bone(mdxa: &MdxaHeader, blist: &mut Vec<BoneInfo>, bone_name: &str) -> bool {
    match find_bone(mdxa, blist, bone_name) {
        Some(i) => remove_bone_index(blist, i),
        None => false,
    }
}

fn set_bone_override(
    mdxa: &MdxaHeader,
    blist: &mut Vec<BoneInfo>,
    bone_name: &str,
    matrix: MdxaBone,
    flags: BoneFlags,
    blend_time: i32,
    current_time: i32,
) -> bool {
    let Some(i) = add_bone(mdxa, blist, bone_name) else {
        return false;
    };
    let entry = &mut blist[i];
    entry.flags = (entry.flags - BoneFlags::ANGLES_TOTAL) | (flags & BoneFlags::ANGLES_TOTAL);
    entry.blend_start = current_time;
    entry.blend_time = blend_time;
    entry.matrix = matrix;
    entry.new_matrix = matrix;
    true
}

/// Rotate a bone about its base pose pivot by euler angles.
pub fn set_bone_angles(
    mdxa: &MdxaHeader,
    blist: &mut Vec<BoneInfo>,
    bone_name: &str,
    angles: &Vec3,
    flags: BoneFlags,
    blend_time: i32,
    current_time: i32,
) -> bool {
    let matrix = MdxaBone::from_angles(angles, &VEC3_ORIGIN);
    set_bone_override(mdxa, blist, bone_name, matrix, flags, blend_time, current_time)
}

/// Drive a bone with an explicit local matrix.
pub fn set_bone_angles_matrix(
    mdxa: &MdxaHeader,
    blist: &mut Vec<BoneInfo>,
    bone_name: &str,
    matrix: &MdxaBone,
    flags: BoneFlags,
    blend_time: i32,
    current_time: i32,
) -> bool {
    set_bone_override(mdxa, blist, bone_name, *matrix, flags, blend_time, current_time)
}

/// Clear the angle override on a bone, freeing the slot if nothing else uses it.
pub fn stop_bone_angles(mdxa: &MdxaHeader, blist: &mut Vec<BoneInfo>, bone_name: &str) -> bool {
    let Some(i) = find_bone(mdxa, blist, bone_name) else {
        return false;
    };
    blist[i].flags -= BoneFlags::ANGLES_TOTAL;
    remove_bone_index(blist, i);
    true
}

fn mark_bone_and_ancestors(mdxa: &MdxaHeader, bone: usize, active_bones: &mut [bool]) {
    active_bones[bone] = true;
    let skel = &mdxa.bones[bone];

    for &child in &skel.children {
        if mdxa.bones[child as usize].flags.contains(SkelBoneFlags::ALWAYSXFORM) {
            active_bones[child as usize] = true;
        }
    }

    let mut parent = skel.parent;
    while parent != -1 {
        if active_bones[parent as usize] {
            break;
        }
        active_bones[parent as usize] = true;
        parent = mdxa.bones[parent as usize].parent;
    }
}

/// Mark every bone needed by the visible surfaces below `surface_num`: the
/// bones they reference, always-transformed children of those, and their
/// ancestors.
pub fn construct_used_bone_list(
    mdxm: &MdxmHeader,
    mdxa: &MdxaHeader,
    surface_num: i32,
    slist: &[SurfaceInfo],
    active_bones: &mut [bool],
) {
    let (Some(surface), Some(info)) = (
        find_surface(mdxm, surface_num, 0),
        mdxm.surf_hierarchy.get(surface_num as usize),
    ) else {
        return;
    };
    let flags = surface_flags(mdxm, slist, surface_num);

    if !flags.contains(SurfaceFlags::OFF) {
        for &bone in &surface.bone_references {
            mark_bone_and_ancestors(mdxa, bone as usize, active_bones);
        }
    } else if flags.contains(SurfaceFlags::NODESCENDANTS) {
        return;
    }

    for &child in &info.child_indexes {
        construct_used_bone_list(mdxm, mdxa, child, slist, active_bones);
    }
}

pub(crate) fn is_bone_active(active_bones: &[bool], bone: i32) -> bool {
    match active_bones.get(bone as usize) {
        Some(&active) => active,
        None => {
            com_error(ERR_FATAL, &format!("bone {} outside skeleton of {} bones", bone, active_bones.len()));
            false
        }
    }
}

/// Drop overrides on bones that are no longer used.
pub fn remove_redundant_bone_overrides(blist: &mut Vec<BoneInfo>, active_bones: &[bool]) {
    let mut i = 0;
    while i < blist.len() {
        if !blist[i].is_free() && !is_bone_active(active_bones, blist[i].bone_number) {
            blist[i].flags = BoneFlags::empty();
            remove_bone_index(blist, i);
        }
        i += 1;
    }
}

/// Evaluate the skinning matrix of every bone into the instance's bone cache.
/// An angle override rotates the bone about its base pose; during its blend
/// window it eases in from the rest pose.
pub fn construct_ghoul_skeleton(inst: &mut Ghoul2Info, mdxa: &MdxaHeader, current_time: i32) {
    let num_bones = mdxa.bones.len();
    let mut local = vec![MdxaBone::IDENTITY; num_bones];

    for bone in inst.blist.iter().filter(|b| !b.is_free() && b.flags.intersects(BoneFlags::ANGLES_TOTAL)) {
        let Some(slot) = local.get_mut(bone.bone_number as usize) else {
            continue;
        };
        let elapsed = current_time - bone.blend_start;
        *slot = if bone.blend_time > 0 && elapsed < bone.blend_time {
            let frac = (elapsed.max(0) as f32) / bone.blend_time as f32;
            MdxaBone::IDENTITY.lerp(&bone.new_matrix, frac)
        } else {
            bone.new_matrix
        };
    }

    inst.bone_cache.clear();
    inst.bone_cache.reserve(num_bones);
    for (i, skel) in mdxa.bones.iter().enumerate() {
        let pose = skel
            .base_pose_mat
            .multiply(&local[i])
            .multiply(&skel.base_pose_mat_inv);
        let skin = if skel.parent >= 0 {
            inst.bone_cache[skel.parent as usize].multiply(&pose)
        } else {
            pose
        };
        inst.bone_cache.push(skin);
    }
}
