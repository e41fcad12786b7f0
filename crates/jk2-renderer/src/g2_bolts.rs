// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_bolts.rs — per-instance bolt list
//
// A bolt names either a bone or a surface (hierarchy or generated) and keeps
// a usage count; it is only freed when the count reaches zero. Bolt indices
// are handed out to callers and packed into model links, so slots are never
// moved.

use jk2_common::common::com_dprintf;

use crate::g2_api::remove_ghoul2_model;
use crate::g2_bones::{find_bone_index, is_bone_active};
use crate::g2_surfaces::is_surface_legal;
use crate::g2_types::*;

pub fn find_bolt_bone_num(bltlist: &[BoltInfo], bone_num: i32) -> Option<usize> {
    bltlist
        .iter()
        .position(|b| b.bone_number != -1 && b.bone_number == bone_num)
}

/// Bolt on `surface_num` whose surface type includes `flags`.
pub fn find_bolt_surface_num(bltlist: &[BoltInfo], surface_num: i32, flags: SurfaceFlags) -> Option<usize> {
    bltlist.iter().position(|b| {
        b.surface_number != -1 && b.surface_number == surface_num && b.surface_type.contains(flags)
    })
}

/// Place a new bolt in the first free slot, else at the end.
fn claim_bolt_slot(bltlist: &mut Vec<BoltInfo>, bolt: BoltInfo) -> i32 {
    if let Some(i) = bltlist.iter().position(|b| b.is_free()) {
        bltlist[i] = bolt;
        return i as i32;
    }
    bltlist.push(bolt);
    bltlist.len() as i32 - 1
}

/// Bolt onto a generated surface by its override list slot.
pub fn add_bolt_surf_num(bltlist: &mut Vec<BoltInfo>, slist: &[SurfaceInfo], surf_num: i32) -> i32 {
    if surf_num < 0 || surf_num as usize >= slist.len() {
        return -1;
    }
    if let Some(i) = find_bolt_surface_num(bltlist, surf_num, SurfaceFlags::GENERATED) {
        bltlist[i].bolt_used += 1;
        return i as i32;
    }
    claim_bolt_slot(
        bltlist,
        BoltInfo {
            bone_number: -1,
            surface_number: surf_num,
            surface_type: SurfaceFlags::GENERATED,
            bolt_used: 1,
        },
    )
}

/// Bolt onto a named hierarchy surface, or failing that a named bone.
pub fn add_bolt(mdxm: &MdxmHeader, mdxa: &MdxaHeader, bltlist: &mut Vec<BoltInfo>, name: &str) -> i32 {
    if let Some((surf_num, _)) = is_surface_legal(mdxm, name) {
        let existing = bltlist
            .iter()
            .position(|b| b.surface_number == surf_num && !b.surface_type.contains(SurfaceFlags::GENERATED));
        if let Some(i) = existing {
            bltlist[i].bolt_used += 1;
            return i as i32;
        }
        return claim_bolt_slot(
            bltlist,
            BoltInfo {
                bone_number: -1,
                surface_number: surf_num,
                surface_type: SurfaceFlags::empty(),
                bolt_used: 1,
            },
        );
    }

    let bone = find_bone_index(mdxa, name);
    if bone == -1 {
        com_dprintf(&format!("G2_Add_Bolt: {} is neither a surface nor a bone of {}\n", name, mdxm.name));
        return -1;
    }
    if let Some(i) = find_bolt_bone_num(bltlist, bone) {
        bltlist[i].bolt_used += 1;
        return i as i32;
    }
    claim_bolt_slot(
        bltlist,
        BoltInfo {
            bone_number: bone,
            surface_number: -1,
            surface_type: SurfaceFlags::empty(),
            bolt_used: 1,
        },
    )
}

/// Drop one use of a bolt, freeing the slot and trimming the free tail at zero.
pub fn remove_bolt(bltlist: &mut Vec<BoltInfo>, index: usize) -> bool {
    let Some(bolt) = bltlist.get_mut(index) else {
        return false;
    };
    if bolt.is_free() {
        return false;
    }
    bolt.bolt_used -= 1;
    if bolt.bolt_used <= 0 {
        *bolt = BoltInfo::FREE;
        while bltlist.last().is_some_and(|b| b.is_free()) {
            bltlist.pop();
        }
    }
    true
}

pub fn init_bolt_list(bltlist: &mut Vec<BoltInfo>) {
    bltlist.clear();
}

/// Free every bolt whose bone or surface is no longer in use, however many
/// holders it has.
pub fn remove_redundant_bolts(
    bltlist: &mut Vec<BoltInfo>,
    slist: &[SurfaceInfo],
    active_surfaces: &[bool],
    active_bones: &[bool],
) {
    let mut i = 0;
    while i < bltlist.len() {
        let bolt = bltlist[i];
        if !bolt.is_free() {
            let alive = if bolt.surface_number != -1 {
                if bolt.surface_type.contains(SurfaceFlags::GENERATED) {
                    slist
                        .get(bolt.surface_number as usize)
                        .is_some_and(|s| !s.is_free() && s.is_generated())
                } else {
                    active_surfaces
                        .get(bolt.surface_number as usize)
                        .copied()
                        .unwrap_or(false)
                }
            } else {
                is_bone_active(active_bones, bolt.bone_number)
            };
            if !alive {
                bltlist[i].bolt_used = 1;
                remove_bolt(bltlist, i);
            }
        }
        i += 1;
    }
}

/// True if a packed model link still lands on a live bolt.
pub fn bolt_link_alive(ghoul2: &Ghoul2InfoV, link: i32) -> bool {
    let (model, bolt) = unpack_bolt_link(link);
    ghoul2
        .get(model as usize)
        .filter(|g| g.is_active())
        .and_then(|g| g.bltlist.get(bolt as usize))
        .is_some_and(|b| !b.is_free())
}

/// Remove every model hanging from a dead bolt, including models that hung
/// from a model removed on the way. Returns how many were removed.
pub fn remove_dead_attachments(ghoul2: &mut Ghoul2InfoV) -> usize {
    let mut removed = 0;
    loop {
        let dead = (0..ghoul2.len()).find(|&i| {
            let g = &ghoul2[i];
            g.is_active() && g.model_bolt_link != -1 && !bolt_link_alive(ghoul2, g.model_bolt_link)
        });
        match dead {
            Some(i) => {
                com_dprintf(&format!("G2: removing model {} from a dead bolt\n", i));
                remove_ghoul2_model(ghoul2, i);
                removed += 1;
            }
            None => return removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g2_test_models::*;

    #[test]
    fn test_surface_bolt_refcount() {
        let (cache, h) = test_cache();
        let (_, mdxm, mdxa) = cache.glm_and_gla(h).unwrap();
        let mut bltlist = Vec::new();
        assert_eq!(add_bolt(mdxm, mdxa, &mut bltlist, "tag_hand"), 0);
        assert_eq!(add_bolt(mdxm, mdxa, &mut bltlist, "TAG_HAND"), 0);
        assert_eq!(bltlist[0].bolt_used, 2);
        assert_eq!(bltlist[0].surface_number, SURF_TAG_HAND);

        assert!(remove_bolt(&mut bltlist, 0));
        assert_eq!(bltlist.len(), 1);
        assert_eq!(bltlist[0].bolt_used, 1);

        assert!(remove_bolt(&mut bltlist, 0));
        assert!(bltlist.is_empty());
        assert!(!remove_bolt(&mut bltlist, 0));
    }

    #[test]
    fn test_bone_bolt() {
        let (cache, h) = test_cache();
        let (_, mdxm, mdxa) = cache.glm_and_gla(h).unwrap();
        let mut bltlist = Vec::new();
        assert_eq!(add_bolt(mdxm, mdxa, &mut bltlist, "jaw"), 0);
        assert_eq!(bltlist[0].bone_number, BONE_JAW);
        assert_eq!(bltlist[0].surface_number, -1);
        assert_eq!(find_bolt_bone_num(&bltlist, BONE_JAW), Some(0));
        assert_eq!(add_bolt(mdxm, mdxa, &mut bltlist, "antenna"), -1);
        assert_eq!(bltlist.len(), 1);
    }

    #[test]
    fn test_bolt_slot_reuse() {
        let (cache, h) = test_cache();
        let (_, mdxm, mdxa) = cache.glm_and_gla(h).unwrap();
        let mut bltlist = Vec::new();
        add_bolt(mdxm, mdxa, &mut bltlist, "arm");
        add_bolt(mdxm, mdxa, &mut bltlist, "head_bone");
        remove_bolt(&mut bltlist, 0);
        assert_eq!(bltlist.len(), 2);
        assert_eq!(add_bolt(mdxm, mdxa, &mut bltlist, "face"), 0);
        // live entries stay unique
        let live: Vec<_> = bltlist.iter().filter(|b| !b.is_free()).collect();
        assert_eq!(live.len(), 2);
    }

    #[test]
    fn test_generated_surface_bolt() {
        let mut slist = vec![SurfaceInfo::FREE; 2];
        slist[1] = SurfaceInfo {
            off_flags: SurfaceFlags::GENERATED,
            surface: G2_GENERATED_SURFACE,
            ..SurfaceInfo::FREE
        };
        let mut bltlist = Vec::new();
        assert_eq!(add_bolt_surf_num(&mut bltlist, &slist, 2), -1);
        assert_eq!(add_bolt_surf_num(&mut bltlist, &slist, 1), 0);
        assert_eq!(add_bolt_surf_num(&mut bltlist, &slist, 1), 0);
        assert_eq!(bltlist[0].bolt_used, 2);
        assert_eq!(bltlist[0].surface_type, SurfaceFlags::GENERATED);
        assert_eq!(find_bolt_surface_num(&bltlist, 1, SurfaceFlags::GENERATED), Some(0));
        assert_eq!(find_bolt_surface_num(&bltlist, 1, SurfaceFlags::OFF), None);
    }

    #[test]
    fn test_generated_and_hierarchy_bolts_are_distinct() {
        let (cache, h) = test_cache();
        let (_, mdxm, mdxa) = cache.glm_and_gla(h).unwrap();
        let mut slist = vec![SurfaceInfo::FREE; 2];
        slist[SURF_HEAD as usize].off_flags = SurfaceFlags::GENERATED;
        slist[SURF_HEAD as usize].surface = G2_GENERATED_SURFACE;
        let mut bltlist = Vec::new();
        let a = add_bolt(mdxm, mdxa, &mut bltlist, "head");
        let b = add_bolt_surf_num(&mut bltlist, &slist, SURF_HEAD);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_redundant_bolts() {
        let (cache, h) = test_cache();
        let (_, mdxm, mdxa) = cache.glm_and_gla(h).unwrap();
        let slist = vec![SurfaceInfo::FREE];
        let mut bltlist = Vec::new();
        add_bolt(mdxm, mdxa, &mut bltlist, "r_arm");
        add_bolt(mdxm, mdxa, &mut bltlist, "r_arm");
        add_bolt(mdxm, mdxa, &mut bltlist, "face");
        add_bolt(mdxm, mdxa, &mut bltlist, "arm");
        add_bolt(mdxm, mdxa, &mut bltlist, "jaw");
        bltlist.push(BoltInfo {
            bone_number: -1,
            surface_number: 0,
            surface_type: SurfaceFlags::GENERATED,
            bolt_used: 1,
        });

        let active_surfaces = [false, true, true, false, false];
        let active_bones = [true, false, true, true];
        remove_redundant_bolts(&mut bltlist, &slist, &active_surfaces, &active_bones);

        let live: Vec<BoltInfo> = bltlist.iter().copied().filter(|b| !b.is_free()).collect();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].surface_number, SURF_FACE);
        assert_eq!(live[1].bone_number, BONE_JAW);
        // the shared r_arm bolt went despite two holders
        assert!(bltlist[0].is_free());
    }

    #[test]
    fn test_remove_dead_attachments() {
        let mut ghoul2 = vec![Ghoul2Info::default(), Ghoul2Info::default(), Ghoul2Info::default()];
        for (i, g) in ghoul2.iter_mut().enumerate() {
            g.model_index = i as i32 + 1;
        }
        ghoul2[0].bltlist.push(BoltInfo {
            bone_number: BONE_ARM,
            surface_number: -1,
            surface_type: SurfaceFlags::empty(),
            bolt_used: 1,
        });
        ghoul2[2].bltlist.push(BoltInfo {
            bone_number: BONE_ROOT,
            surface_number: -1,
            surface_type: SurfaceFlags::empty(),
            bolt_used: 1,
        });
        // 2 hangs off 0, 1 hangs off 2
        ghoul2[2].model_bolt_link = pack_bolt_link(0, 0);
        ghoul2[1].model_bolt_link = pack_bolt_link(2, 0);
        assert_eq!(remove_dead_attachments(&mut ghoul2), 0);

        remove_bolt(&mut ghoul2[0].bltlist, 0);
        assert_eq!(remove_dead_attachments(&mut ghoul2), 2);
        assert_eq!(ghoul2.len(), 1);
        assert!(ghoul2[0].is_active());
    }
}
