// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_misc.rs — gameside Ghoul2 skinning and model traces
//
// TransformModel skins every visible surface into the caller's MiniHeap as
// five floats per vertex (x y z s t). TraceModels then walks the same
// hierarchy and tests a model-space ray (or a cylinder of `radius`) against
// those vertices.

use rayon::prelude::*;

use jk2_common::common::com_dprintf;
use jk2_common::g2_error::G2Error;
use jk2_common::miniheap::{HeapSpan, MiniHeap};
use jk2_common::q_shared::*;

use crate::g2_bones::construct_ghoul_skeleton;
use crate::g2_model::{find_surface, surf_hierarchy, ModelCache};
use crate::g2_surfaces::surface_flags;
use crate::g2_types::*;

/// Floats stored per transformed vertex.
pub const G2_VERT_STRIDE: usize = 5;

/// Surfaces with fewer vertices are skinned on the calling thread.
const PARALLEL_SKIN_THRESHOLD: usize = 512;

const HIDE_SUBTREE: SurfaceFlags = SurfaceFlags::OFF.union(SurfaceFlags::NODESCENDANTS);

/// Drawn and traced surfaces are neither switched off nor bolt tags.
fn is_drawable(flags: SurfaceFlags) -> bool {
    !flags.intersects(SurfaceFlags::OFF | SurfaceFlags::ISBOLT)
}

/// LOD used for tracing: the requested one, raised to the instance bias,
/// capped at the model's last LOD.
pub fn decide_trace_lod(inst: &Ghoul2Info, use_lod: i32, model: &Model) -> i32 {
    let mut lod = use_lod.max(inst.lod_bias);
    if lod >= model.num_lods {
        lod = model.num_lods - 1;
    }
    lod
}

// ============================================================
// Skinning
// ============================================================

fn skin_vertex(vert: &MdxmVertex, st: &[f32; 2], bone_refs: &[i32], bone_cache: &[MdxaBone], scale: &Vec3, out: &mut [f32]) {
    let mut pos = [0.0f32; 3];
    let mut total = 0.0f32;
    for k in 0..vert.num_weights() {
        let weight = vert.bone_weight(k, &mut total);
        let bone = bone_refs
            .get(vert.bone_ref(k))
            .and_then(|&b| bone_cache.get(b as usize))
            .unwrap_or(&MdxaBone::IDENTITY);
        let p = bone.transform_and_translate_point(&vert.vert_coords);
        pos = vector_ma(&pos, weight, &p);
    }
    out[0] = pos[0] * scale[0];
    out[1] = pos[1] * scale[1];
    out[2] = pos[2] * scale[2];
    out[3] = st[0];
    out[4] = st[1];
}

/// Skin one surface into a fresh heap span.
pub fn transform_each_surface(
    surface: &MdxmSurface,
    scale: &Vec3,
    heap: &mut MiniHeap,
    bone_cache: &[MdxaBone],
) -> Result<HeapSpan, G2Error> {
    let num_verts = surface.verts.len();
    let span = heap.alloc_floats(num_verts * G2_VERT_STRIDE)?;
    let Some(out) = heap.get_mut(&span) else {
        return Ok(span);
    };
    let refs = &surface.bone_references;

    if num_verts >= PARALLEL_SKIN_THRESHOLD {
        out.par_chunks_mut(G2_VERT_STRIDE)
            .zip(surface.verts.par_iter())
            .zip(surface.tex_coords.par_iter())
            .for_each(|((dest, vert), st)| skin_vertex(vert, st, refs, bone_cache, scale, dest));
    } else {
        for ((dest, vert), st) in out
            .chunks_mut(G2_VERT_STRIDE)
            .zip(surface.verts.iter())
            .zip(surface.tex_coords.iter())
        {
            skin_vertex(vert, st, refs, bone_cache, scale, dest);
        }
    }
    Ok(span)
}

struct TransformPass<'a> {
    mdxm: &'a MdxmHeader,
    slist: &'a [SurfaceInfo],
    bone_cache: &'a [MdxaBone],
    lod: i32,
    scale: Vec3,
    second_time_around: bool,
}

impl TransformPass<'_> {
    fn transform_surfaces(
        &self,
        surface_num: i32,
        heap: &mut MiniHeap,
        transformed_verts: &mut [Option<HeapSpan>],
    ) -> Result<(), G2Error> {
        let (Some(surface), Some(info)) = (
            find_surface(self.mdxm, surface_num, self.lod),
            surf_hierarchy(self.mdxm, surface_num),
        ) else {
            return Ok(());
        };
        let flags = surface_flags(self.mdxm, self.slist, surface_num);

        if is_drawable(flags) {
            let slot = &mut transformed_verts[surface_num as usize];
            // already skinned this frame, and so is everything below it
            if self.second_time_around && slot.is_some_and(|span| heap.is_live(&span)) {
                return Ok(());
            }
            *slot = Some(transform_each_surface(surface, &self.scale, heap, self.bone_cache)?);
        }

        if flags.contains(HIDE_SUBTREE) {
            return Ok(());
        }
        for &child in &info.child_indexes {
            self.transform_surfaces(child, heap, transformed_verts)?;
        }
        Ok(())
    }
}

/// Skin every active instance of a collection for `frame_num`. A second call
/// in the same frame stops at every surface that already has a live span and
/// only walks below surfaces skinned for the first time.
pub fn transform_model(
    ghoul2: &mut Ghoul2InfoV,
    cache: &ModelCache,
    frame_num: i32,
    scale: &Vec3,
    heap: &mut MiniHeap,
    use_lod: i32,
) -> Result<(), G2Error> {
    // zero scale means unscaled
    let scale = scale.map(|s| if s == 0.0 { 1.0 } else { s });

    for inst in ghoul2.iter_mut().filter(|g| g.is_active()) {
        let Some((model, mdxm, mdxa)) = cache.glm_and_gla(inst.model) else {
            com_dprintf(&format!("G2_TransformModel: {} is not a ghoul2 mesh\n", inst.file_name));
            continue;
        };

        let num_surfaces = mdxm.surf_hierarchy.len();
        let second_time_around = inst.mesh_frame_num == frame_num && inst.transformed_verts.len() == num_surfaces;
        inst.mesh_frame_num = frame_num;
        if !second_time_around {
            inst.transformed_verts.clear();
            inst.transformed_verts.resize(num_surfaces, None);
        }
        if inst.bone_cache.len() != mdxa.bones.len() {
            construct_ghoul_skeleton(inst, mdxa, frame_num);
        }

        let pass = TransformPass {
            mdxm,
            slist: &inst.slist,
            bone_cache: &inst.bone_cache,
            lod: decide_trace_lod(inst, use_lod, model),
            scale,
            second_time_around,
        };
        pass.transform_surfaces(inst.surface_root, heap, &mut inst.transformed_verts)?;
    }
    Ok(())
}

// ============================================================
// World matrix
// ============================================================

/// Model-to-world transform of one trace call and its inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct G2WorldMatrix {
    pub world: MdxaBone,
    pub world_inv: MdxaBone,
}

impl Default for G2WorldMatrix {
    fn default() -> Self {
        Self {
            world: MdxaBone::IDENTITY,
            world_inv: MdxaBone::IDENTITY,
        }
    }
}

pub fn generate_world_matrix(angles: &Vec3, origin: &Vec3) -> G2WorldMatrix {
    let world = MdxaBone::from_angles(angles, origin);
    G2WorldMatrix {
        world,
        world_inv: world.inverse(),
    }
}

// ============================================================
// Poly tests
// ============================================================

pub fn area_of_tri(a: &Vec3, b: &Vec3, c: &Vec3) -> f32 {
    let ab = vector_subtract(a, b);
    let cb = vector_subtract(c, b);
    vector_length(&cross_product(&ab, &cb))
}

/// Texture coordinate of `p` inside triangle ABC, wrapped into [0, 1), and
/// its barycentric (i, j) weights towards A and B.
pub fn build_hit_point_st(
    a: &Vec3,
    st_a: [f32; 2],
    b: &Vec3,
    st_b: [f32; 2],
    c: &Vec3,
    st_c: [f32; 2],
    p: &Vec3,
) -> ([f32; 2], f32, f32) {
    let area_abc = area_of_tri(a, b, c);
    let i = area_of_tri(p, b, c) / area_abc;
    let j = area_of_tri(a, p, c) / area_abc;
    let k = area_of_tri(a, b, p) / area_abc;

    let wrap = |v: f32| {
        let v = v % 1.0;
        if v < 0.0 {
            v + 1.0
        } else {
            v
        }
    };
    let s = wrap(st_a[0] * i + st_b[0] * j + st_c[0] * k);
    let t = wrap(st_a[1] * i + st_b[1] * j + st_c[1] * k);
    ([s, t], i, j)
}

/// Where the segment crosses triangle ABC: (hit point, unnormalized face
/// normal, ray . normal).
pub fn segment_triangle_test(start: &Vec3, end: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Option<(Vec3, Vec3, f32)> {
    const TINY: f32 = 1e-10;

    let normal = cross_product(&vector_subtract(b, a), &vector_subtract(c, a));
    let ray = vector_subtract(end, start);
    let denom = dot_product(&ray, &normal);
    if denom.abs() < TINY {
        return None;
    }

    let t = dot_product(&vector_subtract(a, start), &normal) / denom;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let point = vector_ma(start, t, &ray);

    let pa = vector_subtract(a, &point);
    let pb = vector_subtract(b, &point);
    let pc = vector_subtract(c, &point);
    for (e1, e2) in [(&pa, &pb), (&pc, &pa), (&pb, &pc)] {
        if dot_product(&cross_product(e1, e2), &normal) < 0.0 {
            return None;
        }
    }
    Some((point, normal, denom))
}

fn vert_pos(verts: &[f32], index: i32) -> Vec3 {
    let base = index as usize * G2_VERT_STRIDE;
    [verts[base], verts[base + 1], verts[base + 2]]
}

fn vert_st(verts: &[f32], index: i32) -> [f32; 2] {
    let base = index as usize * G2_VERT_STRIDE;
    [verts[base + 3], verts[base + 4]]
}

/// Outside bits of a vertex against the unit box around the ray: bit set
/// means the vertex is past that face.
fn radius_outside_bits(s: f32, t: f32, u: f32) -> i32 {
    let mut inside = 0;
    if s > 0.0 {
        inside |= 1;
    }
    if s < 1.0 {
        inside |= 2;
    }
    if t > 0.0 {
        inside |= 4;
    }
    if t < 1.0 {
        inside |= 8;
    }
    if u > 0.0 {
        inside |= 16;
    }
    if u < 1.0 {
        inside |= 32;
    }
    !inside & 63
}

// ============================================================
// Trace
// ============================================================

/// What a poly level trace asks of the surface walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PolyTrace {
    Continue,
    Stop,
}

struct TraceSurface<'a> {
    cache: &'a ModelCache,
    mdxm: &'a MdxmHeader,
    slist: &'a [SurfaceInfo],
    transformed_verts: &'a [Option<HeapSpan>],
    heap: &'a MiniHeap,
    world: &'a G2WorldMatrix,
    skin: Option<&'a Skin>,
    cust_shader: Option<&'a Shader>,
    lod: i32,
    ray_start: Vec3,
    ray_end: Vec3,
    ent_num: i32,
    model_index: i32,
    trace_flags: TraceFlags,
    radius: f32,
    records: &'a mut [CollisionRecord],
    hit_one: bool,
    stopped: bool,
}

impl TraceSurface<'_> {
    fn return_on_hit(&self) -> bool {
        self.trace_flags.contains(TraceFlags::RETURNONHIT)
    }

    /// Shader whose hit maps apply to a surface.
    fn hit_shader(&self, info: &MdxmSurfHierarchy) -> &Shader {
        if let Some(shader) = self.cust_shader {
            return shader;
        }
        if let Some(skin) = self.skin {
            let handle = skin
                .surfaces
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(&info.name))
                .map_or(0, |s| s.shader);
            return self.cache.shader_by_handle(handle);
        }
        self.cache.shader_by_handle(info.shader_index)
    }

    /// Claim the first free record, filling the fields every hit carries.
    fn new_record(&mut self, surface: &MdxmSurface, poly: usize, flags: i32) -> Option<usize> {
        let slot = self.records.iter().position(|r| r.is_free())?;
        let rec = &mut self.records[slot];
        rec.poly_index = poly as i32;
        rec.entity_num = self.ent_num;
        rec.surface_index = surface.this_surface_index;
        rec.model_index = self.model_index;
        rec.flags = flags;
        rec.material = 0;
        rec.location = 0;
        self.hit_one = true;
        Some(slot)
    }

    fn trace_polys(&mut self, surface: &MdxmSurface, info: &MdxmSurfHierarchy, verts: &[f32]) -> PolyTrace {
        for (j, tri) in surface.triangles.iter().enumerate() {
            let [ia, ib, ic] = tri.indexes;
            let (a, b, c) = (vert_pos(verts, ia), vert_pos(verts, ib), vert_pos(verts, ic));
            let Some((hit, normal, face)) = segment_triangle_test(&self.ray_start, &self.ray_end, &a, &b, &c) else {
                continue;
            };

            let flags = if face > 0.0 { G2_FRONTFACE } else { G2_BACKFACE };
            let Some(slot) = self.new_record(surface, j, flags) else {
                return PolyTrace::Stop;
            };
            let world = self.world.world;
            {
                let rec = &mut self.records[slot];
                rec.collision_position = world.transform_and_translate_point(&hit);
                rec.collision_normal = world.transform_point(&normal);
                vector_normalize(&mut rec.collision_normal);
            }
            if self.return_on_hit() {
                return PolyTrace::Stop;
            }

            let (st, bary_i, bary_j) = build_hit_point_st(
                &a,
                vert_st(verts, ia),
                &b,
                vert_st(verts, ib),
                &c,
                vert_st(verts, ic),
                &hit,
            );
            let shader = self.hit_shader(info);
            let location = self.cache.hit_map(shader.hit_location).map_or(0, |m| m.sample(st[0], st[1]));
            let material = self.cache.hit_map(shader.hit_material).map_or(0, |m| m.sample(st[0], st[1]));
            if shader.hit_location != 0 {
                com_dprintf(&format!("G2_TracePolys hit location: {}\n", location));
            }

            let rec = &mut self.records[slot];
            rec.distance = distance(&hit, &self.ray_start);
            rec.barycentric_i = bary_i;
            rec.barycentric_j = bary_j;
            rec.location = location;
            rec.material = material;
        }
        PolyTrace::Continue
    }

    /// Coarse cylinder test: a triangle hits when no single face of the
    /// box around the ray has all three of its vertices outside.
    fn radius_trace_polys(&mut self, surface: &MdxmSurface, verts: &[f32]) -> PolyTrace {
        let mut dir = vector_subtract(&self.ray_end, &self.ray_start);

        let mut basis2: Vec3 = [0.0, 0.0, 1.0];
        let mut basis1 = cross_product(&dir, &basis2);
        if dot_product(&basis1, &basis1) < 0.1 {
            basis2 = [0.0, 1.0, 0.0];
            basis1 = cross_product(&dir, &basis2);
        }
        basis2 = cross_product(&dir, &basis1);
        vector_normalize(&mut basis1);
        vector_normalize(&mut basis2);

        let taxis = vector_scale(&basis1, 0.5 / self.radius);
        let saxis = vector_scale(&basis2, 0.5 / self.radius);
        let len_sq = vector_length_squared(&dir);
        dir = vector_scale(&dir, 1.0 / len_sq);

        let mut all_outside = 63;
        let vert_flags: Vec<i32> = (0..surface.verts.len() as i32)
            .map(|v| {
                let delta = vector_subtract(&vert_pos(verts, v), &self.ray_start);
                let s = dot_product(&delta, &saxis) + 0.5;
                let t = dot_product(&delta, &taxis) + 0.5;
                let u = dot_product(&delta, &dir);
                let bits = radius_outside_bits(s, t, u);
                all_outside &= bits;
                bits
            })
            .collect();
        if all_outside != 0 {
            return PolyTrace::Continue;
        }

        for (j, tri) in surface.triangles.iter().enumerate() {
            let [ia, ib, ic] = tri.indexes;
            if 63 & vert_flags[ia as usize] & vert_flags[ib as usize] & vert_flags[ic as usize] != 0 {
                continue;
            }
            let Some(slot) = self.new_record(surface, j, G2_FRONTFACE) else {
                return PolyTrace::Stop;
            };

            // the exact hit point is unknown, the first vertex stands in for it
            let (a, b, c) = (vert_pos(verts, ia), vert_pos(verts, ib), vert_pos(verts, ic));
            let normal = cross_product(&vector_subtract(&b, &a), &vector_subtract(&c, &a));
            let world = self.world.world;
            let return_on_hit = self.return_on_hit();
            let rec = &mut self.records[slot];
            rec.collision_normal = world.transform_point(&normal);
            vector_normalize(&mut rec.collision_normal);
            rec.collision_position = world.transform_and_translate_point(&a);
            if return_on_hit {
                return PolyTrace::Stop;
            }
            rec.distance = distance(&a, &self.ray_start);
            rec.barycentric_i = 0.0;
            rec.barycentric_j = 0.0;
        }
        PolyTrace::Continue
    }

    fn trace_surfaces(&mut self, surface_num: i32) -> Result<(), G2Error> {
        if self.stopped {
            return Ok(());
        }
        let mdxm = self.mdxm;
        let (Some(surface), Some(info)) = (find_surface(mdxm, surface_num, self.lod), surf_hierarchy(mdxm, surface_num)) else {
            return Ok(());
        };
        let flags = surface_flags(mdxm, self.slist, surface_num);

        if is_drawable(flags) {
            let (heap, spans) = (self.heap, self.transformed_verts);
            let verts = spans
                .get(surface_num as usize)
                .copied()
                .flatten()
                .and_then(|span| heap.get(&span))
                .ok_or(G2Error::SurfaceNotTransformed { surface: surface_num })?;

            let result = if self.radius.abs() < 0.1 {
                self.trace_polys(surface, info, verts)
            } else {
                self.radius_trace_polys(surface, verts)
            };
            if result == PolyTrace::Stop {
                self.stopped = true;
                return Ok(());
            }
        }

        if flags.contains(HIDE_SUBTREE) {
            return Ok(());
        }
        for &child in &info.child_indexes {
            self.trace_surfaces(child)?;
        }
        Ok(())
    }
}

/// Trace a model-space ray against every collidable instance of a
/// collection, filling free slots of `records`. `radius` below 0.1 is a
/// point trace. Returns true if anything was hit.
pub fn trace_models(
    ghoul2: &Ghoul2InfoV,
    cache: &ModelCache,
    heap: &MiniHeap,
    world: &G2WorldMatrix,
    ray_start: &Vec3,
    ray_end: &Vec3,
    records: &mut [CollisionRecord],
    ent_num: i32,
    trace_flags: TraceFlags,
    use_lod: i32,
    radius: f32,
) -> Result<bool, G2Error> {
    let mut hit_one = false;

    for (i, inst) in ghoul2.iter().enumerate() {
        if !inst.is_active() || inst.flags.contains(ModelFlags::NOCOLLIDE) {
            continue;
        }
        let Some((model, mdxm, _)) = cache.glm_and_gla(inst.model) else {
            continue;
        };

        let cust_shader = (inst.custom_shader != 0).then(|| cache.shader_by_handle(inst.custom_shader));
        let mut ts = TraceSurface {
            cache,
            mdxm,
            slist: &inst.slist,
            transformed_verts: &inst.transformed_verts,
            heap,
            world,
            skin: cache.skin_by_handle(inst.custom_skin),
            cust_shader,
            lod: decide_trace_lod(inst, use_lod, model),
            ray_start: *ray_start,
            ray_end: *ray_end,
            ent_num,
            model_index: i as i32,
            trace_flags,
            radius,
            records: &mut *records,
            hit_one: false,
            stopped: false,
        };
        ts.trace_surfaces(inst.surface_root)?;
        hit_one |= ts.hit_one || ts.stopped;

        if ts.stopped {
            break;
        }
    }
    Ok(hit_one)
}

/// Blend each angle override towards the same slot of `next_ghoul2`; slots
/// with nothing to blend to take their current matrix.
pub fn lerp_angles(ghoul2: &mut Ghoul2InfoV, next_ghoul2: &Ghoul2InfoV, interpolation: f32) {
    for (i, inst) in ghoul2.iter_mut().enumerate() {
        if !inst.is_active() {
            continue;
        }
        let next = next_ghoul2.get(i).filter(|n| n.is_active());
        for (x, bone) in inst.blist.iter_mut().enumerate() {
            match next.and_then(|n| n.blist.get(x)).filter(|b| !b.is_free()) {
                Some(next_bone) => {
                    if !bone.is_free() && bone.flags.intersects(BoneFlags::ANGLES_TOTAL) {
                        bone.new_matrix = bone.matrix.lerp(&next_bone.matrix, interpolation);
                    }
                }
                None => bone.new_matrix = bone.matrix,
            }
        }
    }
}
