// Copyright (C) 1997-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// g2_model.rs — Ghoul2 model registration and read-only accessors
// Skeletons (.gla) and meshes (.glm) are registered by name and validated
// once; traversal code downstream trusts the hierarchy.

use std::collections::HashMap;

use jk2_common::common::com_printf;
use jk2_common::cvar::cvar_variable_value;
use jk2_common::g2_error::G2Error;

use crate::g2_types::*;

pub const MAX_MOD_KNOWN: usize = 512;

// =============================================================
//  Asset builders
// =============================================================

impl MdxaHeader {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bones: Vec::new(),
        }
    }

    /// Append a bone; parents must be added before their children.
    pub fn add_bone(&mut self, name: &str, parent: i32, base_pose: MdxaBone, flags: SkelBoneFlags) -> i32 {
        let index = self.bones.len() as i32;
        if parent >= 0 {
            if let Some(p) = self.bones.get_mut(parent as usize) {
                p.children.push(index);
            }
        }
        self.bones.push(MdxaSkel {
            name: name.to_string(),
            flags,
            parent,
            base_pose_mat: base_pose,
            base_pose_mat_inv: base_pose.inverse(),
            children: Vec::new(),
        });
        index
    }
}

impl MdxmHeader {
    pub fn new(name: &str, anim_name: &str) -> Self {
        Self {
            name: name.to_string(),
            anim_name: anim_name.to_string(),
            ..Default::default()
        }
    }

    /// Append a hierarchy node; parents must be added before their children.
    pub fn add_surface(&mut self, name: &str, parent: i32, flags: SurfaceFlags, shader: &str) -> i32 {
        let index = self.surf_hierarchy.len() as i32;
        if parent >= 0 {
            if let Some(p) = self.surf_hierarchy.get_mut(parent as usize) {
                p.child_indexes.push(index);
            }
        }
        self.surf_hierarchy.push(MdxmSurfHierarchy {
            name: name.to_string(),
            flags,
            shader: shader.to_string(),
            shader_index: 0,
            parent_index: parent,
            child_indexes: Vec::new(),
        });
        index
    }

    /// Append a LOD holding one surface per hierarchy node, in index order.
    pub fn add_lod(&mut self, surfaces: Vec<MdxmSurface>) {
        self.lods.push(MdxmLod { surfaces });
    }
}

// =============================================================
//  Validation
// =============================================================

fn bad_model(name: &str, what: String) -> G2Error {
    G2Error::BadModel(format!("{}: {}", name, what))
}

fn validate_mdxa(header: &MdxaHeader) -> Result<(), G2Error> {
    if header.bones.is_empty() {
        return Err(bad_model(&header.name, "has no bones".into()));
    }
    for (i, bone) in header.bones.iter().enumerate() {
        if bone.parent >= i as i32 || bone.parent < -1 {
            return Err(bad_model(&header.name, format!("bone {} has bad parent {}", bone.name, bone.parent)));
        }
    }
    Ok(())
}

fn validate_mdxm(header: &MdxmHeader, num_bones: usize) -> Result<(), G2Error> {
    let num_surfaces = header.surf_hierarchy.len();
    if num_surfaces == 0 {
        return Err(bad_model(&header.name, "has no surfaces".into()));
    }
    if header.lods.is_empty() {
        return Err(bad_model(&header.name, "has no lods".into()));
    }

    for (i, surf) in header.surf_hierarchy.iter().enumerate() {
        if surf.parent_index >= num_surfaces as i32 || surf.parent_index < -1 || surf.parent_index == i as i32 {
            return Err(bad_model(&header.name, format!("surface {} has bad parent {}", surf.name, surf.parent_index)));
        }
        for &child in &surf.child_indexes {
            let ok = header
                .surf_hierarchy
                .get(child as usize)
                .is_some_and(|c| c.parent_index == i as i32);
            if child < 0 || !ok {
                return Err(bad_model(&header.name, format!("surface {} has bad child {}", surf.name, child)));
            }
        }
    }

    for (l, lod) in header.lods.iter().enumerate() {
        if lod.surfaces.len() != num_surfaces {
            return Err(bad_model(
                &header.name,
                format!("lod {} has {} surfaces, expected {}", l, lod.surfaces.len(), num_surfaces),
            ));
        }
        for (i, surface) in lod.surfaces.iter().enumerate() {
            if surface.this_surface_index != i as i32 {
                return Err(bad_model(&header.name, format!("lod {} surface {} is out of order", l, i)));
            }
            if surface.tex_coords.len() != surface.verts.len() {
                return Err(bad_model(&header.name, format!("lod {} surface {} has mismatched texcoords", l, i)));
            }
            let num_verts = surface.verts.len() as i32;
            if surface
                .triangles
                .iter()
                .any(|tri| tri.indexes.iter().any(|&idx| idx < 0 || idx >= num_verts))
            {
                return Err(bad_model(&header.name, format!("lod {} surface {} has bad triangle index", l, i)));
            }
            if surface.bone_references.iter().any(|&b| b < 0 || b as usize >= num_bones) {
                return Err(bad_model(&header.name, format!("lod {} surface {} references missing bone", l, i)));
            }
            for v in &surface.verts {
                let n = v.num_weights();
                if n == 0 || n > MAX_BONE_WEIGHTS {
                    return Err(bad_model(&header.name, format!("lod {} surface {} vertex has {} weights", l, i, n)));
                }
                if (0..n).any(|k| v.bone_ref(k) >= surface.bone_references.len()) {
                    return Err(bad_model(&header.name, format!("lod {} surface {} vertex bone ref out of range", l, i)));
                }
                if v.weights[..n - 1].iter().any(|w| !w.is_finite()) {
                    return Err(bad_model(&header.name, format!("lod {} surface {} vertex weight not finite", l, i)));
                }
            }
        }
    }
    Ok(())
}

// =============================================================
//  Model cache
// =============================================================

/// Every registered model, shader, skin and hit map. Handle 0 of each table
/// is the default entry.
pub struct ModelCache {
    models: Vec<Model>,
    model_index: HashMap<String, QHandle>,
    shaders: Vec<Shader>,
    skins: Vec<Skin>,
    hit_maps: Vec<HitMap>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            models: vec![Model {
                name: "*default".to_string(),
                ..Default::default()
            }],
            model_index: HashMap::new(),
            shaders: vec![Shader {
                name: "<default>".to_string(),
                ..Default::default()
            }],
            skins: vec![Skin {
                name: "<default skin>".to_string(),
                surfaces: Vec::new(),
            }],
            hit_maps: vec![HitMap::default()],
        }
    }

    /// Handle for a registered model name, 0 if unknown.
    pub fn model_handle(&self, name: &str) -> QHandle {
        self.model_index
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn get_model_by_handle(&self, handle: QHandle) -> &Model {
        if handle < 1 || handle as usize >= self.models.len() {
            return &self.models[0];
        }
        &self.models[handle as usize]
    }

    pub fn mdxm(&self, handle: QHandle) -> Option<&MdxmHeader> {
        match self.get_model_by_handle(handle).data {
            ModelData::Mdxm(ref header) => Some(header),
            _ => None,
        }
    }

    pub fn mdxa(&self, handle: QHandle) -> Option<&MdxaHeader> {
        match self.get_model_by_handle(handle).data {
            ModelData::Mdxa(ref header) => Some(header),
            _ => None,
        }
    }

    /// Mesh and its skeleton.
    pub fn glm_and_gla(&self, handle: QHandle) -> Option<(&Model, &MdxmHeader, &MdxaHeader)> {
        let model = self.get_model_by_handle(handle);
        let mdxm = self.mdxm(handle)?;
        let mdxa = self.mdxa(mdxm.anim_index)?;
        Some((model, mdxm, mdxa))
    }

    fn add_model(&mut self, name: &str, data: ModelData, num_lods: i32) -> Result<QHandle, G2Error> {
        if self.models.len() == MAX_MOD_KNOWN {
            return Err(G2Error::BadModel("mod_numknown == MAX_MOD_KNOWN".into()));
        }
        let index = self.models.len() as QHandle;
        self.models.push(Model {
            name: name.to_string(),
            index,
            data,
            num_lods,
        });
        self.model_index.insert(name.to_ascii_lowercase(), index);
        Ok(index)
    }

    /// Register a skeleton. A name already known returns its existing handle.
    pub fn register_gla(&mut self, header: MdxaHeader) -> Result<QHandle, G2Error> {
        let existing = self.model_handle(&header.name);
        if existing != 0 {
            return Ok(existing);
        }
        validate_mdxa(&header)?;
        let name = header.name.clone();
        self.add_model(&name, ModelData::Mdxa(header), 1)
    }

    /// Register a mesh. Its skeleton must already be registered under
    /// `anim_name`; surface shaders are resolved here.
    pub fn register_glm(&mut self, mut header: MdxmHeader) -> Result<QHandle, G2Error> {
        let existing = self.model_handle(&header.name);
        if existing != 0 {
            return Ok(existing);
        }

        let anim_index = self.model_handle(&header.anim_name);
        let num_bones = match self.mdxa(anim_index) {
            Some(mdxa) => mdxa.bones.len(),
            None => {
                return Err(bad_model(&header.name, format!("animation {} not registered", header.anim_name)));
            }
        };
        header.anim_index = anim_index;
        validate_mdxm(&header, num_bones)?;

        for surf in &mut header.surf_hierarchy {
            surf.shader_index = if surf.shader.is_empty() {
                0
            } else {
                self.register_shader(&surf.shader, None, None)
            };
        }

        let name = header.name.clone();
        let num_lods = header.lods.len() as i32;
        log::debug!("registered mesh {} ({} surfaces, {} lods) on {}", name, header.surf_hierarchy.len(), num_lods, header.anim_name);
        self.add_model(&name, ModelData::Mdxm(header), num_lods)
    }

    /// Register a hit location/material byte map, returning its index.
    pub fn register_hit_map(&mut self, map: HitMap) -> i32 {
        if let Some(i) = self.hit_maps.iter().skip(1).position(|m| m.name.eq_ignore_ascii_case(&map.name)) {
            return i as i32 + 1;
        }
        self.hit_maps.push(map);
        self.hit_maps.len() as i32 - 1
    }

    pub fn hit_map(&self, index: i32) -> Option<&HitMap> {
        if index < 1 {
            return None;
        }
        self.hit_maps.get(index as usize)
    }

    fn hit_map_index(&self, name: Option<&str>) -> i32 {
        name.and_then(|n| {
            self.hit_maps
                .iter()
                .skip(1)
                .position(|m| m.name.eq_ignore_ascii_case(n))
        })
        .map_or(0, |i| i as i32 + 1)
    }

    /// Find or create a shader. Hit maps are looked up by name and must be
    /// registered first; unknown names leave the shader without that map.
    pub fn register_shader(&mut self, name: &str, hit_location: Option<&str>, hit_material: Option<&str>) -> QHandle {
        let loc = self.hit_map_index(hit_location);
        let mat = self.hit_map_index(hit_material);
        if let Some(i) = self.shaders.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            let shader = &mut self.shaders[i];
            if loc != 0 {
                shader.hit_location = loc;
            }
            if mat != 0 {
                shader.hit_material = mat;
            }
            return i as QHandle;
        }
        let index = self.shaders.len() as QHandle;
        self.shaders.push(Shader {
            name: name.to_string(),
            index,
            hit_location: loc,
            hit_material: mat,
        });
        index
    }

    pub fn shader_by_handle(&self, handle: QHandle) -> &Shader {
        if handle < 0 || handle as usize >= self.shaders.len() {
            return &self.shaders[0];
        }
        &self.shaders[handle as usize]
    }

    /// Register a skin mapping surface names to shader names.
    pub fn register_skin(&mut self, name: &str, surfaces: &[(&str, &str)]) -> QHandle {
        if let Some(i) = self.skins.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            return i as QHandle;
        }
        let surfaces = surfaces
            .iter()
            .map(|&(surf, shader)| SkinSurface {
                name: surf.to_ascii_lowercase(),
                shader: self.register_shader(shader, None, None),
            })
            .collect();
        self.skins.push(Skin {
            name: name.to_string(),
            surfaces,
        });
        self.skins.len() as QHandle - 1
    }

    /// Skins other than the default one.
    pub fn skin_by_handle(&self, handle: QHandle) -> Option<&Skin> {
        if handle < 1 {
            return None;
        }
        self.skins.get(handle as usize)
    }

    /// Print every registered model.
    pub fn list_models(&self) -> usize {
        com_printf("Loaded models:\n");
        let mut total = 0;
        for model in self.models.iter().skip(1) {
            let kind = match model.data {
                ModelData::Mdxa(_) => "GLA",
                ModelData::Mdxm(_) => "GLM",
                ModelData::Bad => "BAD",
            };
            com_printf(&format!("{:4} : {} {} ({} lods)\n", model.index, kind, model.name, model.num_lods));
            total += 1;
        }
        com_printf(&format!("Total models: {}\n", total));
        total
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================
//  Accessors
// =============================================================

/// Surface record for a hierarchy index at a given LOD.
pub fn find_surface(mdxm: &MdxmHeader, index: i32, lod: i32) -> Option<&MdxmSurface> {
    if index < 0 || lod < 0 {
        return None;
    }
    mdxm.lods.get(lod as usize)?.surfaces.get(index as usize)
}

pub fn surf_hierarchy(mdxm: &MdxmHeader, index: i32) -> Option<&MdxmSurfHierarchy> {
    if index < 0 {
        return None;
    }
    mdxm.surf_hierarchy.get(index as usize)
}

/// Skeleton name of the mesh, if it has one.
pub fn get_anim_file_name<'a>(cache: &'a ModelCache, file_name: &str) -> Option<&'a str> {
    let mdxm = cache.mdxm(cache.model_handle(file_name))?;
    if mdxm.anim_name.is_empty() {
        return None;
    }
    Some(mdxm.anim_name.as_str())
}

/// Print the surface hierarchy of a mesh. Returns the surface count.
pub fn list_model_surfaces(cache: &ModelCache, file_name: &str) -> usize {
    let mdxm = match cache.mdxm(cache.model_handle(file_name)) {
        Some(m) => m,
        None => {
            com_printf(&format!("{} is not a Ghoul2 mesh\n", file_name));
            return 0;
        }
    };
    let verbose = cvar_variable_value("r_verbose") != 0.0;
    for (x, surf) in mdxm.surf_hierarchy.iter().enumerate() {
        com_printf(&format!("Surface {} Name {}\n", x, surf.name));
        if verbose {
            com_printf(&format!("Num Descendants {}\n", surf.child_indexes.len()));
            for child in &surf.child_indexes {
                com_printf(&format!("Descendant {}\n", child));
            }
            com_printf(&format!("Flags {:#x}\n", surf.flags.bits()));
            com_printf(&format!("Shader {}\n", surf.shader));
        }
    }
    mdxm.surf_hierarchy.len()
}

/// Print the skeleton a mesh is built on. Returns the bone count.
pub fn list_model_bones(cache: &ModelCache, file_name: &str) -> usize {
    let mdxa = match cache
        .mdxm(cache.model_handle(file_name))
        .and_then(|mdxm| cache.mdxa(mdxm.anim_index))
    {
        Some(a) => a,
        None => {
            com_printf(&format!("{} has no skeleton\n", file_name));
            return 0;
        }
    };
    let verbose = cvar_variable_value("r_verbose") != 0.0;
    for (x, bone) in mdxa.bones.iter().enumerate() {
        com_printf(&format!("Bone {} Name {}\n", x, bone.name));
        if verbose {
            com_printf(&format!("X pos {}, Y pos {}, Z pos {}\n",
                bone.base_pose_mat.matrix[0][3],
                bone.base_pose_mat.matrix[1][3],
                bone.base_pose_mat.matrix[2][3]));
            com_printf(&format!("Num Descendants {}\n", bone.children.len()));
        }
    }
    mdxa.bones.len()
}
