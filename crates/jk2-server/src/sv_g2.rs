// sv_g2.rs — server-owned Ghoul2 vertex space and model collision
//
// The server skins models into one MiniHeap that is emptied at the start of
// every server frame. Running out of space drops the trace, not the server.

use parking_lot::Mutex;

use jk2_common::common::{com_error, com_init, com_printf};
use jk2_common::cvar::{cvar_get, cvar_variable_value, with_cvar_ctx, CvarFlags};
use jk2_common::g2_error::G2Error;
use jk2_common::miniheap::{MiniHeap, G2_VERT_SPACE_SERVER_SIZE};
use jk2_common::q_shared::{Vec3, ERR_DROP};
use jk2_renderer::g2_api::{clear_collision_records, collision_detect};
use jk2_renderer::g2_model::ModelCache;
use jk2_renderer::g2_types::{CollisionRecord, Ghoul2InfoV, TraceFlags};

static SV_G2_CTX: Mutex<Option<SvGhoul2>> = Mutex::new(None);

/// Access the global SvGhoul2 via a closure.
pub fn with_sv_g2_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut SvGhoul2) -> R,
{
    SV_G2_CTX.lock().as_mut().map(f)
}

/// Map start: apply latched cvars, then size the vertex space from them.
pub fn init_sv_g2_ctx(models: ModelCache) {
    com_init();
    with_cvar_ctx(|c| c.get_latched_vars());
    *SV_G2_CTX.lock() = Some(SvGhoul2::new(models));
}

pub fn shutdown_sv_g2_ctx() {
    *SV_G2_CTX.lock() = None;
}

/// `sv_g2vertspace`: size of the server vertex space in KB. Latched, so a
/// change waits for the next map.
pub fn sv_g2_register_cvars() -> Option<usize> {
    let default_kb = (G2_VERT_SPACE_SERVER_SIZE / 1024).to_string();
    cvar_get("sv_g2vertspace", &default_kb, CvarFlags::LATCH | CvarFlags::ARCHIVE)
}

fn vert_space_bytes() -> usize {
    let kb = cvar_variable_value("sv_g2vertspace");
    if kb < 1.0 {
        com_printf("sv_g2vertspace below 1, using the default\n");
        return G2_VERT_SPACE_SERVER_SIZE;
    }
    kb as usize * 1024
}

pub struct SvGhoul2 {
    pub models: ModelCache,
    vert_space: MiniHeap,
    frame_num: i32,
}

impl SvGhoul2 {
    pub fn new(models: ModelCache) -> Self {
        com_init();
        sv_g2_register_cvars();
        Self {
            models,
            vert_space: MiniHeap::new(vert_space_bytes()),
            frame_num: 0,
        }
    }

    /// Start a server frame. Everything skinned in the previous frame is gone.
    pub fn begin_frame(&mut self, frame_num: i32) {
        self.vert_space.reset();
        self.frame_num = frame_num;
    }

    pub fn frame_num(&self) -> i32 {
        self.frame_num
    }

    pub fn vert_space(&self) -> &MiniHeap {
        &self.vert_space
    }

    /// Trace a world-space ray against an entity's models placed at
    /// `origin`/`angles`. Returns false if the trace had to be dropped; the
    /// records are then left empty.
    pub fn trace(
        &mut self,
        records: &mut [CollisionRecord],
        ghoul2: &mut Ghoul2InfoV,
        angles: &Vec3,
        origin: &Vec3,
        ent_num: i32,
        start: &Vec3,
        end: &Vec3,
        scale: &Vec3,
        trace_flags: TraceFlags,
        use_lod: i32,
        radius: f32,
    ) -> bool {
        let result = collision_detect(
            records,
            ghoul2,
            &self.models,
            angles,
            origin,
            self.frame_num,
            ent_num,
            start,
            end,
            scale,
            &mut self.vert_space,
            trace_flags,
            use_lod,
            radius,
        );
        match result {
            Ok(()) => true,
            Err(err @ G2Error::OutOfVertSpace { .. }) => {
                com_error(ERR_DROP, &format!("Ran out of transform space gameside for Ghoul2 Models ({})", err));
                clear_collision_records(records);
                false
            }
            Err(err) => {
                com_error(ERR_DROP, &format!("G2 trace against entity {}: {}", ent_num, err));
                clear_collision_records(records);
                false
            }
        }
    }

    pub fn print_info(&self) {
        com_printf(&format!(
            "G2 vertex space: {} of {} bytes used in frame {}\n",
            self.vert_space.used(),
            self.vert_space.size(),
            self.frame_num
        ));
    }
}
