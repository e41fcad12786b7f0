// cvar.rs — dynamic variable tracking

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::common::com_printf;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CvarFlags: i32 {
        /// Saved to the config file.
        const ARCHIVE = 0x01;
        /// Only allowed to be set from the command line.
        const NOSET   = 0x08;
        /// Changes are deferred until the next map restart.
        const LATCH   = 0x10;
    }
}

/// A console variable.
#[derive(Clone, Debug)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub latched_string: Option<String>,
    pub flags: CvarFlags,
    pub modified: bool,
    pub value: f32,
}

/// The full cvar system context.
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// O(1) cvar lookup by name -> index in cvar_vars
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self {
            cvar_vars: Vec::new(),
            cvar_index: HashMap::new(),
        }
    }

    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    /// Get the floating-point value of a cvar. Returns 0 if not found.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find_var(name).map_or(0.0, |var| var.value)
    }

    /// Get the string value of a cvar. Returns "" if not found.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |var| var.string.as_str())
    }

    /// Get or create a cvar. If it already exists, the value is not changed
    /// but flags are OR'd in.
    pub fn get(&mut self, name: &str, value: &str, flags: CvarFlags) -> usize {
        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            return idx;
        }

        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            latched_string: None,
            flags,
            modified: true,
            value: value.parse::<f32>().unwrap_or(0.0),
        });
        self.cvar_index.insert(name.to_string(), idx);
        idx
    }

    fn set2(&mut self, name: &str, value: &str, force: bool, server_running: bool) -> usize {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => return self.get(name, value, CvarFlags::empty()),
        };
        let var = &mut self.cvar_vars[idx];

        if !force {
            if var.flags.contains(CvarFlags::NOSET) {
                com_printf(&format!("{} is write protected.\n", name));
                return idx;
            }

            if var.flags.contains(CvarFlags::LATCH) && server_running {
                let unchanged = match var.latched_string {
                    Some(ref latched) => latched == value,
                    None => var.string == value,
                };
                if !unchanged {
                    com_printf(&format!("{} will be changed for next game.\n", name));
                    var.latched_string = Some(value.to_string());
                }
                return idx;
            }
        } else {
            var.latched_string = None;
        }

        if value == var.string {
            return idx;
        }

        var.modified = true;
        var.string = value.to_string();
        var.value = value.parse::<f32>().unwrap_or(0.0);
        idx
    }

    /// Set a cvar value (respects NOSET; LATCH takes effect immediately when
    /// no server is running).
    pub fn set(&mut self, name: &str, value: &str) -> usize {
        self.set2(name, value, false, false)
    }

    /// Set a cvar while a server is running, deferring latched variables.
    pub fn set_with_server_running(&mut self, name: &str, value: &str) -> usize {
        self.set2(name, value, false, true)
    }

    /// Force-set a cvar value (ignores NOSET and LATCH).
    pub fn force_set(&mut self, name: &str, value: &str) -> usize {
        self.set2(name, value, true, false)
    }

    /// Apply all latched variable changes.
    pub fn get_latched_vars(&mut self) {
        for var in &mut self.cvar_vars {
            if let Some(latched) = var.latched_string.take() {
                var.value = latched.parse::<f32>().unwrap_or(0.0);
                var.string = latched;
                var.modified = true;
            }
        }
    }

    /// Print all cvars whose name starts with `prefix`. Returns (total, matching).
    pub fn list(&self, prefix: Option<&str>) -> (usize, usize) {
        let mut matching = 0;
        for var in &self.cvar_vars {
            if let Some(p) = prefix {
                if !var.name.starts_with(p) {
                    continue;
                }
            }
            matching += 1;
            let a = if var.flags.contains(CvarFlags::ARCHIVE) { '*' } else { ' ' };
            let l = if var.flags.contains(CvarFlags::LATCH) { 'L' } else { ' ' };
            com_printf(&format!("{}{} {} \"{}\"\n", a, l, var.name, var.string));
        }
        let total = self.cvar_vars.len();
        com_printf(&format!("{} cvars, {} matching\n", total, matching));
        (total, matching)
    }
}

impl Default for CvarContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Global context
// ============================================================

static CVAR_CTX: Mutex<Option<CvarContext>> = Mutex::new(None);

/// Create the global context if it does not exist yet.
pub fn cvar_init() {
    let mut g = CVAR_CTX.lock();
    if g.is_none() {
        *g = Some(CvarContext::new());
    }
}

/// Access the global context with a closure. Returns None before `cvar_init`.
pub fn with_cvar_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut CvarContext) -> R,
{
    CVAR_CTX.lock().as_mut().map(f)
}

pub fn cvar_get(name: &str, value: &str, flags: CvarFlags) -> Option<usize> {
    with_cvar_ctx(|c| c.get(name, value, flags))
}

/// Value of a global cvar, 0 if it or the context does not exist.
pub fn cvar_variable_value(name: &str) -> f32 {
    with_cvar_ctx(|c| c.variable_value(name)).unwrap_or(0.0)
}

// ============================================================
// Tests
// ============================================================
