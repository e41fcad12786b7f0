// common.rs — console print and error reporting shared by client and server
//
// Output is forwarded to the `log` facade so the host decides where it goes.

use parking_lot::Mutex;

use crate::cvar::{cvar_get, cvar_init, cvar_variable_value, CvarFlags};
use crate::q_shared::{ERR_DROP, ERR_FATAL};

pub const MAXPRINTMSG: usize = 4096;

// ============================================================
// Redirect buffer for Com_Printf
// ============================================================

static RD_BUFFER: Mutex<Option<String>> = Mutex::new(None);

/// Begin redirecting printf output into a buffer.
pub fn com_begin_redirect() {
    *RD_BUFFER.lock() = Some(String::new());
}

/// End redirect and return the captured output.
pub fn com_end_redirect() -> Option<String> {
    RD_BUFFER.lock().take()
}

// ============================================================
// Com_Init / Com_Printf / Com_DPrintf / Com_Error
// ============================================================

/// Create the global cvar context and register `developer`. Calling it
/// again keeps the current values.
pub fn com_init() {
    cvar_init();
    cvar_get("developer", "0", CvarFlags::empty());
}

/// General-purpose print function. Logs at info level, or appends to the
/// redirect buffer if one is active.
pub fn com_printf(msg: &str) {
    {
        let mut buf = RD_BUFFER.lock();
        if let Some(ref mut s) = *buf {
            if s.len() + msg.len() <= MAXPRINTMSG {
                s.push_str(msg);
            }
            return;
        }
    }
    log::info!("{}", msg.trim_end_matches('\n'));
}

/// Developer-only print. Controlled by the global "developer" cvar.
pub fn com_dprintf(msg: &str) {
    if cvar_variable_value("developer") == 0.0 {
        return;
    }
    log::debug!("{}", msg.trim_end_matches('\n'));
    com_printf(msg);
}

/// Engine error handler.
/// - `ERR_FATAL`: logs and panics.
/// - `ERR_DROP`: logs the error banner; the caller abandons the current frame.
pub fn com_error(code: i32, msg: &str) {
    if code == ERR_FATAL {
        log::error!("Error: {}", msg);
        panic!("Fatal error: {}", msg);
    } else if code == ERR_DROP {
        log::error!("********************\nERROR: {}\n********************", msg);
    } else {
        log::error!("{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cvar::with_cvar_ctx;

    // tests sharing the redirect buffer
    static REDIRECT_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_redirect_captures_printf() {
        let _guard = REDIRECT_LOCK.lock();
        com_begin_redirect();
        com_printf("hello world\n");
        let out = com_end_redirect().unwrap_or_default();
        assert!(out.contains("hello world\n"), "captured: {:?}", out);
        assert_eq!(com_end_redirect(), None);
    }

    #[test]
    fn test_dprintf_follows_developer() {
        let _guard = REDIRECT_LOCK.lock();
        com_init();
        with_cvar_ctx(|c| c.force_set("developer", "0"));

        com_begin_redirect();
        com_dprintf("quiet\n");
        with_cvar_ctx(|c| c.set("developer", "1"));
        com_dprintf("loud\n");
        let out = com_end_redirect().unwrap_or_default();
        with_cvar_ctx(|c| c.force_set("developer", "0"));

        assert!(out.contains("loud\n"), "captured: {:?}", out);
        assert!(!out.contains("quiet"), "captured: {:?}", out);
    }

    #[test]
    #[should_panic(expected = "Fatal error: bad bone")]
    fn test_com_error_fatal_panics() {
        com_error(ERR_FATAL, "bad bone");
    }

    #[test]
    fn test_com_error_drop_returns() {
        let _ = env_logger::builder().is_test(true).try_init();
        com_error(ERR_DROP, "out of space");
    }
}
