#![allow(dead_code, unused_variables, unused_assignments, unused_mut)]
#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::manual_range_contains, clippy::float_cmp, clippy::ptr_arg)]

// Server side of Ghoul2: per-frame vertex space and model traces

pub mod sv_g2;
