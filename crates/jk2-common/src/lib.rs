#![allow(dead_code, unused_variables, unused_assignments, unused_mut)]
#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::manual_range_contains,
         clippy::comparison_chain, clippy::identity_op, clippy::float_cmp,
         clippy::needless_range_loop, clippy::manual_clamp, clippy::ptr_arg)]

pub mod q_shared;
pub mod common;
pub mod cvar;
pub mod g2_error;
pub mod miniheap;
