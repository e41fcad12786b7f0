#![allow(dead_code, unused_variables, unused_assignments, unused_mut)]
#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::field_reassign_with_default,
         clippy::manual_range_contains, clippy::comparison_chain,
         clippy::identity_op, clippy::float_cmp, clippy::needless_range_loop,
         clippy::manual_clamp, clippy::ptr_arg, clippy::type_complexity)]
// Ghoul2 skeletal models: override lists, skinning and model traces

pub mod g2_types;
pub mod g2_model;
pub mod g2_surfaces;
pub mod g2_bones;
pub mod g2_bolts;
pub mod g2_misc;
pub mod g2_api;

#[cfg(test)]
pub(crate) mod g2_test_models;
