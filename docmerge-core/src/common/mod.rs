//! Common utilities shared across the builder, resolver and relocator.

mod graph_trait;
mod path_builder;
mod visibility;

pub use graph_trait::GraphTraversal;
pub use path_builder::{
    local_part, member_key, member_local_key, name_with_arity, normalize_cref, parameter_key,
    type_key, type_name_from_key, QualifiedPathBuilder,
};
pub use visibility::{Visibility, VisibilityFilter};
