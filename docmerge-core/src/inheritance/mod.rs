//! Inheritance resolution.
//!
//! Pipeline:
//! ```text
//! ModuleFacts ──► FactIndex (container chains checked)
//!                     │
//!                     ├── HierarchyGraph (derived -> base edges)
//!                     │
//!                     └── InheritanceResolver ──► Vec<ResolvedMember>
//! ```

pub mod fact_index;
pub mod hierarchy;
pub mod resolver;

pub use fact_index::{FactIndex, IndexedType};
pub use hierarchy::HierarchyGraph;
pub use resolver::{
    resolve_members, InheritanceResolver, ResolveOptions, ResolvedMember, DEFAULT_UNIVERSAL_BASE,
};
