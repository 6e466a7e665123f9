//! Turning configuration mappings into live objects
//!
//! The creator takes a [`ValueGraph`](crate::value::ValueGraph) and replaces every
//! construction marker (a single-key mapping whose key names a registered type) with
//! the object its constructor returns. Arguments are built first, depth-first in
//! declaration order, so constructors always receive finished values.
//!
//! # Module Structure
//!
//! - [`built`] - [`BuiltValue`], [`Instance`] and [`Arguments`]
//! - [`resolver`] - the [`Resolver`] capability, [`TypeRegistry`] and [`DottedPathResolver`]
//! - [`builder`] - [`ObjectBuilder`] with identity-preserving memoization
//! - [`generic`] - rewriting the `{class, params}` marker form into shorthand
//! - [`placeholder`] - `<name>` substitution after building
//!
//! # Marker forms
//!
//! ```yaml
//! # shorthand
//! cache:
//!   pkg.cache.Lru:
//!     capacity: 128
//!
//! # generic, normalized into the shorthand before building
//! cache:
//!   class: {module: pkg.cache, name: Lru}
//!   params: {capacity: 128}
//! ```

pub mod builder;
pub mod built;
pub mod generic;
pub mod placeholder;
pub mod resolver;

pub use builder::{ObjectBuilder, create};
pub use built::{Arguments, BuiltValue, Instance};
pub use generic::GenericMarkers;
pub use placeholder::{find_placeholders, inject, placeholder_name};
pub use resolver::{
    Constructor, DEFAULT_MODULE, DottedPathResolver, Resolver, TypeRegistry, is_dotted_path,
    split_type_path,
};
