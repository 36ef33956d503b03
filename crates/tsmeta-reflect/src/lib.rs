//! Reflected entity model: building it from bound syntax trees and
//! resolving the type references it contains.

pub mod builder;
pub mod model;
pub mod resolve;

pub use builder::reflect_script;
pub use model::{Class, Import, Interface, Method, Module, Parameter, Script, Type, Variable};
pub use resolve::{
    ModuleView, ResolveOptions, for_each_type, resolve_pass_global, resolve_pass_local,
    resolve_scripts, resolve_type,
};
