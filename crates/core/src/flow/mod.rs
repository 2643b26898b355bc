//! Parent-combination search (component E) and the textual-flow builder
//! (component F) built on top of it.

pub mod parent_search;
pub mod textual_flow;
