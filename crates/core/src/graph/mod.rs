//! Graph primitives shared by local-stemma validation and the textual-flow
//! builder.

pub mod digraph;

pub use digraph::DiGraph;
