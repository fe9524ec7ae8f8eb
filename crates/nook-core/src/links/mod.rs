//! Cross-note `[[Title]]` references

mod graph;
mod references;
mod rewrite;

pub use graph::{GraphEdge, GraphNode, LinkGraph, UnresolvedReference};
pub use references::{extract_references, Reference};
pub use rewrite::{rewrite_references, rewrite_references_in, LinkRewriter};
