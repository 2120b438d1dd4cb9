//! Local mirror of the server-rendered document.

pub mod fragment;
pub mod node;
pub mod parser;
mod serialize;

pub use fragment::build_element;
pub use node::{Document, Element, ID_ATTRIBUTE, Node};
