//! Concrete resource payloads and their factories

mod mesh;
mod program;

pub use mesh::{MeshData, MeshFactory};
pub use program::{ProgramFactory, ProgramSource};
