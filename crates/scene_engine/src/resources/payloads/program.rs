//! GPU program source payload
//!
//! Holds program text only; compilation belongs to the render system.

use crate::resources::{ResourceError, ResourceFactory, ResourceParams, ResourcePayload};
use std::any::Any;
use std::io::Read;

/// Program source text
#[derive(Debug, Clone, Default)]
pub struct ProgramSource {
    source: String,
}

impl ProgramSource {
    /// Type name used by the program manager
    pub const RESOURCE_TYPE: &'static str = "GpuProgram";

    /// Loaded source text (empty when unloaded)
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ResourcePayload for ProgramSource {
    fn load_from_stream(&mut self, stream: &mut dyn Read) -> Result<(), ResourceError> {
        let mut source = String::new();
        stream.read_to_string(&mut source).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                ResourceError::InvalidData(format!("program source is not UTF-8 text: {}", e))
            }
            _ => ResourceError::Io(e),
        })?;
        self.source = source;
        Ok(())
    }

    fn unload(&mut self) {
        self.source = String::new();
    }

    fn size(&self) -> usize {
        self.source.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Factory for [`ProgramSource`] payloads
#[derive(Debug, Default)]
pub struct ProgramFactory;

impl ResourceFactory for ProgramFactory {
    fn create(&self, _params: &ResourceParams<'_>) -> Result<Box<dyn ResourcePayload>, ResourceError> {
        Ok(Box::new(ProgramSource::default()))
    }
}
