//! Script loaders for bulk population of definitions from archives
//!
//! A script loader declares which file patterns it handles; the group manager
//! finds matching files during group initialisation and hands each stream to
//! the loader. [`CapabilityScriptLoader`] reads render system capability
//! tables:
//!
//! ```text
//! // comment
//! render_system_capabilities "Desktop GL"
//! {
//!     max_texture_size 16384
//!     vertex_program_version vs_5_0
//! }
//! ```

use super::{DataStream, ResourceError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};

/// Parser for a family of definition scripts
pub trait ScriptLoader: Send + Sync {
    /// Wildcard patterns of the files this loader parses
    fn script_patterns(&self) -> Vec<String>;

    /// Parse one script
    fn parse_script(&self, stream: DataStream, name: &str, group: &str) -> Result<(), ResourceError>;

    /// Loaders with a lower value run first
    fn loading_order(&self) -> f32;
}

/// Key/value table parsed from one `render_system_capabilities` block
pub type CapabilityTable = BTreeMap<String, String>;

/// Loads `*.rendercaps` scripts into named capability tables
#[derive(Debug, Default)]
pub struct CapabilityScriptLoader {
    capabilities: RwLock<BTreeMap<String, CapabilityTable>>,
}

enum ParseState {
    Outside,
    ExpectOpen(String),
    Inside(String, CapabilityTable),
}

impl CapabilityScriptLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities parsed under `name`
    pub fn capabilities(&self, name: &str) -> Option<CapabilityTable> {
        self.capabilities.read().get(name).cloned()
    }

    /// Names of all parsed capability sets
    pub fn names(&self) -> Vec<String> {
        self.capabilities.read().keys().cloned().collect()
    }

    fn invalid(script: &str, line_no: usize, message: &str) -> ResourceError {
        ResourceError::InvalidData(format!("{}:{}: {}", script, line_no, message))
    }

    fn parse_header(rest: &str) -> Option<String> {
        let name = rest.trim().trim_matches('"').trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl ScriptLoader for CapabilityScriptLoader {
    fn script_patterns(&self) -> Vec<String> {
        vec!["*.rendercaps".to_string()]
    }

    fn parse_script(&self, stream: DataStream, name: &str, group: &str) -> Result<(), ResourceError> {
        let reader = BufReader::new(stream);
        let mut parsed: Vec<(String, CapabilityTable)> = Vec::new();
        let mut state = ParseState::Outside;
        let mut last_line = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            last_line = line_no;

            let line = line.split("//").next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            state = match state {
                ParseState::Outside => {
                    let rest = line
                        .strip_prefix("render_system_capabilities")
                        .ok_or_else(|| Self::invalid(name, line_no, "expected render_system_capabilities"))?;
                    let caps_name = Self::parse_header(rest)
                        .ok_or_else(|| Self::invalid(name, line_no, "capability set has no name"))?;
                    ParseState::ExpectOpen(caps_name)
                }
                ParseState::ExpectOpen(caps_name) => {
                    if line != "{" {
                        return Err(Self::invalid(name, line_no, "expected '{'"));
                    }
                    ParseState::Inside(caps_name, CapabilityTable::new())
                }
                ParseState::Inside(caps_name, mut table) => {
                    if line == "}" {
                        parsed.push((caps_name, table));
                        ParseState::Outside
                    } else {
                        let mut parts = line.splitn(2, char::is_whitespace);
                        let key = parts.next().unwrap_or_default();
                        let value = parts
                            .next()
                            .map(str::trim)
                            .filter(|v| !v.is_empty())
                            .ok_or_else(|| Self::invalid(name, line_no, "capability has no value"))?;
                        table.insert(key.to_string(), value.to_string());
                        ParseState::Inside(caps_name, table)
                    }
                }
            };
        }

        if !matches!(state, ParseState::Outside) {
            return Err(Self::invalid(name, last_line, "unterminated capability block"));
        }

        let mut capabilities = self.capabilities.write();
        for (caps_name, table) in parsed {
            log::debug!("Parsed capabilities '{}' from '{}' in group '{}'", caps_name, name, group);
            if capabilities.insert(caps_name.clone(), table).is_some() {
                log::warn!("Capabilities '{}' redefined by '{}'", caps_name, name);
            }
        }
        Ok(())
    }

    fn loading_order(&self) -> f32 {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &'static str) -> DataStream {
        Box::new(text.as_bytes())
    }

    #[test]
    fn test_parse_capability_blocks() {
        let loader = CapabilityScriptLoader::new();
        let script = "// desktop\nrender_system_capabilities \"Desktop GL\"\n{\n    max_texture_size 16384\n    vendor Some Vendor\n}\n\nrender_system_capabilities Mobile\n{\n  max_lights 8\n}\n";

        loader.parse_script(stream(script), "gl.rendercaps", "General").unwrap();

        assert_eq!(loader.names(), vec!["Desktop GL", "Mobile"]);
        let desktop = loader.capabilities("Desktop GL").unwrap();
        assert_eq!(desktop.get("max_texture_size").map(String::as_str), Some("16384"));
        assert_eq!(desktop.get("vendor").map(String::as_str), Some("Some Vendor"));
        assert_eq!(loader.capabilities("Mobile").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_scripts_are_rejected_without_side_effects() {
        let loader = CapabilityScriptLoader::new();

        let unterminated = "render_system_capabilities A\n{\n  max_lights 8\n";
        assert!(matches!(
            loader.parse_script(stream(unterminated), "a.rendercaps", "General"),
            Err(ResourceError::InvalidData(_))
        ));

        let missing_brace = "render_system_capabilities B\nmax_lights 8\n";
        assert!(loader.parse_script(stream(missing_brace), "b.rendercaps", "General").is_err());

        assert!(loader.names().is_empty());
    }
}
