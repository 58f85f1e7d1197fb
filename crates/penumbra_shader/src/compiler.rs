//! Shader compilation using naga
//!
//! Parses generated WGSL and re-emits validated modules for the backends a
//! renderer may consume: SPIR-V words or normalized WGSL.

use naga::back::spv;
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::ShaderError;

/// Compilation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileTarget {
    /// SPIR-V bytecode
    SpirV,
    /// WGSL (WebGPU), as written back by naga
    Wgsl,
}

/// Compiled shader output
#[derive(Debug, Clone)]
pub enum CompiledShader {
    /// SPIR-V words
    SpirV(Vec<u32>),
    /// WGSL source
    Wgsl(String),
}

impl CompiledShader {
    /// Get as SPIR-V words
    pub fn as_spirv(&self) -> Option<&[u32]> {
        match self {
            Self::SpirV(words) => Some(words),
            _ => None,
        }
    }

    /// Get as WGSL source
    pub fn as_wgsl(&self) -> Option<&str> {
        match self {
            Self::Wgsl(source) => Some(source),
            _ => None,
        }
    }

    /// Get size in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::SpirV(words) => words.len() * 4,
            Self::Wgsl(source) => source.len(),
        }
    }
}

/// Shader compiler
#[derive(Debug, Default)]
pub struct ShaderCompiler;

impl ShaderCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse WGSL source into a naga module
    pub fn parse_wgsl(&self, source: &str) -> Result<naga::Module, ShaderError> {
        wgsl::parse_str(source).map_err(|e| ShaderError::Parse(e.emit_to_string(source)))
    }

    /// Compile a module to the specified target
    pub fn compile(&self, module: &naga::Module, target: CompileTarget) -> Result<CompiledShader, ShaderError> {
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        let info = validator
            .validate(module)
            .map_err(|e| ShaderError::Compile(format!("Validation failed: {:?}", e)))?;

        match target {
            CompileTarget::SpirV => {
                let words = spv::write_vec(module, &info, &spv::Options::default(), None)
                    .map_err(|e| ShaderError::Compile(format!("SPIR-V compilation failed: {:?}", e)))?;
                Ok(CompiledShader::SpirV(words))
            }
            CompileTarget::Wgsl => {
                let source = naga::back::wgsl::write_string(module, &info, naga::back::wgsl::WriterFlags::empty())
                    .map_err(|e| ShaderError::Compile(format!("WGSL compilation failed: {:?}", e)))?;
                Ok(CompiledShader::Wgsl(source))
            }
        }
    }
}
