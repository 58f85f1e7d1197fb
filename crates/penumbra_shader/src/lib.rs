//! # penumbra_shader
//!
//! GPU rendition of the soft shadow evaluator:
//! - WGSL generation for the soft shadow pass, one module per variant
//! - WGSL parsing and validation via naga
//! - Layout checks tying the `SoftShadowParams` uniform to
//!   [`GpuSoftShadowParams`]
//! - SPIR-V and WGSL output for renderers
//!
//! ## Architecture
//!
//! ```text
//! ShadowParams ──► ShaderVariant ──► generator ──► WGSL ──► naga::Module ──► Validator ──► Compiler
//!                   (defines)                                                   │
//!                                                                               ▼
//!                                                                     entry points, bindings
//! ```

pub mod compiler;
pub mod generator;
pub mod validator;
pub mod variants;

pub use compiler::{CompileTarget, CompiledShader, ShaderCompiler};
pub use generator::{
    generate_soft_shadow_shader, DEFINE_BLOCKER_SEARCH, DEFINE_HARDWARE_COMPARISON,
    FRAGMENT_ENTRY_POINT, SHADOW_BIND_GROUP, SHADOW_PARAMS_BINDING, VERTEX_ENTRY_POINT,
};
pub use validator::{
    MaxBindingsRule, RequiredEntryPointsRule, ShaderValidator, UniformSizeRule, ValidationError,
    ValidationResult, ValidationRule,
};
pub use variants::{
    ShaderDefine, ShaderVariant, ShaderVariantCollection, SoftShadowModule, VariantBuilder,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use penumbra_shadow::{GpuSoftShadowParams, ShadowParams};
use thiserror::Error;

/// Errors from the shader pipeline
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to write shader file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("WGSL parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Compilation error: {0}")]
    Compile(String),
}

/// Soft shadow shader pipeline configuration
#[derive(Debug, Clone)]
pub struct SoftShadowPipelineConfig {
    /// Backends to emit for every variant
    pub targets: Vec<CompileTarget>,
    /// Maximum bindings allowed per group
    pub max_bindings_per_group: u32,
}

impl Default for SoftShadowPipelineConfig {
    fn default() -> Self {
        Self {
            targets: vec![CompileTarget::SpirV],
            max_bindings_per_group: 4,
        }
    }
}

/// Generates, validates and caches soft shadow shader variants
pub struct SoftShadowPipeline {
    config: SoftShadowPipelineConfig,
    compiler: ShaderCompiler,
    validator: ShaderValidator,
    modules: HashMap<String, SoftShadowModule>,
}

impl SoftShadowPipeline {
    pub fn new(config: SoftShadowPipelineConfig) -> Self {
        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(RequiredEntryPointsRule {
            required: vec![VERTEX_ENTRY_POINT.to_string(), FRAGMENT_ENTRY_POINT.to_string()],
        }));
        validator.add_rule(Box::new(UniformSizeRule {
            group: SHADOW_BIND_GROUP,
            binding: SHADOW_PARAMS_BINDING,
            expected_size: GpuSoftShadowParams::SIZE as u32,
        }));
        validator.add_rule(Box::new(MaxBindingsRule {
            max_bindings: config.max_bindings_per_group,
        }));

        Self {
            config,
            compiler: ShaderCompiler::new(),
            validator,
            modules: HashMap::new(),
        }
    }

    /// Module for the variant `params` selects, built on first use
    pub fn module_for_params(&mut self, params: &ShadowParams) -> Result<&SoftShadowModule, ShaderError> {
        self.module_for_variant(&ShaderVariant::for_params(params))
    }

    /// Module for `variant`, built on first use
    pub fn module_for_variant(&mut self, variant: &ShaderVariant) -> Result<&SoftShadowModule, ShaderError> {
        if !self.modules.contains_key(&variant.name) {
            let module = self.build(variant)?;
            self.modules.insert(variant.name.clone(), module);
        }
        self.modules
            .get(&variant.name)
            .ok_or_else(|| ShaderError::Compile(format!("variant '{}' missing after build", variant.name)))
    }

    /// Build every permutation of the soft shadow defines
    pub fn build_all(&mut self) -> Result<Vec<String>, ShaderError> {
        let mut collection = ShaderVariantCollection::all_soft_shadow();
        collection.compile_all(&self.compiler, &self.validator, &self.config.targets)?;

        let names = collection.variant_names();
        for name in &names {
            if let Some(module) = collection.get_variant(name) {
                self.modules.insert(name.clone(), module.clone());
            }
        }
        log::info!("Built {} soft shadow shader variants", names.len());
        Ok(names)
    }

    /// Write every cached variant's WGSL to `dir/<variant>.wgsl`
    pub fn export_wgsl(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ShaderError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut names: Vec<&String> = self.modules.keys().collect();
        names.sort();

        let mut written = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(format!("{}.wgsl", name));
            std::fs::write(&path, &self.modules[name].source)?;
            log::debug!("Exported soft shadow variant '{}' to {}", name, path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Number of cached variants
    pub fn cached_count(&self) -> usize {
        self.modules.len()
    }

    pub fn validator(&self) -> &ShaderValidator {
        &self.validator
    }

    pub fn compiler(&self) -> &ShaderCompiler {
        &self.compiler
    }

    fn build(&self, variant: &ShaderVariant) -> Result<SoftShadowModule, ShaderError> {
        let source = generate_soft_shadow_shader(variant);
        let module = self.compiler.parse_wgsl(&source)?;
        let validation = self.validator.validate(&module)?;

        let mut compiled = HashMap::new();
        for &target in &self.config.targets {
            compiled.insert(target, self.compiler.compile(&module, target)?);
        }

        log::debug!("Generated soft shadow variant '{}' ({} bytes of WGSL)", variant.name, source.len());
        Ok(SoftShadowModule {
            variant: variant.clone(),
            source,
            module,
            validation,
            compiled,
        })
    }
}

impl Default for SoftShadowPipeline {
    fn default() -> Self {
        Self::new(SoftShadowPipelineConfig::default())
    }
}
