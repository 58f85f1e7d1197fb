//! Shader variants and permutations
//!
//! A variant is a named set of defines. The soft shadow generator resolves
//! defines while emitting WGSL, so no preprocessor pass runs over the source.

use std::collections::HashMap;

use penumbra_shadow::ShadowParams;

use crate::compiler::{CompileTarget, CompiledShader, ShaderCompiler};
use crate::generator::{generate_soft_shadow_shader, DEFINE_BLOCKER_SEARCH, DEFINE_HARDWARE_COMPARISON};
use crate::validator::{ShaderValidator, ValidationResult};
use crate::ShaderError;

/// Shader feature define
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderDefine {
    /// Define name
    pub name: String,
    /// Optional value (None = just defined, Some = value)
    pub value: Option<String>,
}

impl ShaderDefine {
    /// Create a simple define (no value)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Create a define with a value
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A set of shader defines representing a variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShaderVariant {
    /// Defines for this variant
    pub defines: Vec<ShaderDefine>,
    /// Variant name/identifier
    pub name: String,
}

impl ShaderVariant {
    /// Create a new variant
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defines: Vec::new(),
        }
    }

    /// Variant matching the sampling path `params` selects.
    ///
    /// The windowed blocker search is always enabled; the center-texel
    /// variant is only reachable through explicit defines.
    pub fn for_params(params: &ShadowParams) -> Self {
        VariantBuilder::new("soft_shadow")
            .with_fixed(DEFINE_HARDWARE_COMPARISON, params.use_hardware_comparison)
            .with_fixed(DEFINE_BLOCKER_SEARCH, true)
            .build()
            .pop()
            .unwrap_or_else(|| Self::new("soft_shadow"))
    }

    /// Add a define
    pub fn with_define(mut self, define: ShaderDefine) -> Self {
        self.defines.push(define);
        self
    }

    /// Add multiple defines
    pub fn with_defines(mut self, defines: Vec<ShaderDefine>) -> Self {
        self.defines.extend(defines);
        self
    }

    /// Whether `name` is defined in this variant
    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.iter().any(|d| d.name == name)
    }

    /// Value of `name`, if defined with one
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|d| d.name == name)
            .and_then(|d| d.value.as_deref())
    }
}

/// A generated, parsed and validated variant
#[derive(Debug, Clone)]
pub struct SoftShadowModule {
    pub variant: ShaderVariant,
    /// Generated WGSL
    pub source: String,
    pub module: naga::Module,
    pub validation: ValidationResult,
    /// Backend outputs keyed by target
    pub compiled: HashMap<CompileTarget, CompiledShader>,
}

/// Shader variant collection
pub struct ShaderVariantCollection {
    /// Variants to compile
    variants: Vec<ShaderVariant>,
    /// Compiled variants cache
    compiled: HashMap<String, SoftShadowModule>,
}

impl ShaderVariantCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            variants: Vec::new(),
            compiled: HashMap::new(),
        }
    }

    /// Collection holding every soft shadow permutation
    pub fn all_soft_shadow() -> Self {
        let mut collection = Self::new();
        for variant in VariantBuilder::new("soft_shadow")
            .with_feature(DEFINE_HARDWARE_COMPARISON)
            .with_feature(DEFINE_BLOCKER_SEARCH)
            .build()
        {
            collection.add_variant(variant);
        }
        collection
    }

    /// Add a variant
    pub fn add_variant(&mut self, variant: ShaderVariant) {
        self.variants.push(variant);
    }

    /// Get all variant names
    pub fn variant_names(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.name.clone()).collect()
    }

    /// Generate, validate and compile all variants for all targets
    pub fn compile_all(
        &mut self,
        compiler: &ShaderCompiler,
        validator: &ShaderValidator,
        targets: &[CompileTarget],
    ) -> Result<(), ShaderError> {
        for variant in &self.variants {
            let source = generate_soft_shadow_shader(variant);
            let module = compiler.parse_wgsl(&source)?;
            let validation = validator.validate(&module)?;

            let mut compiled = HashMap::new();
            for &target in targets {
                compiled.insert(target, compiler.compile(&module, target)?);
            }

            log::debug!(
                "Compiled soft shadow variant '{}' ({} targets)",
                variant.name,
                compiled.len()
            );
            self.compiled.insert(
                variant.name.clone(),
                SoftShadowModule {
                    variant: variant.clone(),
                    source,
                    module,
                    validation,
                    compiled,
                },
            );
        }

        Ok(())
    }

    /// Get compiled variant
    pub fn get_variant(&self, variant_name: &str) -> Option<&SoftShadowModule> {
        self.compiled.get(variant_name)
    }

    /// Get one backend output of a compiled variant
    pub fn get_compiled(&self, variant_name: &str, target: CompileTarget) -> Option<&CompiledShader> {
        self.compiled
            .get(variant_name)
            .and_then(|module| module.compiled.get(&target))
    }

    /// Check if variant exists
    pub fn has_variant(&self, variant_name: &str) -> bool {
        self.variants.iter().any(|v| v.name == variant_name)
    }

    /// Get total number of compiled shaders
    pub fn compiled_count(&self) -> usize {
        self.compiled.values().map(|m| m.compiled.len()).sum()
    }
}

impl Default for ShaderVariantCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant builder for common patterns
pub struct VariantBuilder {
    base_name: String,
    feature_flags: Vec<(String, Vec<bool>)>,
}

impl VariantBuilder {
    /// Create a new builder
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            feature_flags: Vec::new(),
        }
    }

    /// Add a feature flag (on/off)
    pub fn with_feature(mut self, feature_name: impl Into<String>) -> Self {
        self.feature_flags.push((feature_name.into(), vec![false, true]));
        self
    }

    /// Add a feature pinned to one state
    pub fn with_fixed(mut self, feature_name: impl Into<String>, enabled: bool) -> Self {
        self.feature_flags.push((feature_name.into(), vec![enabled]));
        self
    }

    /// Build all permutations
    pub fn build(self) -> Vec<ShaderVariant> {
        if self.feature_flags.is_empty() {
            return vec![ShaderVariant::new(self.base_name)];
        }

        let mut variants = Vec::new();
        let total_permutations = self.feature_flags.iter()
            .map(|(_, values)| values.len())
            .product();

        for i in 0..total_permutations {
            let mut defines = Vec::new();
            let mut name_parts = vec![self.base_name.clone()];
            let mut idx = i;

            for (feature_name, values) in &self.feature_flags {
                let value_idx = idx % values.len();
                idx /= values.len();

                if values[value_idx] {
                    defines.push(ShaderDefine::new(feature_name.clone()));
                    name_parts.push(feature_name.to_lowercase());
                }
            }

            variants.push(ShaderVariant::new(name_parts.join("_")).with_defines(defines));
        }

        variants
    }
}
