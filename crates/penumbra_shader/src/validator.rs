//! Shader validation
//!
//! Runs naga's validator over generated modules, then any custom rules. The
//! soft shadow pipeline installs rules that pin the entry points and the
//! size of the `SoftShadowParams` uniform to the Rust-side record.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

/// Validation error
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Shader validation failed: {0}")]
    ValidationFailed(String),

    #[error("Missing entry point: {0}")]
    MissingEntryPoint(String),

    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),
}

/// Result of shader validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Warnings (non-fatal)
    pub warnings: Vec<String>,
    /// Entry points found
    pub entry_points: Vec<String>,
    /// Binding groups used
    pub binding_groups: Vec<u32>,
}

impl ValidationResult {
    pub fn new(entry_points: Vec<String>, binding_groups: Vec<u32>) -> Self {
        Self {
            warnings: Vec::new(),
            entry_points,
            binding_groups,
        }
    }

    /// Add a warning
    pub fn with_warning(mut self, warning: String) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Shader validator
pub struct ShaderValidator {
    capabilities: Capabilities,
    flags: ValidationFlags,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ShaderValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all(),
            flags: ValidationFlags::all(),
            rules: Vec::new(),
        }
    }

    /// Create a validator with specific capabilities
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::new()
        }
    }

    /// Add a custom validation rule
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Validate a shader module
    pub fn validate(&self, module: &naga::Module) -> Result<ValidationResult, ValidationError> {
        let mut validator = Validator::new(self.flags, self.capabilities);
        validator
            .validate(module)
            .map_err(|e| ValidationError::ValidationFailed(format!("{:?}", e)))?;

        let entry_points = self.entry_point_names(module);
        if entry_points.is_empty() {
            return Err(ValidationError::MissingEntryPoint(
                "No entry points found in shader".to_string(),
            ));
        }

        let mut binding_groups: Vec<u32> = module
            .global_variables
            .iter()
            .filter_map(|(_, gv)| gv.binding.as_ref().map(|b| b.group))
            .collect();
        binding_groups.sort_unstable();
        binding_groups.dedup();

        let mut result = ValidationResult::new(entry_points, binding_groups);
        for rule in &self.rules {
            rule.validate(module)?;
            if let Some(warnings) = rule.warnings(module) {
                for w in warnings {
                    log::warn!("Shader validation warning: {}", w);
                    result = result.with_warning(w);
                }
            }
        }

        Ok(result)
    }

    /// Check if shader has a specific entry point
    pub fn has_entry_point(&self, module: &naga::Module, name: &str) -> bool {
        module.entry_points.iter().any(|ep| ep.name == name)
    }

    /// Get all entry point names
    pub fn entry_point_names(&self, module: &naga::Module) -> Vec<String> {
        module.entry_points.iter().map(|ep| ep.name.clone()).collect()
    }
}

impl Default for ShaderValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom validation rule trait
pub trait ValidationRule: Send + Sync {
    /// Validate the module, return error if invalid
    fn validate(&self, module: &naga::Module) -> Result<(), ValidationError>;

    /// Return any warnings
    fn warnings(&self, _module: &naga::Module) -> Option<Vec<String>> {
        None
    }
}

/// Rule to limit maximum bindings per group
pub struct MaxBindingsRule {
    pub max_bindings: u32,
}

impl ValidationRule for MaxBindingsRule {
    fn validate(&self, module: &naga::Module) -> Result<(), ValidationError> {
        let mut group_counts: std::collections::HashMap<u32, u32> = std::collections::HashMap::new();

        for (_, gv) in module.global_variables.iter() {
            if let Some(binding) = &gv.binding {
                *group_counts.entry(binding.group).or_insert(0) += 1;
            }
        }

        for (group, count) in group_counts {
            if count > self.max_bindings {
                return Err(ValidationError::ResourceLimit(format!(
                    "Binding group {} has {} bindings, max is {}",
                    group, count, self.max_bindings
                )));
            }
        }

        Ok(())
    }
}

/// Rule to require specific entry points
pub struct RequiredEntryPointsRule {
    pub required: Vec<String>,
}

impl ValidationRule for RequiredEntryPointsRule {
    fn validate(&self, module: &naga::Module) -> Result<(), ValidationError> {
        for required in &self.required {
            if !module.entry_points.iter().any(|ep| &ep.name == required) {
                return Err(ValidationError::MissingEntryPoint(required.clone()));
            }
        }
        Ok(())
    }
}

/// Rule pinning the byte size of the struct bound at `group`/`binding`
pub struct UniformSizeRule {
    pub group: u32,
    pub binding: u32,
    pub expected_size: u32,
}

impl ValidationRule for UniformSizeRule {
    fn validate(&self, module: &naga::Module) -> Result<(), ValidationError> {
        let global = module
            .global_variables
            .iter()
            .map(|(_, gv)| gv)
            .find(|gv| {
                gv.binding
                    .as_ref()
                    .is_some_and(|b| b.group == self.group && b.binding == self.binding)
            })
            .ok_or_else(|| {
                ValidationError::InvalidBinding(format!(
                    "No resource bound at group {} binding {}",
                    self.group, self.binding
                ))
            })?;

        match module.types[global.ty].inner {
            naga::TypeInner::Struct { span, .. } if span == self.expected_size => Ok(()),
            naga::TypeInner::Struct { span, .. } => Err(ValidationError::InvalidBinding(format!(
                "Uniform at group {} binding {} is {} bytes, expected {}",
                self.group, self.binding, span, self.expected_size
            ))),
            _ => Err(ValidationError::InvalidBinding(format!(
                "Resource at group {} binding {} is not a struct",
                self.group, self.binding
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use naga::front::wgsl;

    const VALID_SHADER: &str = r#"
        struct Params {
            transform: mat4x4<f32>,
            bias: f32,
        }

        @group(1) @binding(0) var<uniform> params: Params;

        @vertex
        fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
            return params.transform * vec4<f32>(pos, 1.0 - params.bias);
        }
    "#;

    #[test]
    fn test_validate_valid_shader() {
        let module = wgsl::parse_str(VALID_SHADER).unwrap();
        let result = ShaderValidator::new().validate(&module).unwrap();
        assert!(result.entry_points.contains(&"vs_main".to_string()));
        assert_eq!(result.binding_groups, vec![1]);
    }

    #[test]
    fn test_entry_point_detection() {
        let module = wgsl::parse_str(VALID_SHADER).unwrap();
        let validator = ShaderValidator::new();

        assert!(validator.has_entry_point(&module, "vs_main"));
        assert!(!validator.has_entry_point(&module, "nonexistent"));
    }

    #[test]
    fn test_required_entry_point_rule() {
        let module = wgsl::parse_str(VALID_SHADER).unwrap();
        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(RequiredEntryPointsRule {
            required: vec!["fs_main".to_string()],
        }));

        assert!(matches!(
            validator.validate(&module),
            Err(ValidationError::MissingEntryPoint(name)) if name == "fs_main"
        ));
    }

    #[test]
    fn test_uniform_size_rule() {
        let module = wgsl::parse_str(VALID_SHADER).unwrap();

        // mat4x4 (64) + f32 (4), rounded up to 16-byte alignment
        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(UniformSizeRule { group: 1, binding: 0, expected_size: 80 }));
        assert!(validator.validate(&module).is_ok());

        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(UniformSizeRule { group: 1, binding: 0, expected_size: 96 }));
        assert!(matches!(validator.validate(&module), Err(ValidationError::InvalidBinding(_))));

        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(UniformSizeRule { group: 0, binding: 0, expected_size: 80 }));
        assert!(validator.validate(&module).is_err());
    }

    #[test]
    fn test_max_bindings_rule() {
        let module = wgsl::parse_str(VALID_SHADER).unwrap();
        let mut validator = ShaderValidator::new();
        validator.add_rule(Box::new(MaxBindingsRule { max_bindings: 0 }));
        assert!(matches!(validator.validate(&module), Err(ValidationError::ResourceLimit(_))));
    }
}
