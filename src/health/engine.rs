use super::context::AuditContext;
use super::types::{CheckResult, DimensionReport};

/// Trait for implementing health dimensions
pub trait Dimension: Send + Sync {
    /// Unique identifier for the dimension
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// One-line summary of what the dimension covers
    fn description(&self) -> &'static str;

    /// Evaluate the dimension against the audit context
    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult>;
}

/// Registry for managing and running dimensions
#[derive(Default)]
pub struct DimensionRegistry {
    dimensions: Vec<Box<dyn Dimension>>,
}

impl DimensionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six standard dimensions, in report order
    pub fn with_default_dimensions() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::DataIntegrity));
        registry.register(Box::new(super::DocumentConsistency));
        registry.register(Box::new(super::Structure));
        registry.register(Box::new(super::Freshness));
        registry.register(Box::new(super::Quality));
        registry.register(Box::new(super::AntiCorruption));
        registry
    }

    /// Register a dimension
    pub fn register(&mut self, dimension: Box<dyn Dimension>) {
        self.dimensions.push(dimension);
    }

    /// Evaluate every dimension against the context
    pub fn evaluate_all(&self, ctx: &AuditContext) -> Vec<DimensionReport> {
        self.dimensions
            .iter()
            .map(|d| DimensionReport {
                dimension: d.name().to_string(),
                description: d.description().to_string(),
                checks: d.evaluate(ctx),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Get list of registered dimension IDs
    pub fn dimension_ids(&self) -> Vec<&'static str> {
        self.dimensions.iter().map(|d| d.id()).collect()
    }
}
