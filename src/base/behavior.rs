use std::sync::Arc;

/// Per-cycle behaviors common to all simulated hardware modules.
pub trait ModuleBehaviors {
    /// Advance the module by one clock cycle.
    fn tick_one(&mut self);

    /// Return the module to its post-reset state.
    fn reset(&mut self) {}
}

/// A module that is constructed from a config struct shared across the core.
pub trait Parameterizable {
    type ConfigType;

    fn conf(&self) -> &Self::ConfigType;

    fn init_conf(&mut self, conf: Arc<Self::ConfigType>);
}
