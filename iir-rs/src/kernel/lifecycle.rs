use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
///
/// Every check a config can fail happens here, so `run_*` entrypoints only
/// fail on numerical grounds.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
