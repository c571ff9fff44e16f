use serde::Deserialize;

/// Knobs that shape result-set mapping.
///
/// Fixed for one remote call: the client attaches a copy to every
/// [`ResultSet`](crate::result::ResultSet) it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Correlate columns by label instead of physical name.
    pub use_label_for_mapping: bool,
    /// Skip columns that have no setter or field on the target.
    pub ignore_missing_setters: bool,
}

impl MappingOptions {
    pub const DEFAULT: MappingOptions = MappingOptions {
        use_label_for_mapping: false,
        ignore_missing_setters: false,
    };

    pub fn with_use_label_for_mapping(mut self, value: bool) -> Self {
        self.use_label_for_mapping = value;
        self
    }

    pub fn with_ignore_missing_setters(mut self, value: bool) -> Self {
        self.ignore_missing_setters = value;
        self
    }
}
