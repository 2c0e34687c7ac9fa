use crate::error::CvError;

/// An enum that scripts select by name from a fixed table.
///
/// Lookups are exact and case-sensitive, and an unknown name is an error
/// rather than a fallback to some default.
pub trait NamedOption: Copy + PartialEq + Sized + 'static {
    /// What the option names, used in error messages ("depth", "property").
    const KIND: &'static str;

    /// The full `(name, value)` table.
    const OPTIONS: &'static [(&'static str, Self)];

    fn from_name(name: &str) -> Result<Self, CvError> {
        Self::OPTIONS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| CvError::UnknownOption {
                kind: Self::KIND,
                value: name.to_owned(),
            })
    }

    fn name(self) -> &'static str {
        Self::OPTIONS
            .iter()
            .find(|(_, value)| *value == self)
            .map_or("?", |(name, _)| name)
    }

    fn names() -> Vec<&'static str> {
        Self::OPTIONS.iter().map(|(name, _)| *name).collect()
    }
}
