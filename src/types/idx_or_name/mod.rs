use std::fmt::Display;

/// A workbook or worksheet index or name.
///
/// Indices are 0-based positions in the host's collection.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum IdxOrName {
    Idx(usize),
    Name(String),
}

impl IdxOrName {
    pub(crate) fn format_message(&self) -> String {
        match self {
            Self::Idx(idx) => format!("at index {idx}"),
            Self::Name(name) => format!("with name \"{name}\""),
        }
    }

    /// Finds the position of this index or name among `names`.
    pub(crate) fn position_in<S: AsRef<str>>(&self, names: &[S]) -> Option<usize> {
        match self {
            Self::Idx(idx) => (*idx < names.len()).then_some(*idx),
            Self::Name(name) => names.iter().position(|n| n.as_ref() == name),
        }
    }
}

impl Display for IdxOrName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idx(idx) => write!(f, "#{idx}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for IdxOrName {
    fn from(index: usize) -> Self {
        Self::Idx(index)
    }
}

impl From<String> for IdxOrName {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&str> for IdxOrName {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}
