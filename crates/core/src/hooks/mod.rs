//! Hook points and generated output fragments
//!
//! A hook is a named extension point inside a wrapper's fixed generation
//! sequence. Each binding layer defines its own hook catalog as an enum
//! implementing [`Hook`].

pub mod composer;

use std::fmt;

pub use composer::HookComposer;

/// A named extension point of a binding layer.
pub trait Hook: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Name used in debug output and task introspection.
    fn name(self) -> &'static str;

    /// Every hook of the layer, in generation order.
    fn all() -> &'static [Self];
}

/// Formats a debug message into a target-language comment.
///
/// Returning an empty string suppresses the message.
pub type DebugFormatter = fn(&str) -> String;

/// Flat, ordered sequence of generated text fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    parts: Vec<String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.is_empty() {
            self.parts.push(fragment);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn concat(&self) -> String {
        self.parts.concat()
    }
}

impl fmt::Display for Fragments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            f.write_str(part)?;
        }
        Ok(())
    }
}

impl From<Fragments> for String {
    fn from(value: Fragments) -> Self {
        value.parts.concat()
    }
}
