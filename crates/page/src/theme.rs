use std::collections::HashMap;
use std::fmt;

use html::{Dom, DomError, DomResult};

pub const THEME_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    /// Unknown values read as `System`.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "light" => ThemePreference::Light,
            "dark" => ThemePreference::Dark,
            _ => ThemePreference::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn is_dark(self, prefers_dark: bool) -> bool {
        match self {
            ThemePreference::Light => false,
            ThemePreference::Dark => true,
            ThemePreference::System => prefers_dark,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable client-side key/value storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

pub fn load_theme(storage: &dyn Storage) -> ThemePreference {
    storage
        .get(THEME_KEY)
        .map(|v| ThemePreference::from_token(&v))
        .unwrap_or_default()
}

/// Toggle the `dark` class on the document element.
pub fn apply_theme(dom: &mut Dom, pref: ThemePreference, prefers_dark: bool) -> DomResult<()> {
    let root = dom.document_element().ok_or(DomError::NoBody)?;
    if pref.is_dark(prefers_dark) {
        dom.add_classes(root, &["dark"])
    } else {
        dom.remove_classes(root, &["dark"])
    }
}

pub fn set_theme(
    storage: &mut dyn Storage,
    dom: &mut Dom,
    pref: ThemePreference,
    prefers_dark: bool,
) -> DomResult<()> {
    storage.set(THEME_KEY, pref.as_str());
    apply_theme(dom, pref, prefers_dark)
}
