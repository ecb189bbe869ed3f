//! Locale dictionary and display formatting shared by the state and map modules.

pub mod format;
pub mod i18n;
