//! Unit tests for configuration loading, precedence, and derived settings.

mod derived_settings;
mod helpers;
