//! Build configuration: extra options appended to every request.

use std::env;

use kiln_types::Phase;
use serde::{Deserialize, Serialize};

pub const EXTRA_BUILD_OPTIONS_VAR: &str = "KILN_EXTRA_BUILD_OPTIONS";
pub const EXTRA_COMPILE_OPTIONS_VAR: &str = "KILN_EXTRA_COMPILE_OPTIONS";
pub const EXTRA_LINK_OPTIONS_VAR: &str = "KILN_EXTRA_LINK_OPTIONS";

/// Options appended to the caller's options for each entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub extra_build_options: String,
    pub extra_compile_options: String,
    pub extra_link_options: String,
}

impl BuildConfig {
    /// Read the extra options from the environment. Unset variables are empty.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        Self {
            extra_build_options: var(EXTRA_BUILD_OPTIONS_VAR),
            extra_compile_options: var(EXTRA_COMPILE_OPTIONS_VAR),
            extra_link_options: var(EXTRA_LINK_OPTIONS_VAR),
        }
    }

    pub fn extra(&self, phase: Phase) -> &str {
        match phase {
            Phase::Build => &self.extra_build_options,
            Phase::Compile => &self.extra_compile_options,
            Phase::Link => &self.extra_link_options,
        }
    }

    /// The options string handed to the toolchain: the caller's options, a
    /// space, then the configured extras.
    pub fn options(&self, phase: Phase, user: Option<&str>) -> String {
        format!("{} {}", user.unwrap_or(""), self.extra(phase))
    }
}
