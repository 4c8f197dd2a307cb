//! Layer composition for configuration tests.

use ortho_config::MergeComposer;
use serde_json::Value;

use crate::OrgActivityConfig;

/// Configuration source, lowest precedence first.
#[derive(Debug, Clone, Copy)]
pub enum Layer {
    Defaults,
    File,
    Environment,
    Cli,
}

/// Merges `(layer, value)` pairs into an [`OrgActivityConfig`] in the given
/// order.
pub fn merge_layers(layers: &[(Layer, Value)]) -> OrgActivityConfig {
    let mut composer = MergeComposer::new();
    for (layer, value) in layers {
        let owned = value.clone();
        match layer {
            Layer::Defaults => composer.push_defaults(owned),
            Layer::File => composer.push_file(owned, None),
            Layer::Environment => composer.push_environment(owned),
            Layer::Cli => composer.push_cli(owned),
        }
    }
    OrgActivityConfig::merge_from_layers(composer.layers()).expect("merge should succeed")
}
