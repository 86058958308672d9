//! Post-bundler build artifacts: the hidden SVG icon sprite,
//! subresource-integrity hashes and the `entrypoints.json` manifest
//! page templates consume.

pub mod integrity;
pub mod manifest;
pub mod sprite;
