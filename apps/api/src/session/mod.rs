// Per-user session state: credential, inputs, phase and results.
// Sessions live in memory only and are never shared.

pub mod handlers;
pub mod machine;
pub mod registry;
