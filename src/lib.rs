// Library root
// -----------
// The binary (`main.rs`) is a thin wrapper over these modules.
//
// Module responsibilities:
// - `settings`: the JSON settings record at `~/.gobeat` and its
//   load / default-filling / atomic save.
// - `api`: posts a match result to the configured endpoint.
// - `cli`: clap definitions for the `target`, `user` and `result` commands.
// - `commands`: runs a parsed command against settings and the API client.
pub mod api;
pub mod cli;
pub mod commands;
pub mod settings;
