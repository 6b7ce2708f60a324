// Front ends. Each one only translates between its transport and the
// knowledge service in core.

#[path = "cli.rs"]
pub mod cli;

#[path = "http.rs"]
pub mod http;
