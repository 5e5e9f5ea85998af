// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive client.
//
// Module responsibilities:
// - `api`: blocking HTTP calls to the snapsecounter service and the
//   `DrinkApi` trait the session is written against.
// - `models`: serde shapes of events, users and drink records.
// - `ui`: line-based console input/output.
// - `chooser`: numbered selection prompt with shortcut keys.
// - `chart`: cumulative drinks chart rendered to text.
// - `session`: the login / event / tracking loop.
// - `cli`: command-line flags and logging setup.
pub mod api;
pub mod chart;
pub mod chooser;
pub mod cli;
pub mod models;
pub mod session;
pub mod ui;
