/*
[INPUT]:  Configuration and wallet signer from the binary
[OUTPUT]: Config types and console callbacks for the sign-in runner
[POS]:    Library root of the CLI crate
[UPDATE]: When adding CLI modules
*/

pub mod config;
pub mod handler;

pub use config::{CliConfig, VerifierConfig, VerifierMode};
pub use handler::{ConsoleHandler, failure_summary};
