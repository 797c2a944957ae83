//! Infrastructure: process wiring, telemetry, embedded assets, provider HTTP
//! clients and the public HTTP surface.

pub mod assets;
pub mod error;
pub mod http;
pub mod providers;
pub mod telemetry;
