pub mod bootstrap;
pub mod logging;
