#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod command_buffer;
pub mod coords;
pub mod correction;
pub mod curve_approx;
pub mod engraver;
pub mod error;
pub mod laser_params;
pub mod link_worker;
pub mod machine_config;
pub mod machine_config_parser;
pub mod polynom;
pub mod record;
pub mod slot_pool;
pub mod trajectory;

pub mod curves {
    pub mod circle;
    pub mod line;
}

pub use engraver::Engraver;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
