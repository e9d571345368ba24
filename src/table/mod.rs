//! Handles loading and saving data to disk in the CSV file format.

pub mod meteo;
pub mod pwv;
pub mod series;

pub use meteo::{load_meteo, MeteoWriter};
pub use pwv::save_pwv;
pub use series::{load_series, save_series};
