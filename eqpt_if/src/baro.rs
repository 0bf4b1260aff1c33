//! # Barometer Interface

/// A barometric pressure sensor.
pub trait Barometer {
    /// Static pressure in hPa, or `None` if the sensor could not be read.
    fn read_pressure_hpa(&mut self) -> Option<f64>;
}
