//! Closed-form IWV estimates from surface temperature and relative humidity.

use thiserror::Error;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Coldest surface temperature accepted by the formulas, in °C.
pub const MIN_SURFACE_TEMP_C: f64 = -100.0;

/// Magnus coefficients for saturation vapour pressure over water, in hPa.
const MAGNUS_E0: f64 = 6.112;
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

/// Empirical constant of the Magnus model, in kg/m³ per hPa/K.
pub const IWV_CONSTANT: f64 = 1.3227 / MAGNUS_E0;

/// Mass of a water molecule in kg.
const MASS_H2O: f64 = 1.660_538_86e-27 * 18.0;
/// Boltzmann constant in J/K.
const BOLTZMANN: f64 = 1.380_650_3e-23;

#[derive(Debug, Error, PartialEq)]
pub enum FormulaError {
    #[error("relative humidity {0} is outside [0, 100]")]
    HumidityOutOfRange(f64),
    #[error("absolute temperature {0} K is not positive")]
    NonPositiveTemperature(f64),
    #[error("surface temperature {0} °C is below the supported range")]
    TemperatureOutOfRange(f64),
    #[error("non finite input")]
    NonFinite,
}

/// How the IWV is derived from the surface measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IwvMethod {
    /// Saturation pressure from the Magnus formula, scaled by humidity.
    #[default]
    Magnus,
    /// Vapour pressure derived from the dew point (40M receiver model).
    DewPoint,
}

impl IwvMethod {
    pub fn iwv(&self, temp_c: f64, humidity: f64, h_factor: f64) -> Result<f64, FormulaError> {
        match self {
            IwvMethod::Magnus => iwv(temp_c, humidity, h_factor),
            IwvMethod::DewPoint => iwv_from_dew_point(temp_c, humidity, h_factor),
        }
    }
}

/// Checks that a (temperature, humidity) pair is inside the domain of the
/// formulas and returns the absolute temperature.
pub fn validate(temp_c: f64, humidity: f64) -> Result<f64, FormulaError> {
    if !temp_c.is_finite() || !humidity.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    if !(0.0..=100.0).contains(&humidity) {
        return Err(FormulaError::HumidityOutOfRange(humidity));
    }
    let t_abs = temp_c + KELVIN_OFFSET;
    if t_abs <= 0.0 {
        return Err(FormulaError::NonPositiveTemperature(t_abs));
    }
    if temp_c < MIN_SURFACE_TEMP_C {
        return Err(FormulaError::TemperatureOutOfRange(temp_c));
    }

    Ok(t_abs)
}

/// Saturation vapour pressure in hPa.
pub fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    MAGNUS_E0 * (MAGNUS_A * temp_c / (temp_c + MAGNUS_B)).exp()
}

/// Partial pressure of water vapour in hPa.
pub fn vapor_pressure(temp_c: f64, humidity: f64) -> f64 {
    saturation_vapor_pressure(temp_c) * humidity / 100.0
}

/// IWV in mm, for an effective water vapour scale height `h_factor` in metres.
pub fn iwv(temp_c: f64, humidity: f64, h_factor: f64) -> Result<f64, FormulaError> {
    let t_abs = validate(temp_c, humidity)?;
    let e = vapor_pressure(temp_c, humidity);

    Ok(IWV_CONSTANT * h_factor * e / t_abs)
}

/// Dew point temperature in °C.
pub fn dew_point(temp_c: f64, humidity: f64) -> Result<f64, FormulaError> {
    validate(temp_c, humidity)?;
    let a = 17.62;
    let b = 243.12;

    // log(0) guard
    let humidity = humidity.max(0.01);
    let alpha = (a * temp_c) / (b + temp_c) + (humidity / 100.0).ln();

    Ok(b * alpha / (a - alpha))
}

/// IWV in mm from the water vapour partial pressure at the dew point.
pub fn iwv_from_dew_point(temp_c: f64, humidity: f64, h_factor: f64) -> Result<f64, FormulaError> {
    let t_abs = validate(temp_c, humidity)?;
    let t_dew = dew_point(temp_c, humidity)?;

    let p_mbar = (1.81 + 17.27 * t_dew / (t_dew + 237.15)).exp();
    let p_pa = p_mbar * 100.0;

    Ok(MASS_H2O * p_pa * h_factor / (BOLTZMANN * t_abs))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_compute_saturation_pressure() {
        assert!((saturation_vapor_pressure(0.0) - 6.112).abs() < 1e-9);
        // ~17 hPa at 15 °C
        let es = saturation_vapor_pressure(15.0);
        assert!(es > 16.9 && es < 17.2, "{}", es);
    }

    #[test]
    fn should_compute_iwv() {
        let value = iwv(15.0, 50.0, 2000.0).unwrap();
        let expected = 1.3227e-2 * (17.27_f64 * 15.0 / 252.7).exp() / (15.0 + 273.15) * 50.0 * 2000.0;

        assert!((value - expected).abs() < 1e-9);
        assert!(value > 12.0 && value < 14.0, "{}", value);
    }

    #[test]
    fn should_be_zero_when_dry() {
        assert_eq!(iwv(20.0, 0.0, 2000.0).unwrap(), 0.0);
    }

    #[test]
    fn should_be_finite_and_non_negative_on_domain() {
        for temp in [-100.0, -60.0, -20.0, 0.0, 12.5, 35.0, 50.0] {
            for hum in [0.0, 0.5, 25.0, 50.0, 99.9, 100.0] {
                for method in [IwvMethod::Magnus, IwvMethod::DewPoint] {
                    let value = method.iwv(temp, hum, 2000.0).unwrap();
                    assert!(value.is_finite() && value >= 0.0, "{} {} {}", temp, hum, value);
                }
            }
        }
    }

    #[test]
    fn should_reject_out_of_range_inputs() {
        assert_eq!(
            iwv(15.0, 101.0, 2000.0),
            Err(FormulaError::HumidityOutOfRange(101.0))
        );
        assert_eq!(
            iwv(15.0, -1.0, 2000.0),
            Err(FormulaError::HumidityOutOfRange(-1.0))
        );
        assert!(matches!(
            iwv(-300.0, 50.0, 2000.0),
            Err(FormulaError::NonPositiveTemperature(_))
        ));
        assert_eq!(
            iwv(-150.0, 50.0, 2000.0),
            Err(FormulaError::TemperatureOutOfRange(-150.0))
        );
        assert_eq!(iwv(f64::NAN, 50.0, 2000.0), Err(FormulaError::NonFinite));
    }

    #[test]
    fn should_match_temperature_at_saturation() {
        let td = dew_point(10.0, 100.0).unwrap();
        assert!((td - 10.0).abs() < 1e-9);
        assert!(dew_point(10.0, 50.0).unwrap() < 10.0);
    }
}
