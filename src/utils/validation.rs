//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y normalización de matrículas.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    /// Matrícula: letras y números, con guiones o espacios intermedios
    pub static ref PLATE_NUMBER_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,13}[A-Za-z0-9]$").unwrap();
}

/// Normalizar matrícula: mayúsculas y sin espacios en los extremos
pub fn normalize_plate(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Validar que un odómetro no sea negativo
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea estrictamente positivo
pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Los odómetros se guardan como NUMERIC(12, 1): 11 dígitos enteros y un decimal
pub const ODOMETER_MAX_SCALE: u32 = 1;
pub const ODOMETER_LIMIT: i64 = 100_000_000_000;

/// La lectura cabe en la columna sin redondeo ni desbordamiento
pub fn fits_odometer_column(value: &Decimal) -> bool {
    value.normalize().scale() <= ODOMETER_MAX_SCALE && value.abs() < Decimal::from(ODOMETER_LIMIT)
}

fn check_odometer_column(value: &Decimal) -> Result<(), ValidationError> {
    if !fits_odometer_column(value) {
        let mut error = ValidationError::new("odometer_precision");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Odómetro de registro: no negativo y representable
pub fn validate_odometer(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    check_odometer_column(value)
}

/// Intervalo de cambio de aceite: positivo y representable
pub fn validate_oil_change_interval(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(value)?;
    check_odometer_column(value)
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_number_format() {
        assert!(PLATE_NUMBER_RE.is_match("ABC-1234"));
        assert!(PLATE_NUMBER_RE.is_match("NBC 4521"));
        assert!(!PLATE_NUMBER_RE.is_match("-ABC"));
        assert!(!PLATE_NUMBER_RE.is_match("A"));
        assert!(!PLATE_NUMBER_RE.is_match("ABC_1234"));
    }

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("  abc-1234 "), "ABC-1234");
    }

    #[test]
    fn test_decimal_validators() {
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative(&Decimal::from(-1)).is_err());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::from(5000)).is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_odometer_must_fit_column() {
        assert!(fits_odometer_column(&Decimal::new(10002, 1)));
        // Ceros finales no cuentan como decimales
        assert!(fits_odometer_column(&Decimal::new(100050, 2)));
        assert!(!fits_odometer_column(&Decimal::new(100025, 2)));
        assert!(fits_odometer_column(&Decimal::from(99_999_999_999i64)));
        assert!(!fits_odometer_column(&Decimal::from(ODOMETER_LIMIT)));

        assert!(validate_odometer(&Decimal::new(100025, 2)).is_err());
        assert!(validate_odometer(&Decimal::from(-1)).is_err());
        assert!(validate_oil_change_interval(&Decimal::ZERO).is_err());
        assert!(validate_oil_change_interval(&Decimal::new(50005, 2)).is_err());
        assert!(validate_oil_change_interval(&Decimal::from(5000)).is_ok());
    }
}
