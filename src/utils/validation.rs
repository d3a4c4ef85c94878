use crate::utils::error::{GatePassError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn config_error(field_name: &str, message: String) -> GatePassError {
    GatePassError::ConfigError {
        field: field_name.to_string(),
        message,
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(config_error(field_name, "Path cannot be empty".to_string()));
    }

    if path.contains('\0') {
        return Err(config_error(field_name, "Path contains null bytes".to_string()));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(config_error(
            field_name,
            format!("Value {} must be at least {}", value, min_value),
        ));
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(config_error(
            field_name,
            format!("Unsupported value '{}'. Allowed: {}", value, allowed.join(", ")),
        ));
    }
    Ok(())
}

/// 請求欄位檢查，在觸及儲存層之前拒絕
pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| GatePassError::validation(field_name, "Field is required"))
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatePassError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}
