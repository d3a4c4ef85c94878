use crate::domain::model::{FinancialYear, GatePassNumber, PassType};
use crate::utils::error::{GatePassError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const COMPANY_CODE: &str = "RAPL";

/// `RAPL-{type}-{year}/{seq}` with the sequence padded to at least three digits.
pub fn format_gate_pass_number(
    pass_type: PassType,
    financial_year: FinancialYear,
    sequence: u32,
) -> String {
    format!(
        "{}-{}-{}/{:03}",
        COMPANY_CODE, pass_type, financial_year, sequence
    )
}

impl fmt::Display for GatePassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_gate_pass_number(
            self.pass_type,
            self.financial_year,
            self.sequence,
        ))
    }
}

fn gate_pass_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^RAPL-(RGP|NRGP)-(\d{4})/(\d{3,})$").expect("gate pass pattern is valid")
    })
}

/// 解析並驗證放行單號
pub fn parse_gate_pass_number(value: &str) -> Result<GatePassNumber> {
    let caps = gate_pass_pattern().captures(value).ok_or_else(|| {
        GatePassError::validation(
            "gate_pass_number",
            format!("'{}' does not match RAPL-<RGP|NRGP>-<YYXX>/<NNN>", value),
        )
    })?;

    let pass_type: PassType = caps[1].parse()?;
    let financial_year: FinancialYear = caps[2].parse()?;
    let sequence: u32 = caps[3]
        .parse()
        .map_err(|_| GatePassError::validation("gate_pass_number", "sequence is out of range"))?;

    if sequence == 0 {
        return Err(GatePassError::validation(
            "gate_pass_number",
            "sequence numbers start at 1",
        ));
    }

    // 拒絕多餘的前導零，例如 0007
    if caps[3].len() > 3 && caps[3].starts_with('0') {
        return Err(GatePassError::validation(
            "gate_pass_number",
            "sequence has superfluous leading zeros",
        ));
    }

    Ok(GatePassNumber {
        pass_type,
        financial_year,
        sequence,
    })
}

pub fn is_valid_gate_pass_number(value: &str) -> bool {
    parse_gate_pass_number(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fy_2526() -> FinancialYear {
        FinancialYear::starting_in(2025)
    }

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(
            format_gate_pass_number(PassType::Returnable, fy_2526(), 7),
            "RAPL-RGP-2526/007"
        );
        assert_eq!(
            format_gate_pass_number(PassType::NonReturnable, fy_2526(), 42),
            "RAPL-NRGP-2526/042"
        );
    }

    #[test]
    fn test_format_does_not_truncate_large_sequences() {
        assert_eq!(
            format_gate_pass_number(PassType::Returnable, fy_2526(), 1500),
            "RAPL-RGP-2526/1500"
        );
        assert_eq!(
            format_gate_pass_number(PassType::Returnable, fy_2526(), 1000),
            "RAPL-RGP-2526/1000"
        );
    }

    #[test]
    fn test_parse_accepts_formatted_numbers() {
        let parsed = parse_gate_pass_number("RAPL-NRGP-2526/1500").unwrap();
        assert_eq!(parsed.pass_type, PassType::NonReturnable);
        assert_eq!(parsed.financial_year, fy_2526());
        assert_eq!(parsed.sequence, 1500);
        assert_eq!(parsed.to_string(), "RAPL-NRGP-2526/1500");
    }

    #[test]
    fn test_parse_rejects_malformed_numbers() {
        assert!(!is_valid_gate_pass_number("RAPL-RGP-2526/07"));
        assert!(!is_valid_gate_pass_number("RAPL-XGP-2526/007"));
        assert!(!is_valid_gate_pass_number("ACME-RGP-2526/007"));
        assert!(!is_valid_gate_pass_number("RAPL-RGP-2527/007"));
        assert!(!is_valid_gate_pass_number("RAPL-RGP-2526/000"));
        assert!(!is_valid_gate_pass_number("RAPL-RGP-2526/0007"));
        assert!(is_valid_gate_pass_number("RAPL-RGP-2526/007"));
    }
}
