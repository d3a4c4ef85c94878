use crate::domain::model::FinancialYear;
use chrono::{Datelike, NaiveDate};

/// 財年自四月一日起算
pub const FINANCIAL_YEAR_START_MONTH: u32 = 4;

pub fn financial_year_for(date: NaiveDate) -> FinancialYear {
    let start_year = if date.month() >= FINANCIAL_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    FinancialYear::starting_in(start_year)
}
