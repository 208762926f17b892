// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::request::SearchRequest;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("{field} '{value}' has inappropriate format (expected mm/dd/yyyy)")]
    Format { field: &'static str, value: String },
    #[error("{field} '{value}' is not a valid calendar date")]
    InvalidCalendarDate { field: &'static str, value: String },
    #[error("departure date {date} is in the past (today is {today})")]
    PastDate { date: NaiveDate, today: NaiveDate },
    #[error("return date {return_date} is before departure date {departure}")]
    InvalidRange {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
}

impl DateError {
    /// True for the two failures a date-format check reports: wrong shape
    /// or impossible calendar values.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DateError::Format { .. } | DateError::InvalidCalendarDate { .. }
        )
    }
}

/// Checked dates of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedDates {
    pub departure: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// Shape check only: `dd/dd/dddd`. "34/34/2345" passes here and fails in
/// [`parse_date`].
pub fn validate_date_format(s: &str) -> bool {
    // ASCII digits only; `\d` would also accept other Unicode digit classes.
    static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();
    let date_shape = DATE_SHAPE
        .get_or_init(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("date pattern is valid"));
    date_shape.is_match(s)
}

/// Parses `mm/dd/yyyy` into a calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    parse_field("date", s)
}

fn parse_field(field: &'static str, s: &str) -> Result<NaiveDate, DateError> {
    let invalid = || DateError::InvalidCalendarDate {
        field,
        value: s.to_string(),
    };

    let mut parts = s.split('/');
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DateError::Format {
            field,
            value: s.to_string(),
        });
    };

    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

fn checked_field(field: &'static str, s: &str) -> Result<NaiveDate, DateError> {
    if !validate_date_format(s) {
        return Err(DateError::Format {
            field,
            value: s.to_string(),
        });
    }
    parse_field(field, s)
}

/// Validates the departure and optional return date of `request` against
/// `today`.
pub fn check_dates_on(request: &SearchRequest, today: NaiveDate) -> Result<CheckedDates, DateError> {
    let departure = checked_field("departure date", &request.date)?;
    if departure < today {
        return Err(DateError::PastDate {
            date: departure,
            today,
        });
    }

    let return_date = match request.return_date.as_deref() {
        None => None,
        Some(raw) => {
            let return_date = checked_field("return date", raw)?;
            if return_date < departure {
                return Err(DateError::InvalidRange {
                    departure,
                    return_date,
                });
            }
            Some(return_date)
        }
    };

    Ok(CheckedDates {
        departure,
        return_date,
    })
}

/// [`check_dates_on`] against the local calendar date.
pub fn check_dates(request: &SearchRequest) -> Result<CheckedDates, DateError> {
    check_dates_on(request, today())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Renders a date the way the search form expects it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
