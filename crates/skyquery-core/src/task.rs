// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::dates::format_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripType::OneWay => f.write_str("one way"),
            TripType::RoundTrip => f.write_str("round trip"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trip {
    OneWay,
    RoundTrip { return_date: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    Outbound,
    Return,
}

/// One scraped leg of a task: where the flights go from and to, and on
/// which day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegRoute<'a> {
    pub leg: Leg,
    pub from: &'a str,
    pub to: &'a str,
    pub date: NaiveDate,
}

/// A fully resolved search. Only the quantizer builds these, after the
/// codes were resolved and the dates checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteTask {
    departure_code: String,
    destination_code: String,
    departure_date: NaiveDate,
    trip: Trip,
}

impl ConcreteTask {
    pub(crate) fn new(
        departure_code: &str,
        destination_code: &str,
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> Self {
        let trip = match return_date {
            Some(return_date) => Trip::RoundTrip { return_date },
            None => Trip::OneWay,
        };
        Self {
            departure_code: departure_code.to_string(),
            destination_code: destination_code.to_string(),
            departure_date,
            trip,
        }
    }

    pub fn departure_code(&self) -> &str {
        &self.departure_code
    }

    pub fn destination_code(&self) -> &str {
        &self.destination_code
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn trip(&self) -> Trip {
        self.trip
    }

    pub fn trip_type(&self) -> TripType {
        match self.trip {
            Trip::OneWay => TripType::OneWay,
            Trip::RoundTrip { .. } => TripType::RoundTrip,
        }
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        match self.trip {
            Trip::OneWay => None,
            Trip::RoundTrip { return_date } => Some(return_date),
        }
    }

    /// Departure date as `mm/dd/yyyy`.
    pub fn date_string(&self) -> String {
        format_date(self.departure_date)
    }

    pub fn return_date_string(&self) -> Option<String> {
        self.return_date().map(format_date)
    }

    pub fn legs(&self) -> Vec<LegRoute<'_>> {
        let outbound = LegRoute {
            leg: Leg::Outbound,
            from: &self.departure_code,
            to: &self.destination_code,
            date: self.departure_date,
        };
        match self.trip {
            Trip::OneWay => vec![outbound],
            Trip::RoundTrip { return_date } => vec![
                outbound,
                LegRoute {
                    leg: Leg::Return,
                    from: &self.destination_code,
                    to: &self.departure_code,
                    date: return_date,
                },
            ],
        }
    }
}

impl std::fmt::Display for ConcreteTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}->{} {}",
            self.departure_code,
            self.destination_code,
            self.date_string()
        )?;
        if let Some(back) = self.return_date_string() {
            write!(f, " (return {})", back)?;
        }
        Ok(())
    }
}
