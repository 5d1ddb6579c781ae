//! Client-side checks on intake fields before anything is sent.
//!
//! The server does not re-check the start year range or the month name, so
//! these checks are the only place they are enforced.

use intake_shared::{canonical_month, Application, Course, MONTHS};
use thiserror::Error;

pub const MIN_START_YEAR: i64 = 2024;
pub const MAX_START_YEAR: i64 = 2030;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("unknown course '{0}', choose 1, 2 or 3")]
    UnknownCourse(String),
    #[error("start year {0} is outside {}-{}", MIN_START_YEAR, MAX_START_YEAR)]
    YearOutOfRange(i64),
    #[error("unknown month '{0}', use a month name or a number between 1 and 12")]
    UnknownMonth(String),
}

/// Accepts a menu number (`1`-`3`) or a full programme title, ignoring case.
pub fn parse_course(input: &str) -> Result<Course, FieldError> {
    let input = input.trim();

    if let Ok(choice) = input.parse::<usize>() {
        return choice
            .checked_sub(1)
            .and_then(|index| Course::ALL.get(index).copied())
            .ok_or_else(|| FieldError::UnknownCourse(input.to_string()));
    }

    Course::ALL
        .into_iter()
        .find(|course| course.title().eq_ignore_ascii_case(input))
        .ok_or_else(|| FieldError::UnknownCourse(input.to_string()))
}

/// Accepts a month name in any case or its number (`1`-`12`).
pub fn parse_month(input: &str) -> Result<&'static str, FieldError> {
    let input = input.trim();

    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| MONTHS.get(index).copied())
            .ok_or_else(|| FieldError::UnknownMonth(input.to_string()));
    }

    canonical_month(input).ok_or_else(|| FieldError::UnknownMonth(input.to_string()))
}

pub fn check_start_year(year: i64) -> Result<i64, FieldError> {
    if (MIN_START_YEAR..=MAX_START_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(FieldError::YearOutOfRange(year))
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::Empty(field));
    }
    Ok(value.to_string())
}

/// Raw field values as typed by the submitter.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub name: String,
    pub address: String,
    pub qualifications: String,
    pub course: String,
    pub start_year: i64,
    pub start_month: String,
}

impl ApplicationForm {
    /// Validates every field and produces the wire representation.
    pub fn into_application(self) -> Result<Application, FieldError> {
        Ok(Application {
            name: required("Name", &self.name)?,
            address: required("Address", &self.address)?,
            educational_qualifications: required("Educational qualifications", &self.qualifications)?,
            course: parse_course(&self.course)?.title().to_string(),
            start_year: check_start_year(self.start_year)?,
            start_month: parse_month(&self.start_month)?.to_string(),
        })
    }
}
