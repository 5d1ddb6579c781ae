//! Registration number generation
//!
//! Numbers look like `DBS-<code>-<yy>-<hex8>`. The generator only proposes
//! candidates; the store's unique index decides whether one is taken.

use intake_shared::{course_code, REGISTRATION_PREFIX};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes behind the hex suffix.
const SUFFIX_BYTES: usize = 4;

/// Proposes a registration number using the operating system's CSPRNG.
pub fn generate(course: &str, start_year: i64) -> String {
    generate_with(&mut OsRng, course, start_year)
}

/// Proposes a registration number drawing entropy from `rng`.
pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R, course: &str, start_year: i64) -> String {
    let mut suffix = [0u8; SUFFIX_BYTES];
    rng.fill_bytes(&mut suffix);

    format!(
        "{}-{}-{}-{}",
        REGISTRATION_PREFIX,
        course_code(course),
        year_suffix(start_year),
        hex::encode_upper(suffix)
    )
}

/// Last two characters of the year as written in decimal. No range check:
/// single-digit years yield one character.
pub fn year_suffix(year: i64) -> String {
    let digits = year.to_string();
    let start = digits.len().saturating_sub(2);
    digits[start..].to_string()
}
