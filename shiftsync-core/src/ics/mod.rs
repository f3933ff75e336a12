//! Calendar-interchange export of the canonical shift set.

mod generate;

pub use generate::generate_schedule_ics;
