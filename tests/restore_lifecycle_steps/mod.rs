//! Step definitions for restore lifecycle scenarios.


mod given;
mod then;
mod when;
