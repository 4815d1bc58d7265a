// SPDX-License-Identifier: MPL-2.0

mod dateparse;

pub use dateparse::parse_timestamp;
