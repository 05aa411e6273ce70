#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod http;

pub(crate) use fixtures::{TestVenue, new_test_venue};
pub(crate) use http::{as_user, assert_error_response};
