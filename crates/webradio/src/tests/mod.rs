//! Test suites for the webradio orchestration core.

mod support;
