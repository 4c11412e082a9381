#[allow(dead_code)]
pub mod flaky_body;
pub mod socket_guard;
