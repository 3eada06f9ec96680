mod client_test;
#[cfg(feature = "integration-tests")]
mod live_test;
mod poller_test;
mod test_utils;
