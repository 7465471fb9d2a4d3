use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;

static INIT: Once = Once::new();

/// Initializes logging for a unit test.
///
/// Output is captured by the test harness and only shown for failing tests.
/// Prefer the [`init_test!`](crate::init_test) macro over calling this
/// directly.
#[doc(hidden)]
pub fn init_test() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(LevelFilter::TRACE)
            .with_test_writer()
            .init();
    });
}

/// Initializes logging at the beginning of a test method.
///
/// Repeated invocations from other tests in the same process are no-ops.
#[macro_export]
macro_rules! init_test {
    () => {
        $crate::init_test();
    };
}
