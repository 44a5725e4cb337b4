use std::sync::Once;

// `rstest` cases can't also be wrapped by `test_log::test`, so they call this to get log output.
pub(crate) fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    });
}
