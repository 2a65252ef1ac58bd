use sinklog::log::{NoopLogSink, registry};

#[test]
#[should_panic(expected = "can only be set once")]
fn installing_global_logger_twice_is_fatal() {
    registry::set_global_logger(Box::new(NoopLogSink));
    registry::set_global_logger(Box::new(NoopLogSink));
}
