#![no_main]

use libfuzzer_sys::fuzz_target;
use minitest::engine::NullReporter;
use minitest::isolation::protocol::{Marker, StreamDecoder};

fuzz_target!(|data: &[u8]| {
    // Treat the input as a child's stdout; events need the `##minitest:fuzz ` marker
    if let Ok(s) = std::str::from_utf8(data) {
        let mut decoder = StreamDecoder::new(Marker::new("fuzz"), "fuzz");
        let mut reporter = NullReporter;
        for line in s.lines() {
            if decoder.feed(line, &mut reporter).is_err() {
                break;
            }
        }
        let _ = decoder.finish(&mut reporter);
    }
});
