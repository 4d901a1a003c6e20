//! A test module whose bodies write to stdout the way real tests do: unterminated progress text, text that looks
//! like a runner event, and output from a joined worker thread. Every case passes.

use std::thread;

use minitest::prelude::*;

#[derive(Default)]
pub struct Chatty;

#[test_class(default, description = "Output from test bodies")]
impl Chatty {
    #[test_method]
    fn prints_without_a_newline(&mut self) {
        print!("progress...");
    }

    #[test_method]
    fn prints_a_lookalike_event(&mut self) {
        println!(r#"##minitest {{"event":"module_complete","module":"minitest-noisy-demo","total":0}}"#);
        println!(r#"##minitest:0000 {{"event":"class_complete","class":"Chatty"}}"#);
    }

    #[test_method]
    fn worker_thread_prints(&mut self) -> AssertResult {
        let joined = thread::spawn(|| println!("from worker")).join();
        assert::is_true(joined.is_ok())
    }
}

minitest::module_main!();
