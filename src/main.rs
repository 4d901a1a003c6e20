//! minitest runner entry point

fn main() {
    // Structured logging goes to stderr; default to warn so the report stays readable
    minitest::init_logging("warn");

    minitest::cli::run();
}
