#![no_main]

use libfuzzer_sys::fuzz_target;
use zonetrace::analyzer;
use zonetrace::trace_parser::parse_stack_trace;
use zonetrace::zone::ZoneRegistry;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and analysis must not panic on any input
        let frames = parse_stack_trace(input);
        if let Ok(registry) = ZoneRegistry::default_rust_zones() {
            let _ = analyzer::process(Some(&frames[..]), registry.zones());
        }
    }
});
