#![no_main]

use libfuzzer_sys::fuzz_target;
use mimekit::MimeParams;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must serialize to a stable canonical form
        if let Some(params) = MimeParams::parse(s) {
            let canonical = params.encode(true);
            let reparsed: MimeParams = canonical.parse().expect("canonical form must reparse");
            assert_eq!(reparsed.encode(true), canonical);
        }
    }
});
