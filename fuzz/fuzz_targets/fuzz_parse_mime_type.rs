#![no_main]

use libfuzzer_sys::fuzz_target;
use mimekit::MimeType;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must serialize to a stable canonical form
        if let Some(mime) = MimeType::parse(s) {
            let canonical = mime.to_string();
            let reparsed = MimeType::new(&canonical).expect("canonical form must reparse");
            assert_eq!(reparsed.to_string(), canonical);
        }
    }
});
