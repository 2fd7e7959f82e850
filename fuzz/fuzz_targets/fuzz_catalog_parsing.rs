#![no_main]

use libfuzzer_sys::fuzz_target;
use votebot::polls::{short_name, StaticCatalog};

// Catalog files are hand-edited JSON5; a bad file must surface as an error.
fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(catalog) = StaticCatalog::parse(raw, "ballot_box_with_check") else {
        return;
    };

    for def in catalog.definitions() {
        assert!(!def.options.is_empty());
        assert!(!def.marker_emoji.starts_with(':'));
        for option in &def.options {
            let _ = short_name(option);
        }
    }
});
