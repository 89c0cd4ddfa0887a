#![no_main]

use libfuzzer_sys::fuzz_target;
use modstack::{ModalOptions, OptionsPatch};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(patch) = OptionsPatch::from_json_str(input) else {
        return;
    };

    let once = ModalOptions::default().merged(&patch);
    let twice = once.merged(&patch);
    assert_eq!(once, twice, "applying a patch must be idempotent");

    if let Some(closable) = patch.closable {
        assert_eq!(once.closable, closable);
    }
    for (name, def) in &patch.animations {
        assert_eq!(once.animation(*name), Some(def));
    }
});
