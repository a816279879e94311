//! Fuzz target: `SystemConfig::from_json`
//!
//! Arbitrary bytes must never panic the parser, and anything accepted
//! must pass validation and survive a serialise/parse round-trip.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use firewatch::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = SystemConfig::from_json(data) else {
        return;
    };
    assert!(config.validate().is_ok());

    let bytes = serde_json::to_vec(&config).expect("accepted config serialises");
    let again = SystemConfig::from_json(&bytes).expect("round-trip parses");
    assert_eq!(config, again);
});
