#![no_main]

use cadence::config::loader::ConfigLoader;
use cadence::sequence::build_sequence;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();

        // Anything that validates must also build without panicking.
        if let Ok(loaded) = loader.load_from_str(yaml_str) {
            if let Ok(workout) = loaded.config.workout_for(None) {
                let _ = build_sequence(&workout);
            }
        }
    }
});
