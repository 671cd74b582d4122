#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = progressor_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let core: progressor_core::EngineCfg = (&cfg).into();
            assert!(core.idle.warning_lead_ms < core.idle.timeout_ms);
        }
    }
});
