use esp_config::{generate_config, Validator, Value};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // emit config
    generate_config(
        "esp_pcnt",
        &[(
            "event_queue_size",
            "Number of unit event notifications the interrupt handler can queue before the \
             overflow policy applies",
            Value::Integer(8),
            Some(Validator::PositiveInteger),
        )],
        true,
    );
}
