//! Build script for the GPS tracker firmware
//!
//! This script sets up the ESP-IDF environment variables needed for compilation.

fn main() {
    // Required for the esp-idf-svc crate to find the IDF toolchain
    embuild::espidf::sysenv::output();
}
