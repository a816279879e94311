fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF link arguments are only meaningful when building for the chip.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
