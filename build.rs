fn main() {
    // ESP-IDF environment is only needed for firmware builds.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
