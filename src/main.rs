fn main() {
    if let Err(err) = scrivano::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
