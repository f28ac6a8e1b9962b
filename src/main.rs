fn main() {
    if let Err(err) = csv_evolve::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
