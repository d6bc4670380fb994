fn main() {
    if let Err(err) = catalog_diagram::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
