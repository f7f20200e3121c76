fn main() {
    if let Err(err) = lendveil_cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
